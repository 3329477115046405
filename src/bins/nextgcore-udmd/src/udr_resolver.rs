//! UDR Resolution
//!
//! Maps a nudm-uecm `ueId` to the UDR that stores its context data. SUPI
//! and PEI lookups cache the result on the owning UE context.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::UdmContext;
use crate::error::{UdmError, UdmResult};

/// How a `ueId` is presented to NF discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryParam {
    Supi,
    Gpsi,
    ExtGroupId,
    None,
}

/// Lexical class of a `ueId`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UeIdType {
    Supi,
    Pei,
    ExtGroupId,
    Gpsi,
    Unknown,
}

impl UeIdType {
    /// Classify by marker substring, checked in this order:
    /// imsi/nai, pei, extgroupid, msisdn/extid.
    pub fn classify(ue_id: &str) -> Self {
        if ue_id.contains("imsi") || ue_id.contains("nai") {
            Self::Supi
        } else if ue_id.contains("pei") {
            Self::Pei
        } else if ue_id.contains("extgroupid") {
            Self::ExtGroupId
        } else if ue_id.contains("msisdn") || ue_id.contains("extid") {
            Self::Gpsi
        } else {
            Self::Unknown
        }
    }
}

/// NRF discovery of the UDR serving an identifier
#[async_trait]
pub trait NfDiscovery: Send + Sync {
    /// UDR base URI, or an empty string when nothing was found
    async fn discover_udr(&self, ue_id: &str, param: DiscoveryParam) -> String;
}

/// Identifier resolver
#[derive(Clone)]
pub struct UdrResolver {
    context: Arc<UdmContext>,
    discovery: Arc<dyn NfDiscovery>,
}

impl UdrResolver {
    pub fn new(context: Arc<UdmContext>, discovery: Arc<dyn NfDiscovery>) -> Self {
        Self { context, discovery }
    }

    /// UDR URI for `ue_id`; empty when none could be found
    pub async fn udr_uri(&self, ue_id: &str) -> String {
        match UeIdType::classify(ue_id) {
            UeIdType::Supi => {
                let ue = self.context.ue_find_or_add(ue_id);
                let cached = ue.udr_uri();
                if !cached.is_empty() {
                    return cached;
                }
                let uri = self.discovery.discover_udr(&ue.supi, DiscoveryParam::Supi).await;
                if !uri.is_empty() {
                    ue.set_udr_uri(uri.clone());
                }
                uri
            }
            UeIdType::Pei => {
                let Some(ue) = self.context.ue_find_by_pei(ue_id) else {
                    log::debug!("[{ue_id}] no UE registered with this PEI");
                    return String::new();
                };
                let cached = ue.udr_uri();
                if !cached.is_empty() {
                    return cached;
                }
                let uri = self.discovery.discover_udr(&ue.supi, DiscoveryParam::Supi).await;
                if !uri.is_empty() {
                    ue.set_udr_uri(uri.clone());
                }
                uri
            }
            UeIdType::ExtGroupId => {
                self.discovery
                    .discover_udr(ue_id, DiscoveryParam::ExtGroupId)
                    .await
            }
            UeIdType::Gpsi => self.discovery.discover_udr(ue_id, DiscoveryParam::Gpsi).await,
            UeIdType::Unknown => self.discovery.discover_udr("", DiscoveryParam::None).await,
        }
    }

    /// Like [`udr_uri`](Self::udr_uri), failing with `UdrNotFound` on an empty result
    pub async fn resolve(&self, ue_id: &str) -> UdmResult<String> {
        let uri = self.udr_uri(ue_id).await;
        if uri.is_empty() {
            log::error!("[{ue_id}] no UDR URI found");
            return Err(UdmError::UdrNotFound(ue_id.to_string()));
        }
        Ok(uri)
    }
}
