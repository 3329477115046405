//! UDM SBI Path
//!
//! Outbound NRF discovery and AMF callbacks, and the inbound nudm-uecm
//! server wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use ogs_sbi::constants::{api, param, resource, HTTP_PORT};
use ogs_sbi::{
    NfType, SbiClientPool, SbiRequest, SbiResponse, SbiResult, SbiServer, SbiServerConfig,
    SbiServiceType, UriScheme,
};
use serde_json::Value;

use crate::dereg_notify::CallbackClient;
use crate::error::{UdmError, UdmResult};
use crate::models::DeregistrationData;
use crate::nudm_handler::UecmHandler;
use crate::nudr_client::problem_from_response;
use crate::sbi_response::sbi_response;
use crate::uecm_request::UecmRequest;
use crate::udr_resolver::{DiscoveryParam, NfDiscovery};

/// UDR discovery through the NRF, with a statically configured fallback
pub struct NrfDiscovery {
    clients: Arc<SbiClientPool>,
    nrf_uri: Option<String>,
    udr_fallback: Option<String>,
    nf_instance_id: String,
}

impl NrfDiscovery {
    pub fn new(
        clients: Arc<SbiClientPool>,
        nrf_uri: Option<String>,
        udr_fallback: Option<String>,
        nf_instance_id: impl Into<String>,
    ) -> Self {
        Self {
            clients,
            nrf_uri,
            udr_fallback,
            nf_instance_id: nf_instance_id.into(),
        }
    }

    fn search_request(&self, nrf_uri: &str, ue_id: &str, discovery: DiscoveryParam) -> SbiRequest {
        let uri = format!(
            "{}/{}/{}/{}",
            nrf_uri.trim_end_matches('/'),
            SbiServiceType::NnrfDisc.to_name(),
            api::V1,
            resource::NF_INSTANCES
        );
        let request = SbiRequest::get(uri)
            .with_param(param::TARGET_NF_TYPE, NfType::Udr.to_str())
            .with_param(param::REQUESTER_NF_TYPE, NfType::Udm.to_str())
            .with_param(param::REQUESTER_NF_INSTANCE_ID, self.nf_instance_id.as_str())
            .with_param(param::SERVICE_NAMES, SbiServiceType::NudrDr.to_name());

        match discovery {
            DiscoveryParam::Supi => request.with_param(param::SUPI, ue_id),
            DiscoveryParam::Gpsi => request.with_param(param::GPSI, ue_id),
            DiscoveryParam::ExtGroupId => request.with_param(param::EXTERNAL_GROUP_IDENTITY, ue_id),
            DiscoveryParam::None => request,
        }
    }

    async fn search_udr(
        &self,
        nrf_uri: &str,
        ue_id: &str,
        discovery: DiscoveryParam,
    ) -> UdmResult<Option<String>> {
        let client = self.clients.get_client(nrf_uri)?;
        let response = client
            .send_request(self.search_request(nrf_uri, ue_id, discovery))
            .await?;
        if !response.is_success() {
            return Err(UdmError::Remote(problem_from_response(&response)));
        }

        let result: Value = response.json()?;
        Ok(udr_uri_from_search_result(&result))
    }
}

#[async_trait]
impl NfDiscovery for NrfDiscovery {
    async fn discover_udr(&self, ue_id: &str, discovery: DiscoveryParam) -> String {
        if let Some(nrf_uri) = &self.nrf_uri {
            match self.search_udr(nrf_uri, ue_id, discovery).await {
                Ok(Some(uri)) => {
                    log::debug!("[{ue_id}] UDR discovered: {uri}");
                    return uri;
                }
                Ok(None) => log::warn!("[{ue_id}] NRF returned no UDR instance"),
                Err(e) => log::error!("[{ue_id}] UDR discovery failed: {e}"),
            }
        }

        match &self.udr_fallback {
            Some(uri) => {
                log::debug!("[{ue_id}] Using configured UDR {uri}");
                uri.clone()
            }
            None => String::new(),
        }
    }
}

/// nudr-dr base URI of the first usable UDR in an NRF `SearchResult`
pub fn udr_uri_from_search_result(result: &Value) -> Option<String> {
    result
        .get("nfInstances")?
        .as_array()?
        .iter()
        .find_map(instance_udr_uri)
}

fn instance_udr_uri(instance: &Value) -> Option<String> {
    let services: Vec<&Value> = match (instance.get("nfServices"), instance.get("nfServiceList")) {
        (Some(Value::Array(list)), _) => list.iter().collect(),
        (_, Some(Value::Object(map))) => map.values().collect(),
        _ => Vec::new(),
    };

    let nudr_dr = services.into_iter().find(|s| {
        s.get("serviceName").and_then(Value::as_str) == Some(SbiServiceType::NudrDr.to_name())
    });

    if let Some(service) = nudr_dr {
        if let Some(prefix) = service
            .get("apiPrefix")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
        {
            return Some(prefix.trim_end_matches('/').to_string());
        }

        let scheme = service
            .get("scheme")
            .and_then(Value::as_str)
            .and_then(UriScheme::from_str_opt)
            .unwrap_or_default();
        let endpoint = service
            .get("ipEndPoints")
            .and_then(Value::as_array)
            .and_then(|eps| eps.first());
        if let Some(ep) = endpoint {
            let port = ep
                .get("port")
                .and_then(Value::as_u64)
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or_else(|| scheme.default_port());
            if let Some(addr) = ep.get("ipv4Address").and_then(Value::as_str) {
                return Some(format!("{scheme}://{addr}:{port}"));
            }
            if let Some(addr) = ep.get("ipv6Address").and_then(Value::as_str) {
                return Some(format!("{scheme}://[{addr}]:{port}"));
            }
        }
        if let Some(fqdn) = service.get("fqdn").and_then(Value::as_str) {
            return Some(format!("{scheme}://{fqdn}:{}", scheme.default_port()));
        }
    }

    let host = instance
        .get("ipv4Addresses")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
        .or_else(|| instance.get("fqdn").and_then(Value::as_str))?;
    Some(format!("{}://{host}:{HTTP_PORT}", UriScheme::Http))
}

/// POSTs `DeregistrationData` to AMF callback URIs
pub struct SbiCallbackClient {
    clients: Arc<SbiClientPool>,
}

impl SbiCallbackClient {
    pub fn new(clients: Arc<SbiClientPool>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl CallbackClient for SbiCallbackClient {
    async fn send_dereg_notification(
        &self,
        callback_uri: &str,
        data: &DeregistrationData,
    ) -> UdmResult<()> {
        let client = self.clients.get_client(callback_uri)?;
        let response = client.post_json(callback_uri, data).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(UdmError::Remote(problem_from_response(&response)))
        }
    }
}

/// Parse, run and answer one nudm-uecm request
pub async fn handle_request(handler: &UecmHandler, request: SbiRequest) -> SbiResponse {
    log::debug!("UDM SBI request: {} {}", request.header.method, request.header.uri);

    let uecm = match UecmRequest::parse(&request) {
        Ok(uecm) => uecm,
        Err(response) => {
            log::warn!(
                "Rejected {} {} ({})",
                request.header.method,
                request.path(),
                response.status
            );
            return response;
        }
    };

    match uecm {
        UecmRequest::GetAmfRegistration {
            ue_id,
            access,
            supported_features,
        } => sbi_response(
            handler
                .get_amf_registration(&ue_id, access, supported_features.as_deref())
                .await,
        ),
        UecmRequest::RegisterAmf {
            ue_id,
            access,
            registration,
        } => sbi_response(handler.register_amf(&ue_id, access, registration).await),
        UecmRequest::UpdateAmfRegistration {
            ue_id,
            access,
            modification,
        } => sbi_response(
            handler
                .update_amf_registration(&ue_id, access, modification)
                .await,
        ),
        UecmRequest::RegisterSmf {
            ue_id,
            pdu_session_id,
            registration,
        } => sbi_response(
            handler
                .register_smf(&ue_id, &pdu_session_id, registration)
                .await,
        ),
        UecmRequest::DeregisterSmf {
            ue_id,
            pdu_session_id,
        } => sbi_response(handler.deregister_smf(&ue_id, &pdu_session_id).await),
    }
}

/// Start the nudm-uecm server. Returns the running server and its bound address.
pub async fn udm_sbi_open(
    addr: SocketAddr,
    handler: Arc<UecmHandler>,
) -> SbiResult<(SbiServer, SocketAddr)> {
    let server = SbiServer::new(SbiServerConfig::new(addr));
    let bound = server
        .start(move |request: SbiRequest| {
            let handler = handler.clone();
            async move { handle_request(&handler, request).await }
        })
        .await?;

    log::info!("nudm-uecm server listening on {bound}");
    Ok((server, bound))
}
