//! NUDM-UECM Handler Functions
//!
//! AMF and SMF registration procedures (TS 29.503 5.3.2). Each procedure
//! consults the UE context, resolves the UDR, performs the nudr-dr call and
//! decides whether a superseded AMF must be told to deregister.

use std::sync::Arc;

use crate::context::{LocationUri, UdmContext};
use crate::dereg_notify::{DeregDispatch, DeregNotification};
use crate::error::{UdmError, UdmResult};
use crate::models::{
    AccessType, AmfRegistration, AmfRegistrationModification, DeregistrationData,
    DeregistrationReason, SmfRegistration,
};
use crate::nudr_build::build_amf_registration_patch;
use crate::nudr_client::DataRepository;
use crate::udr_resolver::{NfDiscovery, UdrResolver};

/// Successful outcome of a UECM procedure
#[derive(Debug, Clone, PartialEq)]
pub enum UecmResponse<T> {
    /// 201 with `Location`
    Created { location: String, body: T },
    /// 200
    Ok(T),
    /// 204
    NoContent,
}

/// UECM procedures, shared by every request task
#[derive(Clone)]
pub struct UecmHandler {
    context: Arc<UdmContext>,
    resolver: UdrResolver,
    udr: Arc<dyn DataRepository>,
    notifier: Arc<dyn DeregDispatch>,
}

impl UecmHandler {
    pub fn new(
        context: Arc<UdmContext>,
        discovery: Arc<dyn NfDiscovery>,
        udr: Arc<dyn DataRepository>,
        notifier: Arc<dyn DeregDispatch>,
    ) -> Self {
        let resolver = UdrResolver::new(context.clone(), discovery);
        Self {
            context,
            resolver,
            udr,
            notifier,
        }
    }

    pub fn context(&self) -> &Arc<UdmContext> {
        &self.context
    }

    /// Get registration (TS 29.503 5.3.2.5)
    pub async fn get_amf_registration(
        &self,
        ue_id: &str,
        access: AccessType,
        supported_features: Option<&str>,
    ) -> UdmResult<UecmResponse<AmfRegistration>> {
        log::info!("[{ue_id}] Get AMF registration ({access})");

        let udr_uri = self.resolver.resolve(ue_id).await?;
        let registration = self
            .udr
            .query_amf_context(&udr_uri, ue_id, access, supported_features)
            .await?;

        Ok(UecmResponse::Ok(registration))
    }

    /// AMF registration (TS 29.503 5.3.2.2.2 / 5.3.2.2.3)
    pub async fn register_amf(
        &self,
        ue_id: &str,
        access: AccessType,
        registration: AmfRegistration,
    ) -> UdmResult<UecmResponse<AmfRegistration>> {
        log::info!(
            "[{ue_id}] AMF registration ({access}, guami={})",
            registration.guami
        );

        let ue = self.context.ue_find_or_add(ue_id);
        let old = ue.set_amf_context(access, registration.clone());

        let udr_uri = self.resolver.resolve(ue_id).await?;
        if let Err(e) = self
            .udr
            .create_amf_context(&udr_uri, ue_id, access, &registration)
            .await
        {
            log::error!("[{ue_id}] Create AMF context ({access}) failed: {e}");
            return Err(e);
        }

        let Some(old) = old else {
            let location = self
                .context
                .location_uri(ue_id, LocationUri::AmfRegistration(access));
            return Ok(UecmResponse::Created {
                location,
                body: registration,
            });
        };

        // TS 23.502 4.2.2.2.2 step 14d: tell the old AMF of the same access
        let superseded = match access {
            AccessType::ThreeGppAccess => !old.guami.same_as(&registration.guami),
            AccessType::NonThreeGppAccess => true,
        };
        if superseded {
            log::info!(
                "[{ue_id}] Serving AMF changed ({} -> {}), notifying {}",
                old.guami,
                registration.guami,
                old.dereg_callback_uri
            );
            self.notifier.dispatch(DeregNotification {
                ue_id: ue_id.to_string(),
                callback_uri: old.dereg_callback_uri.clone(),
                data: DeregistrationData {
                    dereg_reason: DeregistrationReason::for_handover(
                        registration.initial_registration_ind,
                    ),
                    access_type: Some(access),
                    pdu_session_id: None,
                },
            });
        }

        Ok(UecmResponse::Ok(registration))
    }

    /// Update registration (TS 29.503 5.3.2.4)
    pub async fn update_amf_registration(
        &self,
        ue_id: &str,
        access: AccessType,
        mut modification: AmfRegistrationModification,
    ) -> UdmResult<UecmResponse<()>> {
        log::info!("[{ue_id}] Update AMF registration ({access})");

        let current = self
            .context
            .ue_find_by_supi(ue_id)
            .and_then(|ue| ue.amf_context(access).map(|reg| (ue, reg)));
        let Some((ue, current)) = current else {
            log::error!("[{ue_id}] No AMF registration ({access}) to update");
            return Err(UdmError::ContextNotFound(ue_id.to_string()));
        };

        if let Some(guami) = &modification.guami {
            if !current.guami.same_as(guami) {
                log::error!("[{ue_id}] INVALID_GUAMI {guami} (registered {})", current.guami);
                return Err(UdmError::InvalidGuami(ue_id.to_string()));
            }
            log::info!("[{ue_id}] Update AMF registration ({access}) - deregistration");
            modification.purge_flag = true;
        }

        let patch = build_amf_registration_patch(&modification);

        let udr_uri = self.resolver.resolve(ue_id).await?;
        self.udr
            .patch_amf_context(&udr_uri, ue_id, access, &patch)
            .await?;

        if modification.purge_flag {
            if ue.clear_amf_context_if(access, &current) {
                log::debug!("[{ue_id}] AMF registration ({access}) purged");
            } else {
                log::info!("[{ue_id}] AMF registration ({access}) replaced during purge, kept");
            }
            drop(ue);
            self.context.ue_remove(ue_id);
        }

        Ok(UecmResponse::NoContent)
    }

    /// SMF registration (TS 29.503 5.3.2.2.4)
    pub async fn register_smf(
        &self,
        ue_id: &str,
        pdu_session_id: &str,
        registration: SmfRegistration,
    ) -> UdmResult<UecmResponse<SmfRegistration>> {
        log::info!("[{ue_id}:{pdu_session_id}] SMF registration");

        let psi = pdu_session_id.parse::<i32>().unwrap_or_else(|e| {
            log::error!("[{ue_id}] Invalid PDU session ID [{pdu_session_id}]: {e}");
            0
        });

        let ue = self.context.ue_find_or_add(ue_id);
        let existed = ue.create_smf_context(psi);

        let udr_uri = self.resolver.resolve(ue_id).await?;
        self.udr
            .create_smf_context(&udr_uri, ue_id, psi, &registration)
            .await?;

        if existed {
            return Ok(UecmResponse::NoContent);
        }

        let location = self
            .context
            .location_uri(ue_id, LocationUri::SmfRegistration(psi));
        Ok(UecmResponse::Created {
            location,
            body: registration,
        })
    }

    /// SMF deregistration (TS 29.503 5.3.2.3.2)
    pub async fn deregister_smf(
        &self,
        ue_id: &str,
        pdu_session_id: &str,
    ) -> UdmResult<UecmResponse<()>> {
        log::info!("[{ue_id}:{pdu_session_id}] SMF deregistration");

        // Same key as registration: "05" and "5" name one session
        let psi = pdu_session_id.parse::<i32>().ok();
        let udr_id = psi.map_or_else(|| pdu_session_id.to_string(), |psi| psi.to_string());

        let udr_uri = self.resolver.resolve(ue_id).await?;
        self.udr
            .delete_smf_context(&udr_uri, ue_id, &udr_id)
            .await?;

        if let (Some(ue), Some(psi)) = (self.context.ue_find_by_supi(ue_id), psi) {
            ue.remove_smf_context(psi);
        }
        self.context.ue_remove(ue_id);

        Ok(UecmResponse::NoContent)
    }
}
