//! NUDM-UECM Request Parsing
//!
//! Turns an inbound `SbiRequest` into one of the UECM operations with a
//! typed body, or into the error response to send back.

use ogs_sbi::constants::{api, method, param, resource};
use ogs_sbi::{send_bad_request, send_method_not_allowed, send_not_found};
use ogs_sbi::{SbiRequest, SbiResponse, SbiServiceType};
use serde::de::DeserializeOwned;

use crate::models::{AccessType, AmfRegistration, AmfRegistrationModification, SmfRegistration};

#[derive(Debug, Clone, PartialEq)]
pub enum UecmRequest {
    GetAmfRegistration {
        ue_id: String,
        access: AccessType,
        supported_features: Option<String>,
    },
    RegisterAmf {
        ue_id: String,
        access: AccessType,
        registration: AmfRegistration,
    },
    UpdateAmfRegistration {
        ue_id: String,
        access: AccessType,
        modification: AmfRegistrationModification,
    },
    RegisterSmf {
        ue_id: String,
        pdu_session_id: String,
        registration: SmfRegistration,
    },
    DeregisterSmf {
        ue_id: String,
        pdu_session_id: String,
    },
}

impl UecmRequest {
    pub fn ue_id(&self) -> &str {
        match self {
            Self::GetAmfRegistration { ue_id, .. }
            | Self::RegisterAmf { ue_id, .. }
            | Self::UpdateAmfRegistration { ue_id, .. }
            | Self::RegisterSmf { ue_id, .. }
            | Self::DeregisterSmf { ue_id, .. } => ue_id,
        }
    }

    /// Route `/nudm-uecm/v1/{ueId}/registrations/...`
    pub fn parse(request: &SbiRequest) -> Result<Self, SbiResponse> {
        let segments = request.segments();
        let http_method = request.header.method.to_uppercase();

        match segments.as_slice() {
            [service, version, ..] if *service != SbiServiceType::NudmUecm.to_name() || *version != api::V1 => {
                Err(send_bad_request(
                    &format!("Invalid API name [{service}/{version}]"),
                    Some("INVALID_API"),
                ))
            }
            [_, _, ue_id, registrations, tail @ ..] if *registrations == resource::REGISTRATIONS => {
                let ue_id = ue_id.to_string();
                match tail {
                    [name] => match AccessType::from_resource(name) {
                        Some(access) => Self::parse_amf(request, &http_method, ue_id, access),
                        None => Err(not_found(request)),
                    },
                    [name, pdu_session_id] if *name == resource::SMF_REGISTRATIONS => {
                        Self::parse_smf(request, &http_method, ue_id, pdu_session_id.to_string())
                    }
                    _ => Err(not_found(request)),
                }
            }
            _ => Err(not_found(request)),
        }
    }

    fn parse_amf(
        request: &SbiRequest,
        http_method: &str,
        ue_id: String,
        access: AccessType,
    ) -> Result<Self, SbiResponse> {
        match http_method {
            method::GET => Ok(Self::GetAmfRegistration {
                ue_id,
                access,
                supported_features: request.http.get_param(param::SUPPORTED_FEATURES).cloned(),
            }),
            method::PUT => Ok(Self::RegisterAmf {
                ue_id,
                access,
                registration: body(request)?,
            }),
            method::PATCH => Ok(Self::UpdateAmfRegistration {
                ue_id,
                access,
                modification: body(request)?,
            }),
            other => Err(send_method_not_allowed(other, access.resource())),
        }
    }

    fn parse_smf(
        request: &SbiRequest,
        http_method: &str,
        ue_id: String,
        pdu_session_id: String,
    ) -> Result<Self, SbiResponse> {
        match http_method {
            method::PUT => Ok(Self::RegisterSmf {
                ue_id,
                pdu_session_id,
                registration: body(request)?,
            }),
            method::DELETE => Ok(Self::DeregisterSmf {
                ue_id,
                pdu_session_id,
            }),
            other => Err(send_method_not_allowed(other, resource::SMF_REGISTRATIONS)),
        }
    }
}

fn body<T: DeserializeOwned>(request: &SbiRequest) -> Result<T, SbiResponse> {
    match request.json::<T>() {
        None => {
            log::error!("No body in {} {}", request.header.method, request.path());
            Err(send_bad_request("No request body", Some("MISSING_BODY")))
        }
        Some(Err(e)) => {
            log::error!("Invalid body in {} {}: {e}", request.header.method, request.path());
            Err(send_bad_request(&e.to_string(), Some("INVALID_JSON")))
        }
        Some(Ok(value)) => Ok(value),
    }
}

fn not_found(request: &SbiRequest) -> SbiResponse {
    send_not_found(
        &format!("Unknown resource {}", request.path()),
        Some("RESOURCE_URI_STRUCTURE_NOT_FOUND"),
    )
}
