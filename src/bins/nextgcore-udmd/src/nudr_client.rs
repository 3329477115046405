//! nudr-dr Client
//!
//! Context data operations against the UDR
//! (`/nudr-dr/v1/subscription-data/{ueId}/context-data/...`).

use std::sync::Arc;

use async_trait::async_trait;
use ogs_sbi::constants::{api, content_type, header, param, resource};
use ogs_sbi::{ProblemDetails, SbiClientPool, SbiRequest, SbiResponse, SbiServiceType};

use crate::error::{UdmError, UdmResult};
use crate::models::{AccessType, AmfRegistration, PatchItem, SmfRegistration};

/// Typed CRUD on subscriber context data held by the UDR
#[async_trait]
pub trait DataRepository: Send + Sync {
    async fn query_amf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        supported_features: Option<&str>,
    ) -> UdmResult<AmfRegistration>;

    /// Create or replace
    async fn create_amf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        registration: &AmfRegistration,
    ) -> UdmResult<()>;

    async fn patch_amf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        patch: &[PatchItem],
    ) -> UdmResult<()>;

    async fn create_smf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        pdu_session_id: i32,
        registration: &SmfRegistration,
    ) -> UdmResult<()>;

    async fn delete_smf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        pdu_session_id: &str,
    ) -> UdmResult<()>;
}

/// `{udr_uri}/nudr-dr/v1/subscription-data/{ueId}/context-data/{tail}`
pub fn context_data_uri(udr_uri: &str, ue_id: &str, tail: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}/{}/{}",
        udr_uri.trim_end_matches('/'),
        SbiServiceType::NudrDr,
        api::V1,
        resource::SUBSCRIPTION_DATA,
        ue_id,
        resource::CONTEXT_DATA,
        tail
    )
}

/// Problem reported by a peer for a non-2xx answer
pub fn problem_from_response(response: &SbiResponse) -> ProblemDetails {
    let remote = response.problem().unwrap_or_default();
    let detail = remote.detail.clone().unwrap_or_else(|| {
        match response.http.content.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(body) => format!("{} {}", response.status, body.trim()),
            None => format!("HTTP {}", response.status),
        }
    });

    ProblemDetails {
        status: Some(response.status),
        cause: remote.cause,
        detail: Some(detail),
        ..remote
    }
}

fn check(response: SbiResponse) -> UdmResult<SbiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(UdmError::Remote(problem_from_response(&response)))
    }
}

/// `DataRepository` over HTTP/2 SBI
pub struct SbiDataRepository {
    clients: Arc<SbiClientPool>,
}

impl SbiDataRepository {
    pub fn new(clients: Arc<SbiClientPool>) -> Self {
        Self { clients }
    }

    async fn send(&self, udr_uri: &str, request: SbiRequest) -> UdmResult<SbiResponse> {
        log::debug!("[UDR] {} {}", request.header.method, request.header.uri);
        let client = self.clients.get_client(udr_uri)?;
        let response = client.send_request(request).await?;
        check(response)
    }
}

#[async_trait]
impl DataRepository for SbiDataRepository {
    async fn query_amf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        supported_features: Option<&str>,
    ) -> UdmResult<AmfRegistration> {
        let mut request = SbiRequest::get(context_data_uri(udr_uri, ue_id, access.resource()))
            .with_header(header::ACCEPT, content_type::APPLICATION_JSON);
        if let Some(features) = supported_features.filter(|f| !f.is_empty()) {
            request = request.with_param(param::SUPPORTED_FEATURES, features);
        }

        let response = self.send(udr_uri, request).await?;
        Ok(response.json()?)
    }

    async fn create_amf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        registration: &AmfRegistration,
    ) -> UdmResult<()> {
        let request = SbiRequest::put(context_data_uri(udr_uri, ue_id, access.resource()))
            .with_json_body(registration)?;
        self.send(udr_uri, request).await.map(|_| ())
    }

    async fn patch_amf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        patch: &[PatchItem],
    ) -> UdmResult<()> {
        let body = serde_json::to_string(patch).map_err(ogs_sbi::SbiError::from)?;
        let request = SbiRequest::patch(context_data_uri(udr_uri, ue_id, access.resource()))
            .with_body(body, content_type::APPLICATION_PATCH_JSON);
        self.send(udr_uri, request).await.map(|_| ())
    }

    async fn create_smf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        pdu_session_id: i32,
        registration: &SmfRegistration,
    ) -> UdmResult<()> {
        let tail = format!("{}/{pdu_session_id}", resource::SMF_REGISTRATIONS);
        let request =
            SbiRequest::put(context_data_uri(udr_uri, ue_id, &tail)).with_json_body(registration)?;
        self.send(udr_uri, request).await.map(|_| ())
    }

    async fn delete_smf_context(
        &self,
        udr_uri: &str,
        ue_id: &str,
        pdu_session_id: &str,
    ) -> UdmResult<()> {
        let tail = format!("{}/{pdu_session_id}", resource::SMF_REGISTRATIONS);
        let request = SbiRequest::delete(context_data_uri(udr_uri, ue_id, &tail));
        self.send(udr_uri, request).await.map(|_| ())
    }
}
