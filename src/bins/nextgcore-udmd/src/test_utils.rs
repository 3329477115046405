//! In-memory collaborators for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ogs_sbi::ProblemDetails;

use crate::dereg_notify::{CallbackClient, DeregDispatch, DeregNotification};
use crate::error::{UdmError, UdmResult};
use crate::models::{AccessType, AmfRegistration, DeregistrationData, PatchItem, SmfRegistration};
use crate::udr_resolver::{DiscoveryParam, NfDiscovery};

/// Discovery answering a fixed URI and recording every query
pub struct CountingDiscovery {
    uri: String,
    calls: Mutex<Vec<(String, DiscoveryParam)>>,
}

impl CountingDiscovery {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, DiscoveryParam)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NfDiscovery for CountingDiscovery {
    async fn discover_udr(&self, ue_id: &str, param: DiscoveryParam) -> String {
        self.calls.lock().unwrap().push((ue_id.to_string(), param));
        self.uri.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepoCall {
    QueryAmf(String, AccessType),
    CreateAmf(String, AccessType, AmfRegistration),
    PatchAmf(String, AccessType, Vec<PatchItem>),
    CreateSmf(String, i32),
    DeleteSmf(String, String),
}

/// Data repository keeping AMF registrations in memory
#[derive(Default)]
pub struct RecordingRepository {
    calls: Mutex<Vec<RepoCall>>,
    amf: Mutex<HashMap<(String, AccessType), AmfRegistration>>,
    failure: Mutex<Option<ProblemDetails>>,
}

impl RecordingRepository {
    pub fn calls(&self) -> Vec<RepoCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Answer every subsequent call with `problem`
    pub fn fail_with(&self, problem: ProblemDetails) {
        *self.failure.lock().unwrap() = Some(problem);
    }

    fn record(&self, call: RepoCall) -> UdmResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(problem) => Err(UdmError::Remote(problem)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl crate::nudr_client::DataRepository for RecordingRepository {
    async fn query_amf_context(
        &self,
        _udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        _supported_features: Option<&str>,
    ) -> UdmResult<AmfRegistration> {
        self.record(RepoCall::QueryAmf(ue_id.to_string(), access))?;
        self.amf
            .lock()
            .unwrap()
            .get(&(ue_id.to_string(), access))
            .cloned()
            .ok_or_else(|| {
                UdmError::Remote(ProblemDetails::new(404).with_cause("USER_NOT_FOUND"))
            })
    }

    async fn create_amf_context(
        &self,
        _udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        registration: &AmfRegistration,
    ) -> UdmResult<()> {
        self.record(RepoCall::CreateAmf(
            ue_id.to_string(),
            access,
            registration.clone(),
        ))?;
        self.amf
            .lock()
            .unwrap()
            .insert((ue_id.to_string(), access), registration.clone());
        Ok(())
    }

    async fn patch_amf_context(
        &self,
        _udr_uri: &str,
        ue_id: &str,
        access: AccessType,
        patch: &[PatchItem],
    ) -> UdmResult<()> {
        self.record(RepoCall::PatchAmf(ue_id.to_string(), access, patch.to_vec()))
    }

    async fn create_smf_context(
        &self,
        _udr_uri: &str,
        ue_id: &str,
        pdu_session_id: i32,
        _registration: &SmfRegistration,
    ) -> UdmResult<()> {
        self.record(RepoCall::CreateSmf(ue_id.to_string(), pdu_session_id))
    }

    async fn delete_smf_context(
        &self,
        _udr_uri: &str,
        ue_id: &str,
        pdu_session_id: &str,
    ) -> UdmResult<()> {
        self.record(RepoCall::DeleteSmf(
            ue_id.to_string(),
            pdu_session_id.to_string(),
        ))
    }
}

/// Dispatcher that keeps every notification instead of sending it
#[derive(Default)]
pub struct RecordingDispatch {
    sent: Mutex<Vec<DeregNotification>>,
}

impl RecordingDispatch {
    pub fn sent(&self) -> Vec<DeregNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl DeregDispatch for RecordingDispatch {
    fn dispatch(&self, notification: DeregNotification) {
        self.sent.lock().unwrap().push(notification);
    }
}

/// Callback client recording each POST, optionally failing it
#[derive(Default)]
pub struct RecordingCallback {
    sent: Mutex<Vec<(String, DeregistrationData)>>,
    fail: bool,
}

impl RecordingCallback {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, DeregistrationData)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallbackClient for RecordingCallback {
    async fn send_dereg_notification(
        &self,
        callback_uri: &str,
        data: &DeregistrationData,
    ) -> UdmResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((callback_uri.to_string(), data.clone()));
        if self.fail {
            return Err(UdmError::Remote(
                ProblemDetails::new(503).with_detail("AMF unavailable"),
            ));
        }
        Ok(())
    }
}
