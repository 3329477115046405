//! UECM Wire Models
//!
//! TS 29.503 / TS 29.571 data types carried on nudm-uecm and nudr-dr,
//! serialized as camelCase JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

fn is_false(b: &bool) -> bool {
    !*b
}

/// PLMN identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

impl PlmnId {
    pub fn new(mcc: impl Into<String>, mnc: impl Into<String>) -> Self {
        Self {
            mcc: mcc.into(),
            mnc: mnc.into(),
        }
    }
}

/// Globally Unique AMF Identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guami {
    pub plmn_id: PlmnId,
    /// AMF Region ID + AMF Set ID + AMF Pointer, 6 hex digits
    pub amf_id: String,
}

impl Guami {
    pub fn new(plmn_id: PlmnId, amf_id: impl Into<String>) -> Self {
        Self {
            plmn_id,
            amf_id: amf_id.into(),
        }
    }

    /// Same serving AMF. The AMF ID is hex, so case is not significant.
    pub fn same_as(&self, other: &Guami) -> bool {
        self.plmn_id == other.plmn_id && self.amf_id.eq_ignore_ascii_case(&other.amf_id)
    }
}

impl fmt::Display for Guami {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.plmn_id.mcc, self.plmn_id.mnc, self.amf_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupAmfInfo {
    pub backup_amf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guami_list: Option<Vec<Guami>>,
}

/// IMS voice over PS session support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImsVoPs {
    HomogeneousSupport,
    HomogeneousNonSupport,
    NonHomogeneousOrUnknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatType {
    Nr,
    Eutra,
    Wlan,
    Virtual,
    Nbiot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    #[serde(rename = "3GPP_ACCESS")]
    ThreeGppAccess,
    #[serde(rename = "NON_3GPP_ACCESS")]
    NonThreeGppAccess,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeGppAccess => "3GPP_ACCESS",
            Self::NonThreeGppAccess => "NON_3GPP_ACCESS",
        }
    }

    /// Resource name under `registrations/` and `context-data/`
    pub fn resource(&self) -> &'static str {
        match self {
            Self::ThreeGppAccess => ogs_sbi::constants::resource::AMF_3GPP_ACCESS,
            Self::NonThreeGppAccess => ogs_sbi::constants::resource::AMF_NON_3GPP_ACCESS,
        }
    }

    pub fn from_resource(name: &str) -> Option<Self> {
        match name {
            ogs_sbi::constants::resource::AMF_3GPP_ACCESS => Some(Self::ThreeGppAccess),
            ogs_sbi::constants::resource::AMF_NON_3GPP_ACCESS => Some(Self::NonThreeGppAccess),
            _ => None,
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeregistrationReason {
    UeInitialRegistration,
    UeRegistrationAreaChange,
    SubscriptionWithdrawn,
    #[serde(rename = "5GS_TO_EPS_MOBILITY")]
    FiveGsToEpsMobility,
    ReregistrationRequired,
}

impl DeregistrationReason {
    /// Reason reported to a superseded AMF
    pub fn for_handover(initial_registration: bool) -> Self {
        if initial_registration {
            Self::UeInitialRegistration
        } else {
            Self::UeRegistrationAreaChange
        }
    }
}

/// Body POSTed to `deregCallbackUri`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeregistrationData {
    pub dereg_reason: DeregistrationReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<AccessType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdu_session_id: Option<i32>,
}

/// Amf3GppAccessRegistration / AmfNon3GppAccessRegistration.
///
/// Both access types share this shape; the non-3GPP record requires
/// `imsVoPs` on the wire, which is left to the AMF to supply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfRegistration {
    pub amf_instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub purge_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ims_vo_ps: Option<ImsVoPs>,
    pub dereg_callback_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amf_service_name_dereg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcscf_restoration_callback_uri: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub initial_registration_ind: bool,
    pub guami: Guami,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_amf_info: Option<Vec<BackupAmfInfo>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dr_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rat_type: Option<RatType>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub urrp_indicator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amf_ee_subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supi: Option<String>,
}

impl AmfRegistration {
    /// Whether this record carries `pei`
    pub fn has_pei(&self, pei: &str) -> bool {
        self.pei.as_deref() == Some(pei)
    }
}

/// Amf3GppAccessRegistrationModification / AmfNon3GppAccessRegistrationModification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfRegistrationModification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guami: Option<Guami>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub purge_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ims_vo_ps: Option<ImsVoPs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_amf_info: Option<Vec<BackupAmfInfo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snssai {
    pub sst: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmfRegistration {
    pub smf_instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smf_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<String>,
    pub pdu_session_id: i32,
    pub single_nssai: Snssai,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub emergency_services: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcscf_restoration_callback_uri: Option<String>,
    pub plmn_id: PlmnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgw_fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_time: Option<String>,
}

/// RFC 6902 operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOperation {
    Add,
    Copy,
    Move,
    Remove,
    Replace,
    Test,
}

/// One element of a JSON patch document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchItem {
    pub op: PatchOperation,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl PatchItem {
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOperation::Replace,
            path: path.into(),
            from: None,
            value: Some(value),
        }
    }
}
