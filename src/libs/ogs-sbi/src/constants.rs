//! SBI Constants
//!
//! HTTP status codes, methods, headers, content types and the resource
//! names used by the UE context management paths.

/// HTTP Ports
pub const HTTP_PORT: u16 = 80;

/// HTTP Status Codes
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const NO_CONTENT: u16 = 204;
    pub const BAD_REQUEST: u16 = 400;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const GATEWAY_TIMEOUT: u16 = 504;
}

/// HTTP Methods
pub mod method {
    pub const DELETE: &str = "DELETE";
    pub const GET: &str = "GET";
    pub const PATCH: &str = "PATCH";
    pub const POST: &str = "POST";
    pub const PUT: &str = "PUT";
}

/// API Versions
pub mod api {
    pub const V1: &str = "v1";
}

/// Resource Names
pub mod resource {
    pub const NF_INSTANCES: &str = "nf-instances";
    pub const REGISTRATIONS: &str = "registrations";
    pub const AMF_3GPP_ACCESS: &str = "amf-3gpp-access";
    pub const AMF_NON_3GPP_ACCESS: &str = "amf-non-3gpp-access";
    pub const SMF_REGISTRATIONS: &str = "smf-registrations";
    pub const SUBSCRIPTION_DATA: &str = "subscription-data";
    pub const CONTEXT_DATA: &str = "context-data";
}

/// HTTP Headers
pub mod header {
    pub const ACCEPT: &str = "Accept";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const LOCATION: &str = "Location";
}

/// Content Types
pub mod content_type {
    pub const APPLICATION_JSON: &str = "application/json";
    pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";
    pub const APPLICATION_PATCH_JSON: &str = "application/json-patch+json";
}

/// Query Parameters
pub mod param {
    pub const TARGET_NF_TYPE: &str = "target-nf-type";
    pub const REQUESTER_NF_TYPE: &str = "requester-nf-type";
    pub const REQUESTER_NF_INSTANCE_ID: &str = "requester-nf-instance-id";
    pub const SERVICE_NAMES: &str = "service-names";
    pub const SUPI: &str = "supi";
    pub const GPSI: &str = "gpsi";
    pub const EXTERNAL_GROUP_IDENTITY: &str = "external-group-identity";
    pub const SUPPORTED_FEATURES: &str = "supported-features";
}
