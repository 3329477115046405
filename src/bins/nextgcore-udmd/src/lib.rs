//! NextGCore UDM (Unified Data Management) Library
//!
//! UE context management (nudm-uecm) for the 5G core: AMF registrations per
//! access type and SMF registrations per PDU session, kept in a local
//! registry and persisted in the UDR (nudr-dr). When a new AMF supersedes an
//! old one, the old AMF is told through its deregistration callback.

pub mod config;
pub mod context;
pub mod dereg_notify;
pub mod error;
pub mod models;
pub mod nudm_handler;
pub mod nudr_build;
pub mod nudr_client;
pub mod sbi_path;
pub mod sbi_response;
pub mod udr_resolver;
pub mod uecm_request;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::{ConfigError, UdmConfig};
pub use context::{LocationUri, UdmContext, UdmUe};
pub use dereg_notify::{CallbackClient, DeregDispatch, DeregNotification, DeregNotifier};
pub use error::{UdmError, UdmResult};
pub use nudm_handler::{UecmHandler, UecmResponse};
pub use nudr_client::{DataRepository, SbiDataRepository};
pub use udr_resolver::{DiscoveryParam, NfDiscovery, UdrResolver, UeIdType};
pub use uecm_request::UecmRequest;

// Re-export SBI path functions
pub use sbi_path::{handle_request, udm_sbi_open, NrfDiscovery, SbiCallbackClient};
