//! NextGCore SBI (Service Based Interface) Library
//!
//! HTTP/2 SBI plumbing shared by the network function daemons.
//!
//! # Example
//!
//! ```rust,no_run
//! use ogs_sbi::{SbiClient, SbiRequest};
//!
//! async fn example() {
//!     let client = SbiClient::with_host_port("127.0.0.4", 7777);
//!     let response = client
//!         .send_request(SbiRequest::get("/nudm-uecm/v1/imsi-001010000000001/registrations/amf-3gpp-access"))
//!         .await;
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`] - NF types, service names, URI schemes
//! - [`constants`] - HTTP status codes, methods, headers, resource names
//! - [`message`] - SBI request/response and `ProblemDetails`
//! - [`client`] - HTTP/2 client and client pool
//! - [`server`] - HTTP/2 server and error response helpers
//! - [`error`] - Error types

pub mod constants;
pub mod error;
pub mod message;
pub mod types;

pub mod client;
pub mod server;

pub use client::{SbiClient, SbiClientConfig, SbiClientPool};
pub use error::{SbiError, SbiResult};
pub use message::{ProblemDetails, SbiHeader, SbiHttpMessage, SbiRequest, SbiResponse};
pub use server::{
    send_bad_request, send_error, send_internal_error, send_method_not_allowed, send_not_found,
    send_problem, SbiRequestHandler, SbiServer, SbiServerConfig,
};
pub use types::{NfType, SbiServiceType, UriScheme};
