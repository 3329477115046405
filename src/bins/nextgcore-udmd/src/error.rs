//! UDM Error Types
//!
//! Per-request failures of the UE context management procedures. None of
//! them is fatal to the process.

use ogs_sbi::constants::status;
use ogs_sbi::{ProblemDetails, SbiError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UdmError {
    /// No UDR could be resolved for the identifier
    #[error("[{0}] no UDR found")]
    UdrNotFound(String),

    /// No local registration to update
    #[error("[{0}] context not found")]
    ContextNotFound(String),

    /// Update carried a GUAMI different from the registered one
    #[error("[{0}] invalid GUAMI")]
    InvalidGuami(String),

    /// Error answered by a peer NF, passed through verbatim
    #[error("remote error: {}", remote_detail(.0))]
    Remote(ProblemDetails),

    /// Transport failure towards a collaborator
    #[error(transparent)]
    Sbi(#[from] SbiError),
}

fn remote_detail(problem: &ProblemDetails) -> &str {
    problem.detail.as_deref().unwrap_or("unknown")
}

impl UdmError {
    pub fn problem_details(&self) -> ProblemDetails {
        match self {
            Self::UdrNotFound(ue_id) => {
                ProblemDetails::system_failure(format!("No UDR URI found for {ue_id}"))
            }
            Self::ContextNotFound(ue_id) => ProblemDetails::new(status::NOT_FOUND)
                .with_cause("CONTEXT_NOT_FOUND")
                .with_detail(format!("No registration found for {ue_id}")),
            Self::InvalidGuami(ue_id) => ProblemDetails::new(status::FORBIDDEN)
                .with_cause("INVALID_GUAMI")
                .with_detail(format!("GUAMI does not match the registration of {ue_id}")),
            Self::Remote(problem) => problem.clone(),
            Self::Sbi(e) => ProblemDetails::new(e.status_code().unwrap_or(status::INTERNAL_SERVER_ERROR))
                .with_cause("SYSTEM_FAILURE")
                .with_detail(e.to_string()),
        }
    }

    pub fn status(&self) -> u16 {
        self.problem_details().status_or_default()
    }
}

impl From<UdmError> for ProblemDetails {
    fn from(e: UdmError) -> Self {
        e.problem_details()
    }
}

pub type UdmResult<T> = Result<T, UdmError>;
