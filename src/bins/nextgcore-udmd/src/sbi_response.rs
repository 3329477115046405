//! SBI Response Utilities
//!
//! Maps procedure outcomes onto HTTP status, `Location` and body.

use ogs_sbi::constants::{header, status};
use ogs_sbi::{send_internal_error, send_problem, SbiResponse};
use serde::Serialize;

use crate::error::UdmResult;
use crate::nudm_handler::UecmResponse;

pub fn sbi_response<T: Serialize>(result: UdmResult<UecmResponse<T>>) -> SbiResponse {
    let outcome = match result {
        Ok(UecmResponse::Created { location, body }) => SbiResponse::with_status(status::CREATED)
            .with_header(header::LOCATION, location)
            .with_json_body(&body),
        Ok(UecmResponse::Ok(body)) => SbiResponse::with_status(status::OK).with_json_body(&body),
        Ok(UecmResponse::NoContent) => Ok(SbiResponse::with_status(status::NO_CONTENT)),
        Err(e) => {
            log::debug!("Answering with error: {e}");
            return send_problem(&e.problem_details());
        }
    };

    outcome.unwrap_or_else(|e| {
        log::error!("Failed to encode response body: {e}");
        send_internal_error(&e.to_string())
    })
}
