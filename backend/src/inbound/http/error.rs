//! HTTP adapter mapping for domain errors.
//!
//! Keeps [`Error`] transport agnostic while letting Actix handlers return it
//! directly. Each workflow failure maps to one status code; system errors are
//! logged in full and redacted before they reach the scanner client.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode};

/// Message returned to clients in place of internal failure details.
pub const REDACTED_MESSAGE: &str = "internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
        ErrorCode::OrderingViolation
        | ErrorCode::NotLastScanned
        | ErrorCode::EmptySession
        | ErrorCode::DuplicateTrip => StatusCode::CONFLICT,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::CarrierRejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::CarrierUnreachable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::SystemError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::SystemError) {
        Error::system(REDACTED_MESSAGE)
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::SystemError) {
            error!(message = self.message(), "request failed with a system error");
        }
        HttpResponse::build(self.status_code()).json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::system(REDACTED_MESSAGE)
    }
}

/// Render malformed JSON bodies as validation errors.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::validation(format!("invalid request body: {err}")).into()
}

/// Render malformed query strings as validation errors.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::validation(format!("invalid query string: {err}")).into()
}
