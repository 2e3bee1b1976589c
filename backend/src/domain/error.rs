//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope. The codes mirror the
//! failure taxonomy of the loading and shipment workflow so callers can tell
//! operator mistakes, carrier refusals, and internal faults apart.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed input such as a bad trip or plate identifier.
    ValidationError,
    /// The scanned dolly is not the next one expected at its station.
    OrderingViolation,
    /// Undo targeted something other than the operator's latest scan.
    NotLastScanned,
    /// A barcode, dolly, session, batch, or archive entry does not resolve.
    NotFound,
    /// A loading session has nothing left to complete.
    EmptySession,
    /// The trip identifier was already used by an earlier shipment.
    DuplicateTrip,
    /// The carrier explicitly refused the submission.
    CarrierRejected,
    /// The carrier could not be reached after all retries.
    CarrierUnreachable,
    /// An unexpected internal fault; the staged work was rolled back.
    SystemError,
}

impl ErrorCode {
    /// Whether resubmitting the same request unchanged may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::CarrierUnreachable | Self::SystemError)
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use dolly_backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("dolly D-1 is not queued");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    #[schema(example = "ordering_violation")]
    code: ErrorCode,
    #[schema(example = "dolly D-3 is out of order")]
    message: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was blank.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Create a new error, falling back to the code name for blank messages.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(_) => Self {
                code,
                message: format!("{code:?}"),
                retryable: code.is_retryable(),
                details: None,
            },
        }
    }

    /// Fallible constructor that validates the message content.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorValidationError::EmptyMessage`] when `message` is blank.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            retryable: code.is_retryable(),
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Whether the caller may resubmit the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use dolly_backend::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::validation("bad trip").with_details(json!({ "field": "tripId" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::ValidationError`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Convenience constructor for [`ErrorCode::OrderingViolation`].
    pub fn ordering_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OrderingViolation, message)
    }

    /// Convenience constructor for [`ErrorCode::NotLastScanned`].
    pub fn not_last_scanned(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotLastScanned, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::EmptySession`].
    pub fn empty_session(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmptySession, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateTrip`].
    pub fn duplicate_trip(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateTrip, message)
    }

    /// Convenience constructor for [`ErrorCode::CarrierRejected`].
    pub fn carrier_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CarrierRejected, message)
    }

    /// Convenience constructor for [`ErrorCode::CarrierUnreachable`].
    pub fn carrier_unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CarrierUnreachable, message)
    }

    /// Convenience constructor for [`ErrorCode::SystemError`].
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SystemError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default)]
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            retryable: value.retryable,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            retryable: _,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
