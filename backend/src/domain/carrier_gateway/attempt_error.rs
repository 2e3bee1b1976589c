//! Attempt-local outcomes for one carrier transport call.
//!
//! The retry loop either tries again or fails hard; carrier refusals arrive
//! as parsed replies, never as attempt errors.

use crate::domain::ports::CarrierTransportError;

pub(super) enum AttemptError {
    /// HTTP-layer failure that may succeed with the same payload.
    Retryable(CarrierTransportError),
    /// The request could not be built.
    Invalid(String),
}

impl From<CarrierTransportError> for AttemptError {
    fn from(error: CarrierTransportError) -> Self {
        match error {
            CarrierTransportError::InvalidRequest { message } => Self::Invalid(message),
            retryable => Self::Retryable(retryable),
        }
    }
}
