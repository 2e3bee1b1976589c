//! Driven port for the wire call to the carrier confirmation endpoint.
//!
//! The domain owns the submission shape; adapters own the envelope format and
//! the HTTP client. Retry decisions live in the gateway, which asks each
//! error whether another attempt may help.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{DollyId, TripId, VinId};

use super::define_port_error;

/// One shipped VIN as the carrier expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierItem {
    pub dolly_id: DollyId,
    /// Physical order number sent as the dolly number.
    pub order_number: i64,
    pub vin_id: VinId,
    /// Customer reference sent as the part number.
    pub part_number: String,
    pub quantity: i32,
    pub process_date: NaiveDate,
    pub waybill_number: String,
    pub reason_code: String,
}

/// A complete trip submission in carrier order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierSubmission {
    pub trip_id: TripId,
    pub items: Vec<CarrierItem>,
}

/// Parsed carrier answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierReply {
    pub accepted: bool,
    pub message: String,
}

define_port_error! {
    /// Errors surfaced while calling the carrier endpoint.
    pub enum CarrierTransportError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "carrier transport failed: {message}",
        /// The attempt exceeded its timeout.
        Timeout { message: String } =>
            "carrier timeout: {message}",
        /// The carrier rate-limited the request.
        RateLimited { message: String } =>
            "carrier rate limited request: {message}",
        /// The carrier answered with a non-success HTTP status.
        Unavailable { status: u16, message: String } =>
            "carrier unavailable ({status}): {message}",
        /// The adapter could not build the request.
        InvalidRequest { message: String } =>
            "carrier request invalid: {message}",
    }
}

impl CarrierTransportError {
    /// Return whether resending the same payload may help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::RateLimited { .. }
                | Self::Unavailable { .. }
        )
    }
}

/// Port for sending trip confirmations to the carrier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CarrierTransport: Send + Sync {
    /// Send one submission and parse the carrier's answer.
    ///
    /// Malformed answers and SOAP faults are returned as a non-accepted
    /// [`CarrierReply`]; only HTTP-layer failures are errors.
    async fn submit(
        &self,
        submission: &CarrierSubmission,
    ) -> Result<CarrierReply, CarrierTransportError>;

    /// Send a bare request and return the HTTP status.
    async fn probe(&self) -> Result<u16, CarrierTransportError>;
}

/// Fixture transport accepting every submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCarrierTransport;

#[async_trait]
impl CarrierTransport for FixtureCarrierTransport {
    async fn submit(
        &self,
        submission: &CarrierSubmission,
    ) -> Result<CarrierReply, CarrierTransportError> {
        Ok(CarrierReply {
            accepted: true,
            message: format!("{} items accepted", submission.items.len()),
        })
    }

    async fn probe(&self) -> Result<u16, CarrierTransportError> {
        Ok(200)
    }
}
