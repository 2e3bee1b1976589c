//! Port through which the shipment coordinator confirms a trip.

use async_trait::async_trait;

use crate::domain::TripId;

use super::{CarrierItem, define_port_error};

/// Outcome of a carrier submission that reached a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierVerdict {
    pub accepted: bool,
    pub message: String,
    /// Attempts spent; zero when the endpoint was never contacted.
    pub attempts: u32,
}

/// Connectivity report for the carrier endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierProbe {
    pub enabled: bool,
    pub reachable: bool,
    pub status: Option<u16>,
    pub environment: String,
    pub message: String,
}

define_port_error! {
    /// Failures that prevented a carrier verdict.
    pub enum CarrierGatewayError {
        /// Every attempt failed at the HTTP layer.
        Unreachable { message: String, attempts: u32 } =>
            "carrier unreachable after {attempts} attempts: {message}",
        /// The submission could not be prepared or sent.
        Internal { message: String } =>
            "carrier gateway failure: {message}",
    }
}

/// Port for submitting trips to the carrier confirmation endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CarrierGateway: Send + Sync {
    /// Submit `items` for `trip` and return the carrier's verdict.
    async fn submit_trip(
        &self,
        trip: &TripId,
        items: &[CarrierItem],
    ) -> Result<CarrierVerdict, CarrierGatewayError>;

    /// Check whether the endpoint answers at all.
    async fn probe(&self) -> Result<CarrierProbe, CarrierGatewayError>;
}
