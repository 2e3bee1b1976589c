//! Driving port for finalising a batch into a carrier-confirmed shipment.

use async_trait::async_trait;

use crate::domain::{
    BatchId, ConfirmationChannel, Error, HoldId, OperatorId, PlateId, TaskStatus, TripId,
};

/// Request to ship a batch, or a selection of its holds, on one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteShipmentRequest {
    pub batch_id: BatchId,
    /// Raw trip id; normalised and validated by the coordinator.
    pub trip_id: String,
    /// Raw plate id; normalised and validated by the coordinator.
    pub plate_id: String,
    pub channel: ConfirmationChannel,
    pub operator: OperatorId,
    pub selected_hold_ids: Option<Vec<HoldId>>,
    /// Defaults to the trip id.
    pub waybill_number: Option<String>,
    /// Defaults to `TRC-00`.
    pub reason_code: Option<String>,
}

/// Result of a confirmed shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentSummary {
    pub batch_id: BatchId,
    pub trip_id: TripId,
    pub plate_id: PlateId,
    pub channel: ConfirmationChannel,
    pub item_count: usize,
    pub carrier_message: String,
    pub carrier_attempts: u32,
    pub task_status: Option<TaskStatus>,
}

/// Port for the shipment transaction coordinator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentCommand: Send + Sync {
    /// Validate, confirm with the carrier, and record the shipment atomically.
    async fn complete_shipment(
        &self,
        request: CompleteShipmentRequest,
    ) -> Result<ShipmentSummary, Error>;
}
