//! Response bodies shared by several workflow endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::BatchDetails;
use crate::domain::{ConfirmationChannel, HoldStatus, Metadata, ScanHold, TaskStatus};

/// A scan hold as shown to scanner and office clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HoldBody {
    pub id: i64,
    pub status: HoldStatus,
    pub session_id: String,
    pub scan_order: i32,
    pub operator_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub dolly_id: String,
    pub vin_id: String,
    pub customer_reference: String,
    pub station: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produced_at: Option<DateTime<Utc>>,
    pub order_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_id: Option<String>,
    pub scanned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

impl From<ScanHold> for HoldBody {
    fn from(hold: ScanHold) -> Self {
        Self {
            id: hold.id.get(),
            status: hold.status,
            session_id: hold.session_id.to_string(),
            scan_order: hold.scan_order,
            operator_id: hold.operator.to_string(),
            batch_id: hold.batch_id.map(String::from),
            dolly_id: hold.item.dolly_id.to_string(),
            vin_id: hold.item.vin_id.to_string(),
            customer_reference: hold.item.customer_reference,
            station: hold.item.station.to_string(),
            quantity: hold.item.quantity,
            produced_at: hold.item.produced_at,
            order_number: hold.item.order_number,
            trip_id: hold.trip_id.map(String::from),
            plate_id: hold.plate_id.map(String::from),
            scanned_at: hold.scanned_at,
            loading_completed_at: hold.loading_completed_at,
            submitted_at: hold.submitted_at,
            metadata: hold.metadata,
        }
    }
}

/// A batch with its task progress and the holds still waiting for shipment.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchBody {
    pub batch_id: String,
    pub channel: ConfirmationChannel,
    pub task_status: TaskStatus,
    pub total_items: i32,
    pub processed_items: i32,
    pub holds: Vec<HoldBody>,
}

impl From<BatchDetails> for BatchBody {
    fn from(batch: BatchDetails) -> Self {
        Self {
            batch_id: batch.batch_id.to_string(),
            channel: batch.channel,
            task_status: batch.task_status,
            total_items: batch.total_items,
            processed_items: batch.processed_items,
            holds: batch.holds.into_iter().map(HoldBody::from).collect(),
        }
    }
}
