//! Produced dollies waiting to be scanned, and the supervisor removal archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DollyId, OperatorId, StationId, VinId};

/// A produced, not-yet-consumed (dolly, VIN) pair.
///
/// Scanning consumes the row; undo re-creates it from the metadata carried on
/// the scan hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub dolly_id: DollyId,
    pub vin_id: VinId,
    /// Customer reference (part number) sent to the carrier.
    pub customer_reference: String,
    /// Grouping station (end-of-line) that produced the dolly.
    pub station: StationId,
    pub quantity: i32,
    pub produced_at: Option<DateTime<Utc>>,
    /// Physical order number, monotonic per station.
    pub order_number: i64,
    /// Printed barcode; the dolly id resolves as well when absent.
    pub barcode: Option<String>,
}

impl QueueItem {
    /// The pipeline key of this item.
    pub fn key(&self) -> (DollyId, VinId) {
        (self.dolly_id.clone(), self.vin_id.clone())
    }

    /// Whether `code` identifies this item's dolly.
    pub fn matches_code(&self, code: &str) -> bool {
        self.dolly_id.as_str() == code || self.barcode.as_deref() == Some(code)
    }
}

/// A queue item removed by a supervisor, kept so it can be restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedQueueItem {
    pub archive_id: i64,
    pub item: QueueItem,
    pub removed_by: OperatorId,
    pub reason: Option<String>,
    pub removed_at: DateTime<Utc>,
}
