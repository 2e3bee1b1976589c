//! Scan hold records created when a dolly is physically scanned.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::lifecycle::Metadata;
use super::{BatchId, DollyId, HoldId, OperatorId, PlateId, QueueItem, SessionId, StationId, TripId, VinId};

/// Status of a scan hold as it moves through loading and shipment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Pending,
    Scanned,
    LoadingCompleted,
    Completed,
    Removed,
}

impl HoldStatus {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scanned => "scanned",
            Self::LoadingCompleted => "loading_completed",
            Self::Completed => "completed",
            Self::Removed => "removed",
        }
    }

    /// Whether a hold in this status still occupies its (dolly, VIN) pair.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Removed)
    }
}

impl fmt::Display for HoldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for [`HoldStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hold status: {0}")]
pub struct ParseHoldStatusError(pub String);

impl FromStr for HoldStatus {
    type Err = ParseHoldStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "scanned" => Ok(Self::Scanned),
            "loading_completed" => Ok(Self::LoadingCompleted),
            "completed" => Ok(Self::Completed),
            "removed" => Ok(Self::Removed),
            other => Err(ParseHoldStatusError(other.to_owned())),
        }
    }
}

/// Values for a new hold row; the store assigns the surrogate id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHoldDraft {
    pub item: QueueItem,
    pub session_id: SessionId,
    pub scan_order: i32,
    pub operator: OperatorId,
    pub scanned_at: DateTime<Utc>,
    pub metadata: Metadata,
}

/// One (dolly, VIN) pair captured by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHold {
    pub id: HoldId,
    pub status: HoldStatus,
    pub session_id: SessionId,
    /// Scan order within the session; all VINs of one dolly share it.
    pub scan_order: i32,
    pub operator: OperatorId,
    pub batch_id: Option<BatchId>,
    /// Queue metadata carried so undo can restore the original row.
    pub item: QueueItem,
    pub trip_id: Option<TripId>,
    pub plate_id: Option<PlateId>,
    pub scanned_at: DateTime<Utc>,
    pub loading_completed_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub metadata: Metadata,
}

impl ScanHold {
    /// Materialise a draft with the id chosen by the store.
    pub fn from_draft(id: HoldId, draft: ScanHoldDraft) -> Self {
        let ScanHoldDraft {
            item,
            session_id,
            scan_order,
            operator,
            scanned_at,
            metadata,
        } = draft;
        Self {
            id,
            status: HoldStatus::Scanned,
            session_id,
            scan_order,
            operator,
            batch_id: None,
            item,
            trip_id: None,
            plate_id: None,
            scanned_at,
            loading_completed_at: None,
            submitted_at: None,
            updated_at: scanned_at,
            metadata,
        }
    }

    pub fn dolly_id(&self) -> &DollyId {
        &self.item.dolly_id
    }

    pub fn vin_id(&self) -> &VinId {
        &self.item.vin_id
    }

    pub fn station(&self) -> &StationId {
        &self.item.station
    }

    /// Whether `code` identifies this hold's dolly.
    pub fn matches_code(&self, code: &str) -> bool {
        self.item.matches_code(code)
    }
}
