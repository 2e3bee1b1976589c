//! Lifecycle event model mirrored for every workflow transition.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ConfirmationChannel, DollyId, VinId};

/// Free-form metadata attached to holds and lifecycle events.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Status label recorded for a (dolly, VIN) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    EolReady,
    ScanCaptured,
    LoadingCompleted,
    CompletedAsn,
    CompletedWaybill,
    CompletedBoth,
    QueueRemoved,
}

impl LifecycleStatus {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EolReady => "EOL_READY",
            Self::ScanCaptured => "SCAN_CAPTURED",
            Self::LoadingCompleted => "LOADING_COMPLETED",
            Self::CompletedAsn => "COMPLETED_ASN",
            Self::CompletedWaybill => "COMPLETED_WAYBILL",
            Self::CompletedBoth => "COMPLETED_BOTH",
            Self::QueueRemoved => "QUEUE_REMOVED",
        }
    }

    /// Completion label for the confirmation channel used.
    pub const fn completed_via(channel: ConfirmationChannel) -> Self {
        match channel {
            ConfirmationChannel::Asn => Self::CompletedAsn,
            ConfirmationChannel::Waybill => Self::CompletedWaybill,
            ConfirmationChannel::Both => Self::CompletedBoth,
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for lifecycle labels read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifecycle label: {0}")]
pub struct ParseLifecycleLabelError(pub String);

impl FromStr for LifecycleStatus {
    type Err = ParseLifecycleLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "EOL_READY" => Ok(Self::EolReady),
            "SCAN_CAPTURED" => Ok(Self::ScanCaptured),
            "LOADING_COMPLETED" => Ok(Self::LoadingCompleted),
            "COMPLETED_ASN" => Ok(Self::CompletedAsn),
            "COMPLETED_WAYBILL" => Ok(Self::CompletedWaybill),
            "COMPLETED_BOTH" => Ok(Self::CompletedBoth),
            "QUEUE_REMOVED" => Ok(Self::QueueRemoved),
            other => Err(ParseLifecycleLabelError(other.to_owned())),
        }
    }
}

/// Actor class that caused a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleSource {
    Forklift,
    ForkliftRemove,
    Operator,
    Supervisor,
}

impl LifecycleSource {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forklift => "FORKLIFT",
            Self::ForkliftRemove => "FORKLIFT_REMOVE",
            Self::Operator => "OPERATOR",
            Self::Supervisor => "SUPERVISOR",
        }
    }
}

impl fmt::Display for LifecycleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleSource {
    type Err = ParseLifecycleLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "FORKLIFT" => Ok(Self::Forklift),
            "FORKLIFT_REMOVE" => Ok(Self::ForkliftRemove),
            "OPERATOR" => Ok(Self::Operator),
            "SUPERVISOR" => Ok(Self::Supervisor),
            other => Err(ParseLifecycleLabelError(other.to_owned())),
        }
    }
}

/// One append-only lifecycle entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub dolly_id: DollyId,
    pub vin_id: VinId,
    pub status: LifecycleStatus,
    pub source: LifecycleSource,
    pub metadata: Metadata,
    pub recorded_at: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Build an event with empty metadata.
    pub fn new(
        dolly_id: DollyId,
        vin_id: VinId,
        status: LifecycleStatus,
        source: LifecycleSource,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            dolly_id,
            vin_id,
            status,
            source,
            metadata: Metadata::new(),
            recorded_at,
        }
    }

    /// Attach one metadata entry.
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }
}
