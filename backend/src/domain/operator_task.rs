//! Downstream operator task created for every completed loading session.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BatchId, ConfirmationChannel};

/// Progress of the shipment data entry for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Partial,
    Completed,
}

impl TaskStatus {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for [`TaskStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "completed" => Ok(Self::Completed),
            other => Err(ParseTaskStatusError(other.to_owned())),
        }
    }
}

/// Operator task tracking how much of a batch has shipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTask {
    pub batch_id: BatchId,
    pub status: TaskStatus,
    pub channel: ConfirmationChannel,
    pub total_items: i32,
    pub processed_items: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OperatorTask {
    /// A fresh task for a batch of `total_items` holds.
    pub fn new(
        batch_id: BatchId,
        channel: ConfirmationChannel,
        total_items: i32,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_id,
            status: TaskStatus::Pending,
            channel,
            total_items,
            processed_items: 0,
            created_at: at,
            updated_at: at,
        }
    }

    /// Record `shipped` more items and recompute the status.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use dolly_backend::domain::{BatchId, ConfirmationChannel, OperatorTask, TaskStatus};
    ///
    /// let batch = BatchId::new("PT202601010001").expect("batch");
    /// let mut task = OperatorTask::new(batch, ConfirmationChannel::Both, 4, Utc::now());
    /// task.record_shipped(2, Utc::now());
    /// assert_eq!(task.status, TaskStatus::Partial);
    /// task.record_shipped(2, Utc::now());
    /// assert_eq!(task.status, TaskStatus::Completed);
    /// ```
    pub fn record_shipped(&mut self, shipped: i32, at: DateTime<Utc>) {
        self.processed_items = self.processed_items.saturating_add(shipped);
        self.status = if self.processed_items >= self.total_items {
            TaskStatus::Completed
        } else {
            TaskStatus::Partial
        };
        self.updated_at = at;
    }
}
