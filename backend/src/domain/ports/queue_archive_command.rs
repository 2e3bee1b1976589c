//! Driving port for supervisor removal and restoration of queue items.

use async_trait::async_trait;

use crate::domain::{DollyId, Error, OperatorId, RemovedQueueItem, VinId};

/// Request to move queue items into the removal archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveFromQueueRequest {
    pub items: Vec<(DollyId, VinId)>,
    pub removed_by: OperatorId,
    pub reason: Option<String>,
}

/// Request to put archived items back into the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreFromArchiveRequest {
    pub archive_ids: Vec<i64>,
    pub restored_by: OperatorId,
}

/// Why one entry of a bulk request was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// `dolly/vin` for removals, the archive id for restorations.
    pub item: String,
    pub reason: String,
}

/// Outcome of a bulk archive operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveOutcome {
    pub succeeded: usize,
    pub failed: Vec<ItemFailure>,
}

/// Port for the queue archive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueArchiveCommand: Send + Sync {
    /// Archive queue items; missing items are reported, not fatal.
    async fn remove_from_queue(
        &self,
        request: RemoveFromQueueRequest,
    ) -> Result<ArchiveOutcome, Error>;

    /// Restore archived items; pairs already in the pipeline are reported.
    async fn restore_from_archive(
        &self,
        request: RestoreFromArchiveRequest,
    ) -> Result<ArchiveOutcome, Error>;

    /// Archived items, newest first.
    async fn list_removed(&self) -> Result<Vec<RemovedQueueItem>, Error>;
}
