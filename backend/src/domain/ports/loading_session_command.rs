//! Driving ports for closing loading sessions and reading their projections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    BatchId, ConfirmationChannel, Error, HoldStatus, OperatorId, ScanHold, SessionId, TaskStatus,
};

/// Request to close a loading session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteSessionRequest {
    pub session_id: SessionId,
    pub operator: OperatorId,
}

/// Result of closing a loading session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCompletion {
    pub session_id: SessionId,
    pub batch_id: BatchId,
    pub item_count: usize,
    pub channel: ConfirmationChannel,
}

/// One (session, status, operator) group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub status: HoldStatus,
    pub operator: OperatorId,
    pub item_count: usize,
    pub first_scan_at: DateTime<Utc>,
    pub loading_completed_at: Option<DateTime<Utc>>,
    pub batch_id: Option<BatchId>,
}

/// A batch with its shippable holds and task progress.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDetails {
    pub batch_id: BatchId,
    pub channel: ConfirmationChannel,
    pub task_status: TaskStatus,
    pub total_items: i32,
    pub processed_items: i32,
    /// Holds still waiting for shipment, in carrier order.
    pub holds: Vec<ScanHold>,
}

/// Port for closing loading sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoadingSessionCommand: Send + Sync {
    /// Close a session and assign its batch.
    async fn complete_session(
        &self,
        request: CompleteSessionRequest,
    ) -> Result<SessionCompletion, Error>;
}

/// Port for loading session read models.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoadingSessionQuery: Send + Sync {
    /// Session groups, newest first.
    async fn list_sessions(&self, status: Option<HoldStatus>) -> Result<Vec<SessionSummary>, Error>;

    /// Batches with holds waiting for shipment.
    async fn pending_shipments(&self) -> Result<Vec<BatchDetails>, Error>;

    /// One batch.
    async fn batch_details(&self, batch: BatchId) -> Result<BatchDetails, Error>;
}
