//! Best-effort side channel announcing workflow changes to dashboards.

use serde::Serialize;

use crate::domain::{BatchId, DollyId, SessionId, StationId, TripId};

/// A workflow change worth pushing to connected dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkflowNotification {
    #[serde(rename_all = "camelCase")]
    ScanCaptured {
        station: StationId,
        session_id: SessionId,
        dolly_id: DollyId,
    },
    #[serde(rename_all = "camelCase")]
    ScanUndone {
        station: StationId,
        session_id: SessionId,
        dolly_id: DollyId,
    },
    #[serde(rename_all = "camelCase")]
    SessionCompleted {
        session_id: SessionId,
        batch_id: BatchId,
        item_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    ShipmentCompleted {
        batch_id: BatchId,
        trip_id: TripId,
        item_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    QueueChanged { removed: usize, restored: usize },
}

/// Fire-and-forget publisher. Implementations must never block or fail the
/// calling operation.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Publish a notification, dropping it when nobody listens.
    fn publish(&self, notification: WorkflowNotification);
}

/// Sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn publish(&self, _notification: WorkflowNotification) {}
}
