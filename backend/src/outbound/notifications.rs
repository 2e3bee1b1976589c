//! Broadcast-channel notification sink for dashboard subscribers.

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::ports::{NotificationSink, WorkflowNotification};

const DEFAULT_CAPACITY: usize = 256;

/// Publishes workflow notifications to every live subscriber.
///
/// Publishing never blocks; with no subscribers the notification is dropped
/// and slow subscribers observe a lag instead of stalling the workflow.
#[derive(Debug, Clone)]
pub struct BroadcastNotificationSink {
    sender: broadcast::Sender<WorkflowNotification>,
}

impl BroadcastNotificationSink {
    /// Create a sink buffering up to `capacity` notifications per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Attach a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowNotification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for BroadcastNotificationSink {
    fn publish(&self, notification: WorkflowNotification) {
        if self.sender.send(notification).is_err() {
            trace!("notification dropped; no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn queue_changed() -> WorkflowNotification {
        WorkflowNotification::QueueChanged {
            removed: 2,
            restored: 0,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn subscribers_receive_published_notifications() {
        let sink = BroadcastNotificationSink::default();
        let mut receiver = sink.subscribe();

        sink.publish(queue_changed());

        assert_eq!(receiver.recv().await.expect("notification"), queue_changed());
    }

    #[rstest]
    fn publishing_without_subscribers_is_silent() {
        let sink = BroadcastNotificationSink::new(0);
        sink.publish(queue_changed());
    }

    #[rstest]
    fn notifications_serialise_with_a_type_tag() {
        let value = serde_json::to_value(queue_changed()).expect("json");
        assert_eq!(
            value,
            serde_json::json!({ "type": "queueChanged", "removed": 2, "restored": 0 })
        );
    }
}
