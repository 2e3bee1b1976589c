//! Shared dependency bundle and helpers for the workflow services.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::warn;

use crate::domain::Error;
use crate::domain::ports::{
    AuditEntry, AuditSink, LogisticsStore, LogisticsStoreError, LogisticsTransaction,
    NoOpAuditSink, NoOpNotificationSink, NotificationSink,
};

/// Port bundle shared by every workflow service.
#[derive(Clone)]
pub struct WorkflowPorts {
    /// Store of record.
    pub store: Arc<dyn LogisticsStore>,
    /// Dashboard side channel.
    pub notifications: Arc<dyn NotificationSink>,
    /// Write-only audit trail.
    pub audit: Arc<dyn AuditSink>,
    /// Time source for every stamped timestamp.
    pub clock: Arc<dyn Clock>,
}

impl WorkflowPorts {
    /// Bundle a store with no-op side channels and the system clock.
    pub fn new(store: Arc<dyn LogisticsStore>) -> Self {
        Self {
            store,
            notifications: Arc::new(NoOpNotificationSink),
            audit: Arc::new(NoOpAuditSink),
            clock: Arc::new(DefaultClock),
        }
    }

    /// Replace the notification sink.
    #[must_use]
    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = notifications;
        self
    }

    /// Replace the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Record an audit entry; failures are logged and swallowed.
    pub(crate) async fn record_audit(&self, entry: AuditEntry) {
        if let Err(error) = self.audit.record(&entry).await {
            warn!(
                action = entry.action,
                subject = %entry.subject,
                error = %error,
                "audit sink rejected entry"
            );
        }
    }
}

/// Map store failures to the system error surfaced to callers.
pub(crate) fn map_store_error(error: LogisticsStoreError) -> Error {
    match error {
        LogisticsStoreError::Connection { message } => {
            Error::system(format!("logistics store unavailable: {message}"))
        }
        LogisticsStoreError::Query { message } => {
            Error::system(format!("logistics store error: {message}"))
        }
    }
}

/// Commit on success, roll back on failure, and return the staged result.
pub(crate) async fn finish<T>(
    tx: Box<dyn LogisticsTransaction>,
    staged: Result<T, Error>,
) -> Result<T, Error> {
    match staged {
        Ok(value) => {
            tx.commit().await.map_err(map_store_error)?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, "rollback failed; connection discarded");
            }
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[rstest]
    #[case(LogisticsStoreError::connection("refused"), "unavailable: refused")]
    #[case(LogisticsStoreError::query("syntax"), "error: syntax")]
    fn store_errors_become_system_errors(
        #[case] error: LogisticsStoreError,
        #[case] fragment: &str,
    ) {
        let mapped = map_store_error(error);
        assert_eq!(mapped.code(), ErrorCode::SystemError);
        assert!(mapped.message().contains(fragment));
        assert!(mapped.is_retryable());
    }
}
