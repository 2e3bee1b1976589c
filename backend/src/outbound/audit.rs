//! Audit sink that writes entries to the `audit` tracing target.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{AuditEntry, AuditSink, AuditSinkError};

/// Emits every audit entry as a structured `tracing` event.
///
/// Route the `audit` target to durable storage through the subscriber
/// configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        info!(
            target: "audit",
            action = entry.action,
            actor = %entry.actor,
            subject = %entry.subject,
            details = %entry.details,
            at = %entry.at.to_rfc3339(),
            "audit"
        );
        Ok(())
    }
}
