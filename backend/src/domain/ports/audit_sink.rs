//! Write-only audit trail port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::OperatorId;

use super::define_port_error;

/// One audited operator action.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// Short action name such as `scan_captured`.
    pub action: &'static str,
    pub actor: OperatorId,
    /// Primary subject, usually a dolly, batch, or trip id.
    pub subject: String,
    pub details: Value,
    pub at: DateTime<Utc>,
}

define_port_error! {
    /// Errors raised by audit sink adapters.
    pub enum AuditSinkError {
        /// The sink could not accept the entry.
        Unavailable { message: String } =>
            "audit sink unavailable: {message}",
    }
}

/// Port for recording audit entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one entry.
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError>;
}

/// Sink that accepts and drops every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditSink;

#[async_trait]
impl AuditSink for NoOpAuditSink {
    async fn record(&self, _entry: &AuditEntry) -> Result<(), AuditSinkError> {
        Ok(())
    }
}
