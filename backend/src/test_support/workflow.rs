//! Builders and recording sinks for workflow service tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::ports::{
    AuditEntry, AuditSink, AuditSinkError, NotificationSink, WorkflowNotification,
};
use crate::domain::{DollyId, QueueItem, StationId, VinId};

/// Fixed instant used as "now" across workflow tests.
pub fn shift_start() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).single() {
        Some(at) => at,
        None => panic!("shift start must be a valid instant"),
    }
}

/// A queued VIN with deterministic production metadata.
pub fn queue_item(dolly: &str, vin: &str, station: &str, order_number: i64) -> QueueItem {
    QueueItem {
        dolly_id: DollyId::new(dolly)
            .unwrap_or_else(|error| panic!("invalid dolly fixture: {error}")),
        vin_id: VinId::new(vin).unwrap_or_else(|error| panic!("invalid vin fixture: {error}")),
        customer_reference: format!("REF-{vin}"),
        station: StationId::new(station)
            .unwrap_or_else(|error| panic!("invalid station fixture: {error}")),
        quantity: 1,
        produced_at: Some(shift_start()),
        order_number,
        barcode: None,
    }
}

/// Sink keeping every published notification.
#[derive(Default)]
pub struct RecordingNotificationSink(Mutex<Vec<WorkflowNotification>>);

impl RecordingNotificationSink {
    pub fn published(&self) -> Vec<WorkflowNotification> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("notification mutex poisoned"),
        }
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn publish(&self, notification: WorkflowNotification) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(notification);
        }
    }
}

/// Audit sink keeping every entry.
#[derive(Default)]
pub struct RecordingAuditSink(Mutex<Vec<AuditEntry>>);

impl RecordingAuditSink {
    pub fn actions(&self) -> Vec<&'static str> {
        match self.0.lock() {
            Ok(entries) => entries.iter().map(|entry| entry.action).collect(),
            Err(_) => panic!("audit mutex poisoned"),
        }
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        match self.0.lock() {
            Ok(mut entries) => {
                entries.push(entry.clone());
                Ok(())
            }
            Err(_) => Err(AuditSinkError::unavailable("audit mutex poisoned")),
        }
    }
}
