//! Scan ledger: captures dolly scans in station order and undoes them LIFO.
//!
//! Every capture and undo runs in one transaction that first takes the
//! station lock, so the expected order is read and consumed atomically even
//! when several forklifts scan on the same station.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::lifecycle_log::LifecycleLog;
use crate::domain::ports::{
    AuditEntry, CaptureScanRequest, LogisticsTransaction, ScanLedgerCommand, ScanOutcome,
    UndoScanRequest, WorkflowNotification,
};
use crate::domain::workflow_support::{WorkflowPorts, finish, map_store_error};
use crate::domain::{
    DollyId, Error, HoldStatus, LifecycleEvent, LifecycleSource, LifecycleStatus, Metadata,
    OperatorId, QueueItem, ScanHold, ScanHoldDraft, SessionId, StationId,
};

/// Scan ledger service implementing [`ScanLedgerCommand`].
#[derive(Clone)]
pub struct ScanLedger {
    ports: WorkflowPorts,
}

impl ScanLedger {
    /// Create the ledger over the shared workflow ports.
    pub fn new(ports: WorkflowPorts) -> Self {
        Self { ports }
    }

    async fn stage_capture(
        &self,
        tx: &mut dyn LogisticsTransaction,
        code: &str,
        operator: &OperatorId,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome, Error> {
        let station = resolve_queued(tx, code).await?.station;
        tx.lock_station(&station).await.map_err(map_store_error)?;

        // A concurrent scan may have consumed the dolly while we waited.
        let items = tx
            .queue_items_by_code(code)
            .await
            .map_err(map_store_error)?;
        let Some(first) = items.first() else {
            return Err(not_queued(code));
        };
        let dolly_id = first.dolly_id.clone();
        let order_number = first.order_number;

        let expected = match tx
            .max_scanned_order_number(&station, session_id)
            .await
            .map_err(map_store_error)?
        {
            Some(last) => Some(last + 1),
            None => tx.min_queued_order(&station).await.map_err(map_store_error)?,
        };
        if expected != Some(order_number) {
            let expected_dolly = match expected {
                Some(order) => tx
                    .queued_dolly_at_order(&station, order)
                    .await
                    .map_err(map_store_error)?,
                None => None,
            };
            return Err(ordering_violation(
                &station,
                &dolly_id,
                order_number,
                expected,
                expected_dolly,
            ));
        }

        let scan_order = tx
            .max_scan_order(session_id)
            .await
            .map_err(map_store_error)?
            .unwrap_or(0)
            + 1;

        let keys: Vec<_> = items.iter().map(QueueItem::key).collect();
        tx.delete_queue_items(&keys).await.map_err(map_store_error)?;

        let drafts = items
            .into_iter()
            .map(|item| ScanHoldDraft {
                item,
                session_id: session_id.clone(),
                scan_order,
                operator: operator.clone(),
                scanned_at: now,
                metadata: Metadata::from([("code".to_owned(), json!(code))]),
            })
            .collect();
        let holds = tx.insert_holds(drafts).await.map_err(map_store_error)?;

        let events: Vec<_> = holds
            .iter()
            .map(|hold| {
                LifecycleEvent::new(
                    hold.dolly_id().clone(),
                    hold.vin_id().clone(),
                    LifecycleStatus::ScanCaptured,
                    LifecycleSource::Forklift,
                    now,
                )
                .with_meta("sessionId", session_id.as_str())
                .with_meta("scanOrder", scan_order)
                .with_meta("operator", operator.as_str())
            })
            .collect();
        LifecycleLog::stage(tx, &events)
            .await
            .map_err(map_store_error)?;

        Ok(ScanOutcome {
            session_id: session_id.clone(),
            station,
            dolly_id,
            scan_order,
            order_number,
            holds,
        })
    }

    async fn stage_undo(
        &self,
        tx: &mut dyn LogisticsTransaction,
        request: &UndoScanRequest,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome, Error> {
        let held = tx
            .active_holds_by_code(code)
            .await
            .map_err(map_store_error)?;
        let (station, requested_dolly) = match held.first() {
            Some(hold) => (hold.station().clone(), hold.dolly_id().clone()),
            None => {
                let item = resolve_queued(tx, code).await?;
                (item.station, item.dolly_id)
            }
        };

        tx.lock_station(&station).await.map_err(map_store_error)?;

        let last = tx
            .last_scanned_holds(&station, &request.operator, &request.session_id)
            .await
            .map_err(map_store_error)?;
        let Some(last_hold) = last.first() else {
            return Err(Error::not_found(format!(
                "no scanned dolly to undo for session {} at station {station}",
                request.session_id
            ))
            .with_details(json!({
                "sessionId": request.session_id,
                "station": station,
                "operator": request.operator,
            })));
        };
        if last_hold.dolly_id() != &requested_dolly {
            return Err(Error::not_last_scanned(format!(
                "dolly {requested_dolly} is not the last scanned; undo {} first",
                last_hold.dolly_id()
            ))
            .with_details(json!({
                "requestedDolly": requested_dolly,
                "lastDolly": last_hold.dolly_id(),
                "lastScanOrder": last_hold.scan_order,
                "station": station,
            })));
        }
        let scan_order = last_hold.scan_order;
        let order_number = last_hold.item.order_number;

        let removed: Vec<ScanHold> = last
            .into_iter()
            .map(|mut hold| {
                hold.status = HoldStatus::Removed;
                hold.updated_at = now;
                hold
            })
            .collect();
        tx.update_holds(&removed).await.map_err(map_store_error)?;

        let restored: Vec<QueueItem> = removed.iter().map(|hold| hold.item.clone()).collect();
        tx.insert_queue_items(&restored)
            .await
            .map_err(map_store_error)?;

        let events: Vec<_> = removed
            .iter()
            .map(|hold| {
                LifecycleEvent::new(
                    hold.dolly_id().clone(),
                    hold.vin_id().clone(),
                    LifecycleStatus::EolReady,
                    LifecycleSource::ForkliftRemove,
                    now,
                )
                .with_meta("sessionId", request.session_id.as_str())
                .with_meta("undoneScanOrder", scan_order)
                .with_meta("operator", request.operator.as_str())
            })
            .collect();
        LifecycleLog::stage(tx, &events)
            .await
            .map_err(map_store_error)?;

        Ok(ScanOutcome {
            session_id: request.session_id.clone(),
            station,
            dolly_id: requested_dolly,
            scan_order,
            order_number,
            holds: removed,
        })
    }
}

async fn resolve_queued(
    tx: &mut dyn LogisticsTransaction,
    code: &str,
) -> Result<QueueItem, Error> {
    tx.queue_items_by_code(code)
        .await
        .map_err(map_store_error)?
        .into_iter()
        .next()
        .ok_or_else(|| not_queued(code))
}

fn not_queued(code: &str) -> Error {
    Error::not_found(format!("no queued dolly matches {code}")).with_details(json!({
        "code": code,
    }))
}

fn ordering_violation(
    station: &StationId,
    received_dolly: &DollyId,
    received_order: i64,
    expected_order: Option<i64>,
    expected_dolly: Option<DollyId>,
) -> Error {
    let expected_text = expected_order.map_or_else(|| "none".to_owned(), |o| o.to_string());
    Error::ordering_violation(format!(
        "dolly {received_dolly} has order {received_order} but station {station} expects {expected_text}"
    ))
    .with_details(json!({
        "expectedOrder": expected_order,
        "expectedDolly": expected_dolly,
        "receivedDolly": received_dolly,
        "receivedOrder": received_order,
        "station": station,
    }))
}

fn normalise_code(raw: &str) -> Result<String, Error> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(Error::validation("barcode must not be empty").with_details(json!({
            "field": "code",
            "code": "empty_barcode",
        })));
    }
    Ok(code.to_owned())
}

#[async_trait]
impl ScanLedgerCommand for ScanLedger {
    async fn capture_scan(&self, request: CaptureScanRequest) -> Result<ScanOutcome, Error> {
        let code = normalise_code(&request.code)?;
        let now = self.ports.clock.utc();
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| SessionId::default_for(&request.operator, now));

        let mut tx = self.ports.store.begin().await.map_err(map_store_error)?;
        let staged = self
            .stage_capture(tx.as_mut(), &code, &request.operator, &session_id, now)
            .await;
        let outcome = finish(tx, staged).await.inspect_err(|error| {
            warn!(
                code = %code,
                operator = %request.operator,
                session_id = %session_id,
                error_code = ?error.code(),
                error = %error,
                "scan capture rejected"
            );
        })?;

        info!(
            dolly_id = %outcome.dolly_id,
            station = %outcome.station,
            session_id = %outcome.session_id,
            scan_order = outcome.scan_order,
            vins = outcome.holds.len(),
            "scan captured"
        );
        self.ports
            .notifications
            .publish(WorkflowNotification::ScanCaptured {
                station: outcome.station.clone(),
                session_id: outcome.session_id.clone(),
                dolly_id: outcome.dolly_id.clone(),
            });
        self.ports
            .record_audit(AuditEntry {
                action: "scan_captured",
                actor: request.operator,
                subject: outcome.dolly_id.to_string(),
                details: json!({
                    "sessionId": outcome.session_id,
                    "station": outcome.station,
                    "scanOrder": outcome.scan_order,
                }),
                at: now,
            })
            .await;
        Ok(outcome)
    }

    async fn undo_last_scan(&self, request: UndoScanRequest) -> Result<ScanOutcome, Error> {
        let code = normalise_code(&request.code)?;
        let now = self.ports.clock.utc();

        let mut tx = self.ports.store.begin().await.map_err(map_store_error)?;
        let staged = self.stage_undo(tx.as_mut(), &request, &code, now).await;
        let outcome = finish(tx, staged).await.inspect_err(|error| {
            warn!(
                code = %code,
                operator = %request.operator,
                session_id = %request.session_id,
                error_code = ?error.code(),
                error = %error,
                "scan undo rejected"
            );
        })?;

        info!(
            dolly_id = %outcome.dolly_id,
            station = %outcome.station,
            session_id = %outcome.session_id,
            scan_order = outcome.scan_order,
            "scan undone"
        );
        self.ports
            .notifications
            .publish(WorkflowNotification::ScanUndone {
                station: outcome.station.clone(),
                session_id: outcome.session_id.clone(),
                dolly_id: outcome.dolly_id.clone(),
            });
        self.ports
            .record_audit(AuditEntry {
                action: "scan_undone",
                actor: request.operator,
                subject: outcome.dolly_id.to_string(),
                details: json!({
                    "sessionId": outcome.session_id,
                    "station": outcome.station,
                    "scanOrder": outcome.scan_order,
                }),
                at: now,
            })
            .await;
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "scan_ledger_tests.rs"]
mod tests;
