//! Unit tests for scan capture ordering and LIFO undo.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::ScanLedger;
use crate::domain::ports::{
    AuditSinkError, CaptureScanRequest, LogisticsStore, MockAuditSink, ScanLedgerCommand,
    UndoScanRequest, WorkflowNotification,
};
use crate::domain::workflow_support::WorkflowPorts;
use crate::domain::{
    DollyId, ErrorCode, HoldStatus, LifecycleSource, LifecycleStatus, OperatorId, SessionId,
};
use crate::outbound::memory::InMemoryLogisticsStore;
use crate::test_support::carrier::MutableClock;
use crate::test_support::workflow::{RecordingAuditSink, RecordingNotificationSink};
use crate::test_support::{queue_item, shift_start};

struct Harness {
    store: Arc<InMemoryLogisticsStore>,
    clock: Arc<MutableClock>,
    notifications: Arc<RecordingNotificationSink>,
    audit: Arc<RecordingAuditSink>,
    ledger: ScanLedger,
}

#[fixture]
fn harness() -> Harness {
    let store = Arc::new(InMemoryLogisticsStore::new());
    let clock = Arc::new(MutableClock::new(shift_start()));
    let notifications = Arc::new(RecordingNotificationSink::default());
    let audit = Arc::new(RecordingAuditSink::default());
    let ports = WorkflowPorts::new(store.clone())
        .with_clock(clock.clone())
        .with_notifications(notifications.clone())
        .with_audit(audit.clone());
    Harness {
        store,
        clock,
        notifications,
        audit,
        ledger: ScanLedger::new(ports),
    }
}

fn operator(value: &str) -> OperatorId {
    OperatorId::new(value).expect("operator fixture")
}

fn session(value: &str) -> SessionId {
    SessionId::new(value).expect("session fixture")
}

fn capture(code: &str, op: &str, session_id: &str) -> CaptureScanRequest {
    CaptureScanRequest {
        code: code.to_owned(),
        operator: operator(op),
        session_id: Some(session(session_id)),
    }
}

fn undo(code: &str, op: &str, session_id: &str) -> UndoScanRequest {
    UndoScanRequest {
        session_id: session(session_id),
        code: code.to_owned(),
        operator: operator(op),
    }
}

async fn seed_station(harness: &Harness, count: i64) {
    harness
        .store
        .seed_queue((1..=count).map(|order| {
            queue_item(&format!("D{order}"), &format!("V{order}"), "EOL1", order)
        }))
        .await;
}

async fn scan(harness: &Harness, code: &str) {
    harness
        .ledger
        .capture_scan(capture(code, "OP1", "S1"))
        .await
        .expect("scan succeeds");
    harness.clock.advance_seconds(5);
}

#[rstest]
#[tokio::test]
async fn capture_consumes_every_vin_of_the_dolly(harness: Harness) {
    harness
        .store
        .seed_queue([
            queue_item("D1", "V1", "EOL1", 1),
            queue_item("D1", "V2", "EOL1", 1),
        ])
        .await;

    let outcome = harness
        .ledger
        .capture_scan(capture("D1", "OP1", "S1"))
        .await
        .expect("capture");

    assert_eq!(outcome.scan_order, 1);
    assert_eq!(outcome.order_number, 1);
    assert_eq!(outcome.holds.len(), 2);
    assert!(outcome.holds.iter().all(|hold| hold.status == HoldStatus::Scanned));
    assert!(outcome.holds.iter().all(|hold| hold.scan_order == 1));
    assert!(harness.store.queue_items(None).await.expect("queue").is_empty());

    let dolly = DollyId::new("D1").expect("dolly");
    let trail = harness.store.lifecycle_trail(&dolly).await.expect("trail");
    assert_eq!(trail.len(), 2);
    assert!(trail.iter().all(|event| {
        event.status == LifecycleStatus::ScanCaptured && event.source == LifecycleSource::Forklift
    }));
    assert_eq!(
        harness.notifications.published(),
        vec![WorkflowNotification::ScanCaptured {
            station: outcome.station.clone(),
            session_id: session("S1"),
            dolly_id: dolly,
        }]
    );
    assert_eq!(harness.audit.actions(), vec!["scan_captured"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_scans_on_one_station_consume_the_dolly_once(harness: Harness) {
    harness
        .store
        .seed_queue([
            queue_item("D1", "V1", "EOL1", 1),
            queue_item("D1", "V2", "EOL1", 1),
            queue_item("D2", "V3", "EOL1", 2),
        ])
        .await;

    let (first, second) = tokio::join!(
        harness.ledger.capture_scan(capture("D1", "OP1", "S1")),
        harness.ledger.capture_scan(capture("D1", "OP2", "S2")),
    );

    let (winner, loser) = match (first, second) {
        (Ok(outcome), Err(error)) | (Err(error), Ok(outcome)) => (outcome, error),
        other => panic!("expected exactly one successful scan, got {other:?}"),
    };
    assert_eq!(winner.holds.len(), 2);
    assert!(matches!(
        loser.code(),
        ErrorCode::NotFound | ErrorCode::OrderingViolation
    ));

    let queued = harness.store.queue_items(None).await.expect("queue");
    let held = harness.store.holds(None).await.expect("holds");
    for (dolly, vin) in [("D1", "V1"), ("D1", "V2"), ("D2", "V3")] {
        let in_queue = queued
            .iter()
            .filter(|item| item.dolly_id.as_str() == dolly && item.vin_id.as_str() == vin)
            .count();
        let in_holds = held
            .iter()
            .filter(|hold| hold.dolly_id().as_str() == dolly && hold.vin_id().as_str() == vin)
            .count();
        assert_eq!(in_queue + in_holds, 1, "{dolly}/{vin} appears {} times", in_queue + in_holds);
    }
}

#[rstest]
#[tokio::test]
async fn out_of_order_scan_is_rejected_without_state_change(harness: Harness) {
    seed_station(&harness, 3).await;
    scan(&harness, "D1").await;

    let error = harness
        .ledger
        .capture_scan(capture("D3", "OP1", "S1"))
        .await
        .expect_err("order 3 skips order 2");

    assert_eq!(error.code(), ErrorCode::OrderingViolation);
    assert!(!error.is_retryable());
    let details = error.details().expect("details");
    assert_eq!(details["expectedOrder"], json!(2));
    assert_eq!(details["expectedDolly"], json!("D2"));
    assert_eq!(details["receivedDolly"], json!("D3"));
    assert_eq!(details["receivedOrder"], json!(3));
    assert_eq!(details["station"], json!("EOL1"));

    let queued = harness.store.queue_items(None).await.expect("queue");
    let dollies: Vec<_> = queued.iter().map(|item| item.dolly_id.as_str()).collect();
    assert_eq!(dollies, ["D2", "D3"]);
    assert_eq!(harness.store.holds(None).await.expect("holds").len(), 1);
}

#[rstest]
#[tokio::test]
async fn first_scan_must_match_lowest_queued_order(harness: Harness) {
    seed_station(&harness, 2).await;

    let error = harness
        .ledger
        .capture_scan(capture("D2", "OP1", "S1"))
        .await
        .expect_err("order 1 is still queued");

    assert_eq!(error.code(), ErrorCode::OrderingViolation);
    let details = error.details().expect("details");
    assert_eq!(details["expectedOrder"], json!(1));
    assert_eq!(details["expectedDolly"], json!("D1"));
}

#[rstest]
#[tokio::test]
async fn undo_restores_queue_and_allows_rescan(harness: Harness) {
    seed_station(&harness, 2).await;
    scan(&harness, "D1").await;
    scan(&harness, "D2").await;

    let undone = harness
        .ledger
        .undo_last_scan(undo("D2", "OP1", "S1"))
        .await
        .expect("undo last");
    assert_eq!(undone.scan_order, 2);
    assert!(undone.holds.iter().all(|hold| hold.status == HoldStatus::Removed));

    let queued = harness.store.queue_items(None).await.expect("queue");
    assert_eq!(queued, vec![queue_item("D2", "V2", "EOL1", 2)]);

    let rescanned = harness
        .ledger
        .capture_scan(capture("D2", "OP1", "S1"))
        .await
        .expect("rescan");
    assert_eq!(rescanned.scan_order, 2);

    let dolly = DollyId::new("D2").expect("dolly");
    let labels: Vec<_> = harness
        .store
        .lifecycle_trail(&dolly)
        .await
        .expect("trail")
        .into_iter()
        .map(|event| (event.status, event.source))
        .collect();
    assert_eq!(
        labels,
        vec![
            (LifecycleStatus::ScanCaptured, LifecycleSource::Forklift),
            (LifecycleStatus::EolReady, LifecycleSource::ForkliftRemove),
            (LifecycleStatus::ScanCaptured, LifecycleSource::Forklift),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn undo_of_an_older_dolly_names_the_last_one(harness: Harness) {
    seed_station(&harness, 2).await;
    scan(&harness, "D1").await;
    scan(&harness, "D2").await;

    let error = harness
        .ledger
        .undo_last_scan(undo("D1", "OP1", "S1"))
        .await
        .expect_err("D2 is newer");

    assert_eq!(error.code(), ErrorCode::NotLastScanned);
    let details = error.details().expect("details");
    assert_eq!(details["requestedDolly"], json!("D1"));
    assert_eq!(details["lastDolly"], json!("D2"));
    assert_eq!(details["lastScanOrder"], json!(2));
    assert_eq!(
        harness
            .store
            .holds(Some(HoldStatus::Scanned))
            .await
            .expect("holds")
            .len(),
        2
    );
}

#[rstest]
#[case("OP1", "S2")]
#[case("OP2", "S1")]
#[tokio::test]
async fn undo_is_scoped_to_operator_and_session(
    harness: Harness,
    #[case] op: &str,
    #[case] session_id: &str,
) {
    seed_station(&harness, 1).await;
    scan(&harness, "D1").await;

    let error = harness
        .ledger
        .undo_last_scan(undo("D1", op, session_id))
        .await
        .expect_err("other scope has nothing to undo");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn unknown_code_is_not_found(harness: Harness) {
    seed_station(&harness, 1).await;

    let error = harness
        .ledger
        .capture_scan(capture("D404", "OP1", "S1"))
        .await
        .expect_err("nothing queued under that code");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.details(), Some(&json!({ "code": "D404" })));
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn blank_codes_fail_validation(harness: Harness, #[case] code: &str) {
    let error = harness
        .ledger
        .capture_scan(capture(code, "OP1", "S1"))
        .await
        .expect_err("blank code");

    assert_eq!(error.code(), ErrorCode::ValidationError);
}

#[rstest]
#[tokio::test]
async fn missing_session_uses_the_operator_default(harness: Harness) {
    seed_station(&harness, 1).await;

    let outcome = harness
        .ledger
        .capture_scan(CaptureScanRequest {
            code: "D1".to_owned(),
            operator: operator("OP1"),
            session_id: None,
        })
        .await
        .expect("capture");

    assert_eq!(outcome.session_id.as_str(), "LOAD_20260302_060000_OP1");
}

#[rstest]
#[tokio::test]
async fn printed_barcode_resolves_the_dolly(harness: Harness) {
    let mut item = queue_item("D1", "V1", "EOL1", 1);
    item.barcode = Some("BC-0001".to_owned());
    harness.store.seed_queue([item]).await;

    let outcome = harness
        .ledger
        .capture_scan(capture(" BC-0001 ", "OP1", "S1"))
        .await
        .expect("capture by barcode");

    assert_eq!(outcome.dolly_id.as_str(), "D1");
}

#[rstest]
#[tokio::test]
async fn audit_failures_do_not_fail_the_scan() {
    let store = Arc::new(InMemoryLogisticsStore::new());
    store.seed_queue([queue_item("D1", "V1", "EOL1", 1)]).await;
    let mut audit = MockAuditSink::new();
    audit
        .expect_record()
        .times(1)
        .returning(|_| Err(AuditSinkError::unavailable("sink offline")));
    let ledger = ScanLedger::new(WorkflowPorts::new(store.clone()).with_audit(Arc::new(audit)));

    ledger
        .capture_scan(capture("D1", "OP1", "S1"))
        .await
        .expect("scan still succeeds");

    assert_eq!(store.holds(None).await.expect("holds").len(), 1);
}
