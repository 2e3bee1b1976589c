//! Driving port for capturing and undoing dolly scans.

use async_trait::async_trait;

use crate::domain::{DollyId, Error, OperatorId, ScanHold, SessionId, StationId};

/// Request to capture one scanned barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureScanRequest {
    /// Printed barcode or raw dolly id.
    pub code: String,
    pub operator: OperatorId,
    /// Defaults to `LOAD_{YYYYMMDD_HHMMSS}_{operator}` when absent.
    pub session_id: Option<SessionId>,
}

/// Request to undo the operator's latest scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoScanRequest {
    pub session_id: SessionId,
    pub code: String,
    pub operator: OperatorId,
}

/// Holds touched by a capture or undo, all belonging to one dolly.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub session_id: SessionId,
    pub station: StationId,
    pub dolly_id: DollyId,
    pub scan_order: i32,
    pub order_number: i64,
    pub holds: Vec<ScanHold>,
}

/// Port for the scan ledger use cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScanLedgerCommand: Send + Sync {
    /// Capture a scan after checking station ordering.
    async fn capture_scan(&self, request: CaptureScanRequest) -> Result<ScanOutcome, Error>;

    /// Undo the latest scan of an operator in a session.
    async fn undo_last_scan(&self, request: UndoScanRequest) -> Result<ScanOutcome, Error>;
}
