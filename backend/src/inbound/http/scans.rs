//! Scan capture and undo handlers used by forklift scanners.
//!
//! ```text
//! POST /api/v1/scans
//! POST /api/v1/scans/undo
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CaptureScanRequest, ScanOutcome, UndoScanRequest};
use crate::domain::{ApiResult, Error};
use crate::inbound::http::dto::HoldBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_identifier, parse_optional_identifier};

/// Request payload for capturing a scan.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScanBody {
    /// Printed barcode or raw dolly id.
    #[schema(example = "D-1042")]
    pub code: String,
    pub operator_id: String,
    /// Omit to open a new `LOAD_{timestamp}_{operator}` session.
    pub session_id: Option<String>,
}

/// Request payload for undoing the latest scan.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UndoScanBody {
    pub session_id: String,
    pub code: String,
    pub operator_id: String,
}

/// Holds created or removed by a scan operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponseBody {
    pub session_id: String,
    pub station: String,
    pub dolly_id: String,
    pub scan_order: i32,
    pub order_number: i64,
    pub holds: Vec<HoldBody>,
}

impl From<ScanOutcome> for ScanResponseBody {
    fn from(outcome: ScanOutcome) -> Self {
        Self {
            session_id: outcome.session_id.to_string(),
            station: outcome.station.to_string(),
            dolly_id: outcome.dolly_id.to_string(),
            scan_order: outcome.scan_order,
            order_number: outcome.order_number,
            holds: outcome.holds.into_iter().map(HoldBody::from).collect(),
        }
    }
}

fn parse_capture(body: CaptureScanBody) -> Result<CaptureScanRequest, Error> {
    Ok(CaptureScanRequest {
        code: body.code,
        operator: parse_identifier(body.operator_id, FieldName::new("operatorId"))?,
        session_id: parse_optional_identifier(body.session_id, FieldName::new("sessionId"))?,
    })
}

fn parse_undo(body: UndoScanBody) -> Result<UndoScanRequest, Error> {
    Ok(UndoScanRequest {
        session_id: parse_identifier(body.session_id, FieldName::new("sessionId"))?,
        code: body.code,
        operator: parse_identifier(body.operator_id, FieldName::new("operatorId"))?,
    })
}

/// Capture a scanned dolly, enforcing station order.
#[utoipa::path(
    post,
    path = "/api/v1/scans",
    request_body = CaptureScanBody,
    responses(
        (status = 200, description = "Scan captured", body = ScanResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Barcode does not resolve to a queued dolly", body = Error),
        (status = 409, description = "Dolly scanned out of order", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["scans"],
    operation_id = "captureScan"
)]
#[post("/scans")]
pub async fn capture_scan(
    state: web::Data<HttpState>,
    payload: web::Json<CaptureScanBody>,
) -> ApiResult<web::Json<ScanResponseBody>> {
    let request = parse_capture(payload.into_inner())?;
    let outcome = state.scans.capture_scan(request).await?;
    Ok(web::Json(ScanResponseBody::from(outcome)))
}

/// Undo the operator's latest scan and return the dolly to the queue.
#[utoipa::path(
    post,
    path = "/api/v1/scans/undo",
    request_body = UndoScanBody,
    responses(
        (status = 200, description = "Scan undone", body = ScanResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "No scanned hold matches", body = Error),
        (status = 409, description = "Not the latest scan", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["scans"],
    operation_id = "undoLastScan"
)]
#[post("/scans/undo")]
pub async fn undo_last_scan(
    state: web::Data<HttpState>,
    payload: web::Json<UndoScanBody>,
) -> ApiResult<web::Json<ScanResponseBody>> {
    let request = parse_undo(payload.into_inner())?;
    let outcome = state.scans.undo_last_scan(request).await?;
    Ok(web::Json(ScanResponseBody::from(outcome)))
}

#[cfg(test)]
#[path = "scans_tests.rs"]
mod tests;
