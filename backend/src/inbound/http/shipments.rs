//! Batch and shipment handlers used by the data-entry office.
//!
//! ```text
//! GET  /api/v1/shipments/pending
//! GET  /api/v1/batches/{batchId}
//! POST /api/v1/batches/{batchId}/shipments
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CompleteShipmentRequest, ShipmentSummary};
use crate::domain::{ApiResult, BatchId, ConfirmationChannel, Error, HoldId, TaskStatus};
use crate::inbound::http::dto::BatchBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_identifier, parse_label};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchPath {
    batch_id: String,
}

impl BatchPath {
    fn parse(self) -> Result<BatchId, Error> {
        parse_identifier(self.batch_id, FieldName::new("batchId"))
    }
}

/// Request payload for shipping a batch on one trip.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteShipmentBody {
    #[schema(example = "SFR20250001")]
    pub trip_id: String,
    #[schema(example = "34ABC123")]
    pub plate_id: String,
    /// `asn`, `waybill`, or `both`.
    #[schema(example = "both")]
    pub channel: String,
    pub operator_id: String,
    /// Ship only these holds; the whole batch when omitted.
    pub selected_hold_ids: Option<Vec<i64>>,
    /// Defaults to the trip id.
    pub waybill_number: Option<String>,
    /// Defaults to `TRC-00`.
    pub reason_code: Option<String>,
}

/// Confirmed shipment.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentSummaryBody {
    pub batch_id: String,
    pub trip_id: String,
    pub plate_id: String,
    pub channel: ConfirmationChannel,
    pub item_count: usize,
    pub carrier_message: String,
    pub carrier_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_status: Option<TaskStatus>,
}

impl From<ShipmentSummary> for ShipmentSummaryBody {
    fn from(value: ShipmentSummary) -> Self {
        Self {
            batch_id: value.batch_id.to_string(),
            trip_id: value.trip_id.to_string(),
            plate_id: value.plate_id.to_string(),
            channel: value.channel,
            item_count: value.item_count,
            carrier_message: value.carrier_message,
            carrier_attempts: value.carrier_attempts,
            task_status: value.task_status,
        }
    }
}

fn parse_shipment(batch_id: BatchId, body: CompleteShipmentBody) -> Result<CompleteShipmentRequest, Error> {
    Ok(CompleteShipmentRequest {
        batch_id,
        trip_id: body.trip_id,
        plate_id: body.plate_id,
        channel: parse_label(&body.channel, FieldName::new("channel"))?,
        operator: parse_identifier(body.operator_id, FieldName::new("operatorId"))?,
        selected_hold_ids: body
            .selected_hold_ids
            .map(|ids| ids.into_iter().map(HoldId::new).collect()),
        waybill_number: body.waybill_number,
        reason_code: body.reason_code,
    })
}

/// Batches with holds still waiting for shipment.
#[utoipa::path(
    get,
    path = "/api/v1/shipments/pending",
    responses(
        (status = 200, description = "Pending batches", body = [BatchBody]),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["shipments"],
    operation_id = "pendingShipments"
)]
#[get("/shipments/pending")]
pub async fn pending_shipments(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<BatchBody>>> {
    let batches = state.sessions_query.pending_shipments().await?;
    Ok(web::Json(batches.into_iter().map(BatchBody::from).collect()))
}

/// One batch with its shippable holds.
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batchId}",
    params(("batchId" = String, Path, description = "Batch identifier")),
    responses(
        (status = 200, description = "Batch details", body = BatchBody),
        (status = 400, description = "Malformed batch id", body = Error),
        (status = 404, description = "Unknown batch", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["shipments"],
    operation_id = "batchDetails"
)]
#[get("/batches/{batchId}")]
pub async fn batch_details(
    state: web::Data<HttpState>,
    path: web::Path<BatchPath>,
) -> ApiResult<web::Json<BatchBody>> {
    let batch_id = path.into_inner().parse()?;
    let batch = state.sessions_query.batch_details(batch_id).await?;
    Ok(web::Json(BatchBody::from(batch)))
}

/// Confirm a trip with the carrier and record the shipment atomically.
#[utoipa::path(
    post,
    path = "/api/v1/batches/{batchId}/shipments",
    params(("batchId" = String, Path, description = "Batch identifier")),
    request_body = CompleteShipmentBody,
    responses(
        (status = 200, description = "Shipment confirmed", body = ShipmentSummaryBody),
        (status = 400, description = "Invalid trip, plate, or selection", body = Error),
        (status = 404, description = "Unknown batch", body = Error),
        (status = 409, description = "Trip already used", body = Error),
        (status = 422, description = "Carrier refused the trip", body = Error),
        (status = 503, description = "Carrier unreachable", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["shipments"],
    operation_id = "completeShipment"
)]
#[post("/batches/{batchId}/shipments")]
pub async fn complete_shipment(
    state: web::Data<HttpState>,
    path: web::Path<BatchPath>,
    payload: web::Json<CompleteShipmentBody>,
) -> ApiResult<web::Json<ShipmentSummaryBody>> {
    let batch_id = path.into_inner().parse()?;
    let request = parse_shipment(batch_id, payload.into_inner())?;
    let summary = state.shipments.complete_shipment(request).await?;
    Ok(web::Json(ShipmentSummaryBody::from(summary)))
}

#[cfg(test)]
#[path = "shipments_tests.rs"]
mod tests;
