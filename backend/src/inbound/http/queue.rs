//! Supervisor queue archive handlers.
//!
//! ```text
//! POST /api/v1/queue/removals
//! GET  /api/v1/queue/removals
//! POST /api/v1/queue/restorations
//! ```

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    ArchiveOutcome, ItemFailure, RemoveFromQueueRequest, RestoreFromArchiveRequest,
};
use crate::domain::{ApiResult, Error, RemovedQueueItem};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_identifier, require_non_empty};

/// One (dolly, VIN) pair to archive.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueuePairBody {
    pub dolly_id: String,
    pub vin_id: String,
}

/// Request payload for removing queue items.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromQueueBody {
    pub items: Vec<QueuePairBody>,
    pub removed_by: String,
    pub reason: Option<String>,
}

/// Request payload for restoring archived items.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreFromArchiveBody {
    pub archive_ids: Vec<i64>,
    pub restored_by: String,
}

/// Entry skipped by a bulk operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailureBody {
    pub item: String,
    pub reason: String,
}

/// Outcome of a bulk archive operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcomeBody {
    pub succeeded: usize,
    pub failed: Vec<ItemFailureBody>,
}

impl From<ArchiveOutcome> for ArchiveOutcomeBody {
    fn from(value: ArchiveOutcome) -> Self {
        Self {
            succeeded: value.succeeded,
            failed: value
                .failed
                .into_iter()
                .map(|ItemFailure { item, reason }| ItemFailureBody { item, reason })
                .collect(),
        }
    }
}

/// An archived queue row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovedItemBody {
    pub archive_id: i64,
    pub dolly_id: String,
    pub vin_id: String,
    pub station: String,
    pub order_number: i64,
    pub customer_reference: String,
    pub removed_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub removed_at: DateTime<Utc>,
}

impl From<RemovedQueueItem> for RemovedItemBody {
    fn from(value: RemovedQueueItem) -> Self {
        Self {
            archive_id: value.archive_id,
            dolly_id: value.item.dolly_id.to_string(),
            vin_id: value.item.vin_id.to_string(),
            station: value.item.station.to_string(),
            order_number: value.item.order_number,
            customer_reference: value.item.customer_reference,
            removed_by: value.removed_by.to_string(),
            reason: value.reason,
            removed_at: value.removed_at,
        }
    }
}

fn parse_removal(body: RemoveFromQueueBody) -> Result<RemoveFromQueueRequest, Error> {
    require_non_empty(&body.items, FieldName::new("items"))?;
    let items = body
        .items
        .into_iter()
        .map(|pair| {
            Ok((
                parse_identifier(pair.dolly_id, FieldName::new("dollyId"))?,
                parse_identifier(pair.vin_id, FieldName::new("vinId"))?,
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(RemoveFromQueueRequest {
        items,
        removed_by: parse_identifier(body.removed_by, FieldName::new("removedBy"))?,
        reason: body.reason.filter(|reason| !reason.trim().is_empty()),
    })
}

/// Archive queue items; missing pairs are reported per item.
#[utoipa::path(
    post,
    path = "/api/v1/queue/removals",
    request_body = RemoveFromQueueBody,
    responses(
        (status = 200, description = "Items archived", body = ArchiveOutcomeBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["queue"],
    operation_id = "removeFromQueue"
)]
#[post("/queue/removals")]
pub async fn remove_from_queue(
    state: web::Data<HttpState>,
    payload: web::Json<RemoveFromQueueBody>,
) -> ApiResult<web::Json<ArchiveOutcomeBody>> {
    let request = parse_removal(payload.into_inner())?;
    let outcome = state.queue_archive.remove_from_queue(request).await?;
    Ok(web::Json(ArchiveOutcomeBody::from(outcome)))
}

/// Archived queue items, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/queue/removals",
    responses(
        (status = 200, description = "Archived items", body = [RemovedItemBody]),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["queue"],
    operation_id = "listRemoved"
)]
#[get("/queue/removals")]
pub async fn list_removed(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<RemovedItemBody>>> {
    let removed = state.queue_archive.list_removed().await?;
    Ok(web::Json(removed.into_iter().map(RemovedItemBody::from).collect()))
}

/// Put archived items back into the queue.
#[utoipa::path(
    post,
    path = "/api/v1/queue/restorations",
    request_body = RestoreFromArchiveBody,
    responses(
        (status = 200, description = "Items restored", body = ArchiveOutcomeBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["queue"],
    operation_id = "restoreFromQueueArchive"
)]
#[post("/queue/restorations")]
pub async fn restore_from_archive(
    state: web::Data<HttpState>,
    payload: web::Json<RestoreFromArchiveBody>,
) -> ApiResult<web::Json<ArchiveOutcomeBody>> {
    let body = payload.into_inner();
    require_non_empty(&body.archive_ids, FieldName::new("archiveIds"))?;
    let request = RestoreFromArchiveRequest {
        archive_ids: body.archive_ids,
        restored_by: parse_identifier(body.restored_by, FieldName::new("restoredBy"))?,
    };
    let outcome = state.queue_archive.restore_from_archive(request).await?;
    Ok(web::Json(ArchiveOutcomeBody::from(outcome)))
}
