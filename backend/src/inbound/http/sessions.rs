//! Loading session handlers.
//!
//! ```text
//! POST /api/v1/sessions/{sessionId}/complete
//! GET  /api/v1/sessions?status=
//! ```

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CompleteSessionRequest, SessionCompletion, SessionSummary};
use crate::domain::{ApiResult, ConfirmationChannel, Error, HoldStatus};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_identifier, parse_label};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPath {
    session_id: String,
}

/// Request payload for closing a loading session.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionBody {
    pub operator_id: String,
}

/// Batch assigned to a closed session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCompletionBody {
    pub session_id: String,
    #[schema(example = "PT202603020001")]
    pub batch_id: String,
    pub item_count: usize,
    pub channel: ConfirmationChannel,
}

impl From<SessionCompletion> for SessionCompletionBody {
    fn from(value: SessionCompletion) -> Self {
        Self {
            session_id: value.session_id.to_string(),
            batch_id: value.batch_id.to_string(),
            item_count: value.item_count,
            channel: value.channel,
        }
    }
}

/// Session filter.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSessionsQuery {
    /// Hold status to filter by; removed holds are hidden when omitted.
    pub status: Option<String>,
}

/// One (session, status, operator) group.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryBody {
    pub session_id: String,
    pub status: HoldStatus,
    pub operator_id: String,
    pub item_count: usize,
    pub first_scan_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl From<SessionSummary> for SessionSummaryBody {
    fn from(value: SessionSummary) -> Self {
        Self {
            session_id: value.session_id.to_string(),
            status: value.status,
            operator_id: value.operator.to_string(),
            item_count: value.item_count,
            first_scan_at: value.first_scan_at,
            loading_completed_at: value.loading_completed_at,
            batch_id: value.batch_id.map(String::from),
        }
    }
}

/// Close a loading session and assign its batch.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/complete",
    params(("sessionId" = String, Path, description = "Loading session identifier")),
    request_body = CompleteSessionBody,
    responses(
        (status = 200, description = "Session closed", body = SessionCompletionBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Session has no scanned holds", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "completeSession"
)]
#[post("/sessions/{sessionId}/complete")]
pub async fn complete_session(
    state: web::Data<HttpState>,
    path: web::Path<SessionPath>,
    payload: web::Json<CompleteSessionBody>,
) -> ApiResult<web::Json<SessionCompletionBody>> {
    let request = CompleteSessionRequest {
        session_id: parse_identifier(path.into_inner().session_id, FieldName::new("sessionId"))?,
        operator: parse_identifier(payload.into_inner().operator_id, FieldName::new("operatorId"))?,
    };
    let completion = state.sessions.complete_session(request).await?;
    Ok(web::Json(SessionCompletionBody::from(completion)))
}

/// List loading sessions, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    params(ListSessionsQuery),
    responses(
        (status = 200, description = "Session groups", body = [SessionSummaryBody]),
        (status = 400, description = "Unknown status", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "listSessions"
)]
#[get("/sessions")]
pub async fn list_sessions(
    state: web::Data<HttpState>,
    query: web::Query<ListSessionsQuery>,
) -> ApiResult<web::Json<Vec<SessionSummaryBody>>> {
    let status = query
        .into_inner()
        .status
        .map(|raw| parse_label::<HoldStatus>(&raw, FieldName::new("status")))
        .transpose()?;
    let sessions = state.sessions_query.list_sessions(status).await?;
    Ok(web::Json(
        sessions.into_iter().map(SessionSummaryBody::from).collect(),
    ))
}
