//! Read-only diagnostics: a dolly's lifecycle trail and the carrier probe.
//!
//! ```text
//! GET /api/v1/dollies/{dollyId}/lifecycle
//! GET /api/v1/carrier/probe
//! ```

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CarrierGatewayError, CarrierProbe};
use crate::domain::{ApiResult, Error, LifecycleEvent, LifecycleSource, LifecycleStatus, Metadata};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_identifier};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DollyPath {
    dolly_id: String,
}

/// One lifecycle transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEventBody {
    pub dolly_id: String,
    pub vin_id: String,
    pub status: LifecycleStatus,
    pub source: LifecycleSource,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    pub recorded_at: DateTime<Utc>,
}

impl From<LifecycleEvent> for LifecycleEventBody {
    fn from(value: LifecycleEvent) -> Self {
        Self {
            dolly_id: value.dolly_id.to_string(),
            vin_id: value.vin_id.to_string(),
            status: value.status,
            source: value.source,
            metadata: value.metadata,
            recorded_at: value.recorded_at,
        }
    }
}

/// Carrier connectivity report.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarrierProbeBody {
    pub enabled: bool,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub environment: String,
    pub message: String,
}

impl From<CarrierProbe> for CarrierProbeBody {
    fn from(value: CarrierProbe) -> Self {
        Self {
            enabled: value.enabled,
            reachable: value.reachable,
            status: value.status,
            environment: value.environment,
            message: value.message,
        }
    }
}

fn map_probe_error(error: CarrierGatewayError) -> Error {
    match error {
        CarrierGatewayError::Unreachable { .. } => Error::carrier_unreachable(error.to_string()),
        CarrierGatewayError::Internal { .. } => Error::system(error.to_string()),
    }
}

/// Every recorded lifecycle event of a dolly, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/dollies/{dollyId}/lifecycle",
    params(("dollyId" = String, Path, description = "Dolly identifier")),
    responses(
        (status = 200, description = "Lifecycle trail", body = [LifecycleEventBody]),
        (status = 400, description = "Invalid dolly id", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["diagnostics"],
    operation_id = "lifecycleTrail"
)]
#[get("/dollies/{dollyId}/lifecycle")]
pub async fn lifecycle_trail(
    state: web::Data<HttpState>,
    path: web::Path<DollyPath>,
) -> ApiResult<web::Json<Vec<LifecycleEventBody>>> {
    let dolly = parse_identifier(path.into_inner().dolly_id, FieldName::new("dollyId"))?;
    let trail = state.lifecycle.trail(dolly).await?;
    Ok(web::Json(
        trail.into_iter().map(LifecycleEventBody::from).collect(),
    ))
}

/// Check whether the carrier endpoint answers.
#[utoipa::path(
    get,
    path = "/api/v1/carrier/probe",
    responses(
        (status = 200, description = "Probe result", body = CarrierProbeBody),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["diagnostics"],
    operation_id = "carrierProbe"
)]
#[get("/carrier/probe")]
pub async fn carrier_probe(state: web::Data<HttpState>) -> ApiResult<web::Json<CarrierProbeBody>> {
    let probe = state.carrier.probe().await.map_err(map_probe_error)?;
    Ok(web::Json(CarrierProbeBody::from(probe)))
}
