//! Builders wiring adapters into the workflow services and HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};

use dolly_backend::domain::ports::{
    CarrierGateway, CarrierTransport, FixtureCarrierTransport, LogisticsStore,
};
use dolly_backend::domain::{
    LifecycleLog, LoadingSessionService, QueueArchiveService, RetryingCarrierGateway, ScanLedger,
    ShipmentService, WorkflowPorts,
};
use dolly_backend::inbound::http::state::{HttpState, HttpStatePorts};
use dolly_backend::outbound::audit::TracingAuditSink;
use dolly_backend::outbound::carrier::SoapCarrierTransport;
use dolly_backend::outbound::memory::InMemoryLogisticsStore;
use dolly_backend::outbound::notifications::BroadcastNotificationSink;
use dolly_backend::outbound::persistence::DieselLogisticsStore;

use super::ServerConfig;

const NOTIFICATION_CAPACITY: usize = 256;

/// Select the Diesel store when a pool is configured, otherwise the in-memory one.
pub fn build_store(config: &ServerConfig) -> Arc<dyn LogisticsStore> {
    match &config.db_pool {
        Some(pool) => Arc::new(DieselLogisticsStore::new(pool.clone())),
        None => {
            warn!("no database configured; using the in-memory logistics store");
            Arc::new(InMemoryLogisticsStore::new())
        }
    }
}

/// Select the SOAP transport when the carrier is enabled with HTTP settings.
fn build_carrier_transport(config: &ServerConfig) -> std::io::Result<Arc<dyn CarrierTransport>> {
    match (&config.carrier_http, config.carrier.enabled) {
        (Some(settings), true) => {
            let transport = SoapCarrierTransport::new(settings.clone()).map_err(|error| {
                std::io::Error::other(format!("carrier client construction failed: {error}"))
            })?;
            info!(endpoint = %settings.endpoint, "carrier transport configured");
            Ok(Arc::new(transport))
        }
        _ => Ok(Arc::new(FixtureCarrierTransport)),
    }
}

/// Build the shared HTTP state over `store`.
///
/// # Errors
/// Returns [`std::io::Error`] when the carrier HTTP client cannot be built.
pub(super) fn build_http_state(
    config: &ServerConfig,
    store: Arc<dyn LogisticsStore>,
) -> std::io::Result<web::Data<HttpState>> {
    let clock = Arc::new(DefaultClock);
    let ports = WorkflowPorts::new(store)
        .with_notifications(Arc::new(BroadcastNotificationSink::new(
            NOTIFICATION_CAPACITY,
        )))
        .with_audit(Arc::new(TracingAuditSink))
        .with_clock(clock.clone());

    let carrier: Arc<dyn CarrierGateway> = Arc::new(RetryingCarrierGateway::new(
        build_carrier_transport(config)?,
        clock,
        config.carrier.clone(),
    ));
    let sessions = Arc::new(LoadingSessionService::new(
        ports.clone(),
        config.station_channels.clone(),
    ));

    Ok(web::Data::new(HttpState::new(HttpStatePorts {
        scans: Arc::new(ScanLedger::new(ports.clone())),
        sessions: sessions.clone(),
        sessions_query: sessions,
        shipments: Arc::new(ShipmentService::new(ports.clone(), carrier.clone())),
        queue_archive: Arc::new(QueueArchiveService::new(ports.clone())),
        lifecycle: Arc::new(LifecycleLog::new(ports)),
        carrier,
    })))
}
