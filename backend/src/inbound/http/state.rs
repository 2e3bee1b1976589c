//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CarrierGateway, LifecycleQuery, LoadingSessionCommand, LoadingSessionQuery,
    QueueArchiveCommand, ScanLedgerCommand, ShipmentCommand,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub scans: Arc<dyn ScanLedgerCommand>,
    pub sessions: Arc<dyn LoadingSessionCommand>,
    pub sessions_query: Arc<dyn LoadingSessionQuery>,
    pub shipments: Arc<dyn ShipmentCommand>,
    pub queue_archive: Arc<dyn QueueArchiveCommand>,
    pub lifecycle: Arc<dyn LifecycleQuery>,
    pub carrier: Arc<dyn CarrierGateway>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use dolly_backend::domain::ports::{CarrierGateway, FixtureCarrierTransport};
    /// use dolly_backend::domain::{
    ///     CarrierGatewayConfig, LifecycleLog, LoadingSessionService, QueueArchiveService,
    ///     RetryingCarrierGateway, ScanLedger, ShipmentService, StationChannels, WorkflowPorts,
    /// };
    /// use dolly_backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use dolly_backend::outbound::memory::InMemoryLogisticsStore;
    /// use mockable::DefaultClock;
    ///
    /// let ports = WorkflowPorts::new(Arc::new(InMemoryLogisticsStore::new()));
    /// let carrier: Arc<dyn CarrierGateway> = Arc::new(RetryingCarrierGateway::new(
    ///     Arc::new(FixtureCarrierTransport),
    ///     Arc::new(DefaultClock),
    ///     CarrierGatewayConfig::default(),
    /// ));
    /// let sessions = Arc::new(LoadingSessionService::new(
    ///     ports.clone(),
    ///     StationChannels::default(),
    /// ));
    /// let state = HttpState::new(HttpStatePorts {
    ///     scans: Arc::new(ScanLedger::new(ports.clone())),
    ///     sessions: sessions.clone(),
    ///     sessions_query: sessions,
    ///     shipments: Arc::new(ShipmentService::new(ports.clone(), carrier.clone())),
    ///     queue_archive: Arc::new(QueueArchiveService::new(ports.clone())),
    ///     lifecycle: Arc::new(LifecycleLog::new(ports)),
    ///     carrier,
    /// });
    /// let _scans = state.scans.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            scans,
            sessions,
            sessions_query,
            shipments,
            queue_archive,
            lifecycle,
            carrier,
        } = ports;
        Self {
            scans,
            sessions,
            sessions_query,
            shipments,
            queue_archive,
            lifecycle,
            carrier,
        }
    }
}

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub scans: Arc<dyn ScanLedgerCommand>,
    pub sessions: Arc<dyn LoadingSessionCommand>,
    pub sessions_query: Arc<dyn LoadingSessionQuery>,
    pub shipments: Arc<dyn ShipmentCommand>,
    pub queue_archive: Arc<dyn QueueArchiveCommand>,
    pub lifecycle: Arc<dyn LifecycleQuery>,
    pub carrier: Arc<dyn CarrierGateway>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
