//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::ports::{
    MockCarrierGateway, MockLifecycleQuery, MockLoadingSessionCommand, MockLoadingSessionQuery,
    MockQueueArchiveCommand, MockScanLedgerCommand, MockShipmentCommand,
};
use crate::domain::{HoldId, OperatorId, ScanHold, ScanHoldDraft, SessionId};
use crate::inbound::http::error::{json_error_handler, query_error_handler};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::test_support::{queue_item, shift_start};

/// One mock per driving port; set expectations on the field under test.
#[derive(Default)]
pub struct MockHttpPorts {
    pub scans: MockScanLedgerCommand,
    pub sessions: MockLoadingSessionCommand,
    pub sessions_query: MockLoadingSessionQuery,
    pub shipments: MockShipmentCommand,
    pub queue_archive: MockQueueArchiveCommand,
    pub lifecycle: MockLifecycleQuery,
    pub carrier: MockCarrierGateway,
}

impl MockHttpPorts {
    pub fn into_state(self) -> HttpState {
        HttpState::new(HttpStatePorts {
            scans: Arc::new(self.scans),
            sessions: Arc::new(self.sessions),
            sessions_query: Arc::new(self.sessions_query),
            shipments: Arc::new(self.shipments),
            queue_archive: Arc::new(self.queue_archive),
            lifecycle: Arc::new(self.lifecycle),
            carrier: Arc::new(self.carrier),
        })
    }
}

/// App with the production JSON and query error handlers under `/api/v1`.
pub fn test_app<F>(
    ports: MockHttpPorts,
    register: F,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    F: FnOnce(actix_web::Scope) -> actix_web::Scope,
{
    App::new()
        .app_data(web::Data::new(ports.into_state()))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(register(web::scope("/api/v1")))
}

/// A scanned hold for dolly `dolly` at station `EOL1`.
pub fn scanned_hold(id: i64, dolly: &str, vin: &str) -> ScanHold {
    ScanHold::from_draft(
        HoldId::new(id),
        ScanHoldDraft {
            item: queue_item(dolly, vin, "EOL1", id),
            session_id: SessionId::new("LOAD_20260302_060000_OP1").expect("session"),
            scan_order: 1,
            operator: OperatorId::new("OP1").expect("operator"),
            scanned_at: shift_start(),
            metadata: Default::default(),
        },
    )
}
