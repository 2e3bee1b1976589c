//! End-to-end loading and shipment workflow over the HTTP adapter.
//!
//! Drives the real services against the in-memory logistics store with a
//! scripted carrier transport.

use std::sync::Arc;
use std::time::Duration;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use actix_web::{App, web};
use rstest::rstest;
use serde_json::{Value, json};

use dolly_backend::domain::ports::{CarrierGateway, LogisticsStore};
use dolly_backend::domain::{
    BatchId, CarrierGatewayConfig, CarrierGatewayRuntime, DollyId, HoldStatus, LifecycleLog,
    LoadingSessionService, QueueArchiveService, RetryingCarrierGateway, ScanLedger,
    ShipmentService, StationChannels, StationId, TripId, VinId, WorkflowPorts,
};
use dolly_backend::inbound::http::diagnostics::lifecycle_trail;
use dolly_backend::inbound::http::error::{json_error_handler, query_error_handler};
use dolly_backend::inbound::http::scans::{capture_scan, undo_last_scan};
use dolly_backend::inbound::http::sessions::complete_session;
use dolly_backend::inbound::http::shipments::complete_shipment;
use dolly_backend::inbound::http::state::{HttpState, HttpStatePorts};
use dolly_backend::outbound::memory::InMemoryLogisticsStore;
use dolly_backend::test_support::carrier::{
    ImmediateSleeper, MutableClock, NoJitter, ScriptedCarrierTransport,
};
use dolly_backend::test_support::{queue_item, shift_start};

const STATION: &str = "LINE-A";
const TRIP: &str = "SFR20250001";
const PLATE: &str = "34ABC123";

struct Workflow {
    store: Arc<InMemoryLogisticsStore>,
    transport: Arc<ScriptedCarrierTransport>,
    state: HttpState,
}

impl Workflow {
    fn new(transport: ScriptedCarrierTransport) -> Self {
        let store = Arc::new(InMemoryLogisticsStore::new());
        let transport = Arc::new(transport);
        let clock = Arc::new(MutableClock::new(shift_start()));
        let ports = WorkflowPorts::new(store.clone()).with_clock(clock.clone());
        let carrier: Arc<dyn CarrierGateway> = Arc::new(RetryingCarrierGateway::with_runtime(
            transport.clone(),
            clock,
            CarrierGatewayRuntime {
                sleeper: Arc::new(ImmediateSleeper),
                jitter: Arc::new(NoJitter),
            },
            CarrierGatewayConfig {
                initial_backoff: Duration::from_millis(1),
                ..CarrierGatewayConfig::default()
            },
        ));
        let sessions = Arc::new(LoadingSessionService::new(
            ports.clone(),
            StationChannels::default(),
        ));
        let state = HttpState::new(HttpStatePorts {
            scans: Arc::new(ScanLedger::new(ports.clone())),
            sessions: sessions.clone(),
            sessions_query: sessions,
            shipments: Arc::new(ShipmentService::new(ports.clone(), carrier.clone())),
            queue_archive: Arc::new(QueueArchiveService::new(ports.clone())),
            lifecycle: Arc::new(LifecycleLog::new(ports)),
            carrier,
        });
        Self {
            store,
            transport,
            state,
        }
    }

    async fn app(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new(self.state.clone()))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .service(
                    web::scope("/api/v1")
                        .service(capture_scan)
                        .service(undo_last_scan)
                        .service(complete_session)
                        .service(complete_shipment)
                        .service(lifecycle_trail),
                ),
        )
        .await
    }

    /// Queue `dollies` dollies on the station, `vins` VINs each, order numbers from 1.
    async fn seed(&self, dollies: i64, vins: usize) {
        let items = (1..=dollies).flat_map(|order| {
            (0..vins).map(move |vin| {
                queue_item(&format!("D{order}"), &format!("V{order}-{vin}"), STATION, order)
            })
        });
        self.store.seed_queue(items).await;
    }

    async fn queued_dollies(&self) -> Vec<String> {
        let station = StationId::new(STATION).expect("station");
        let mut dollies: Vec<_> = self
            .store
            .queue_items(Some(station))
            .await
            .expect("queue")
            .into_iter()
            .map(|item| item.dolly_id.to_string())
            .collect();
        dollies.dedup();
        dollies
    }
}

async fn call<S>(app: &S, request: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(app, request).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

fn scan(code: &str, session: Option<&str>) -> Request {
    actix_test::TestRequest::post()
        .uri("/api/v1/scans")
        .set_json(json!({ "code": code, "operatorId": "FORK1", "sessionId": session }))
        .to_request()
}

fn undo(code: &str, session: &str) -> Request {
    actix_test::TestRequest::post()
        .uri("/api/v1/scans/undo")
        .set_json(json!({ "code": code, "operatorId": "FORK1", "sessionId": session }))
        .to_request()
}

fn complete(session: &str) -> Request {
    actix_test::TestRequest::post()
        .uri(&format!("/api/v1/sessions/{session}/complete"))
        .set_json(json!({ "operatorId": "FORK1" }))
        .to_request()
}

fn ship(batch: &str, trip: &str) -> Request {
    actix_test::TestRequest::post()
        .uri(&format!("/api/v1/batches/{batch}/shipments"))
        .set_json(json!({
            "tripId": trip,
            "plateId": PLATE,
            "channel": "both",
            "operatorId": "OFFICE1",
        }))
        .to_request()
}

fn text(body: &Value, key: &str) -> String {
    body[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing {key} in {body}"))
        .to_owned()
}

/// Scan three two-VIN dollies and close the session, returning the batch id.
async fn loaded_batch<S>(app: &S) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, first) = call(app, scan("D1", None)).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    let session = text(&first, "sessionId");
    for code in ["D2", "D3"] {
        let (status, body) = call(app, scan(code, Some(&session))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    let (status, completion) = call(app, complete(&session)).await;
    assert_eq!(status, StatusCode::OK, "{completion}");
    assert_eq!(completion["itemCount"], 6);
    text(&completion, "batchId")
}

#[rstest]
#[actix_web::test]
async fn out_of_order_scan_names_the_expected_order() {
    let workflow = Workflow::new(ScriptedCarrierTransport::accepting());
    workflow.seed(5, 1).await;
    let app = workflow.app().await;

    let (status, first) = call(&app, scan("D1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["scanOrder"], 1);
    let session = text(&first, "sessionId");

    let (status, rejected) = call(&app, scan("D3", Some(&session))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(rejected["code"], "ordering_violation");
    assert_eq!(rejected["details"]["expectedOrder"], 2);
    assert_eq!(workflow.queued_dollies().await, ["D2", "D3", "D4", "D5"]);
}

#[rstest]
#[actix_web::test]
async fn undo_returns_the_dolly_to_the_queue() {
    let workflow = Workflow::new(ScriptedCarrierTransport::accepting());
    workflow.seed(5, 1).await;
    let app = workflow.app().await;

    let (_, first) = call(&app, scan("D1", None)).await;
    let session = text(&first, "sessionId");

    let (status, undone) = call(&app, undo("D1", &session)).await;
    assert_eq!(status, StatusCode::OK, "{undone}");
    assert_eq!(workflow.queued_dollies().await, ["D1", "D2", "D3", "D4", "D5"]);

    let (status, rescanned) = call(&app, scan("D1", Some(&session))).await;
    assert_eq!(status, StatusCode::OK, "{rescanned}");
    assert_eq!(rescanned["dollyId"], "D1");
}

#[rstest]
#[actix_web::test]
async fn undo_of_an_earlier_scan_is_refused() {
    let workflow = Workflow::new(ScriptedCarrierTransport::accepting());
    workflow.seed(3, 1).await;
    let app = workflow.app().await;

    let (_, first) = call(&app, scan("D1", None)).await;
    let session = text(&first, "sessionId");
    let (status, _) = call(&app, scan("D2", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, refused) = call(&app, undo("D1", &session)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(refused["code"], "not_last_scanned");
    assert_eq!(workflow.queued_dollies().await, ["D3"]);
}

#[rstest]
#[actix_web::test]
async fn accepted_shipment_moves_every_item_to_the_ledger() {
    let workflow = Workflow::new(ScriptedCarrierTransport::accepting());
    workflow.seed(3, 2).await;
    let app = workflow.app().await;
    let batch = loaded_batch(&app).await;

    let (status, shipped) = call(&app, ship(&batch, TRIP)).await;
    assert_eq!(status, StatusCode::OK, "{shipped}");
    assert_eq!(shipped["itemCount"], 6);

    let trip = TripId::new(TRIP).expect("trip");
    let records = workflow.store.shipment_records(&trip).await.expect("records");
    assert_eq!(records.len(), 6);
    let batch_id = BatchId::new(&batch).expect("batch");
    assert!(workflow.store.batch_holds(&batch_id).await.expect("holds").is_empty());
    assert!(workflow.queued_dollies().await.is_empty());

    let submissions = workflow.transport.submissions();
    assert_eq!(submissions.len(), 1);
    let dollies: Vec<_> = submissions[0]
        .items
        .iter()
        .map(|item| item.dolly_id.to_string())
        .collect();
    assert_eq!(dollies, ["D1", "D1", "D2", "D2", "D3", "D3"]);
}

#[rstest]
#[actix_web::test]
async fn reused_trip_is_refused_before_the_carrier() {
    let workflow = Workflow::new(ScriptedCarrierTransport::accepting());
    workflow.seed(3, 2).await;
    let app = workflow.app().await;
    let batch = loaded_batch(&app).await;
    let (status, _) = call(&app, ship(&batch, TRIP)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, refused) = call(&app, ship(&batch, TRIP)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(refused["code"], "duplicate_trip");
    assert_eq!(workflow.transport.calls(), 1);
}

#[rstest]
#[actix_web::test]
async fn carrier_refusal_leaves_the_batch_untouched() {
    let workflow = Workflow::new(ScriptedCarrierTransport::rejecting("invalid waybill"));
    workflow.seed(3, 2).await;
    let app = workflow.app().await;
    let batch = loaded_batch(&app).await;

    let (status, refused) = call(&app, ship(&batch, TRIP)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(refused["code"], "carrier_rejected");
    assert_eq!(refused["message"], "invalid waybill");
    assert_eq!(refused["retryable"], false);

    let trip = TripId::new(TRIP).expect("trip");
    assert!(workflow.store.shipment_records(&trip).await.expect("records").is_empty());
    let batch_id = BatchId::new(&batch).expect("batch");
    let statuses: Vec<_> = workflow
        .store
        .batch_holds(&batch_id)
        .await
        .expect("holds")
        .into_iter()
        .map(|hold| hold.status)
        .collect();
    assert_eq!(statuses, vec![HoldStatus::LoadingCompleted; 6]);
}

#[rstest]
#[actix_web::test]
async fn every_pair_sits_in_exactly_one_place() {
    let workflow = Workflow::new(ScriptedCarrierTransport::accepting());
    workflow.seed(4, 2).await;
    let app = workflow.app().await;
    let batch = loaded_batch(&app).await;
    let (status, _) = call(&app, ship(&batch, TRIP)).await;
    assert_eq!(status, StatusCode::OK);

    let queued = workflow.store.queue_items(None).await.expect("queue");
    let active = workflow.store.holds(None).await.expect("holds");
    let trip = TripId::new(TRIP).expect("trip");
    let shipped = workflow.store.shipment_records(&trip).await.expect("records");

    for order in 1..=4 {
        for vin in 0..2 {
            let dolly = DollyId::new(format!("D{order}")).expect("dolly");
            let vin = VinId::new(format!("V{order}-{vin}")).expect("vin");
            let places = usize::from(
                queued
                    .iter()
                    .any(|item| item.dolly_id == dolly && item.vin_id == vin),
            ) + usize::from(
                active
                    .iter()
                    .any(|hold| {
                        hold.status.is_active() && *hold.dolly_id() == dolly && *hold.vin_id() == vin
                    }),
            ) + usize::from(
                shipped
                    .iter()
                    .any(|record| record.dolly_id == dolly && record.vin_id == vin),
            );
            assert_eq!(places, 1, "{dolly}/{vin} found in {places} places");
        }
    }

    let (status, trail) = call(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/dollies/D1/lifecycle")
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let labels: Vec<_> = trail
        .as_array()
        .expect("trail array")
        .iter()
        .filter_map(|event| event["status"].as_str())
        .collect();
    assert!(labels.contains(&"SCAN_CAPTURED"));
    assert!(labels.contains(&"COMPLETED_BOTH"));
}
