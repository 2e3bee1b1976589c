//! Tests for batch and shipment HTTP handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::BatchDetails;
use crate::domain::{PlateId, TripId};
use crate::inbound::http::test_utils::{MockHttpPorts, scanned_hold, test_app};

const BATCH: &str = "PT202603020001";

fn batch_id() -> BatchId {
    BatchId::new(BATCH).expect("batch")
}

fn batch() -> BatchDetails {
    BatchDetails {
        batch_id: batch_id(),
        channel: ConfirmationChannel::Both,
        task_status: TaskStatus::Pending,
        total_items: 2,
        processed_items: 0,
        holds: vec![scanned_hold(1, "D1", "V1"), scanned_hold(2, "D1", "V2")],
    }
}

#[fixture]
fn shipment_body() -> Value {
    json!({
        "tripId": "sfr20250001",
        "plateId": "34ABC123",
        "channel": "asn",
        "operatorId": "OFFICE1",
        "selectedHoldIds": [2],
    })
}

async fn post_shipment(ports: MockHttpPorts, body: Value) -> (StatusCode, Value) {
    let app =
        actix_test::init_service(test_app(ports, |scope| scope.service(complete_shipment))).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/batches/{BATCH}/shipments"))
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

#[rstest]
#[actix_web::test]
async fn pending_shipments_lists_batches() {
    let mut ports = MockHttpPorts::default();
    ports
        .sessions_query
        .expect_pending_shipments()
        .return_once(|| Ok(vec![batch()]));
    let app =
        actix_test::init_service(test_app(ports, |scope| scope.service(pending_shipments))).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/shipments/pending")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body[0]["batchId"], BATCH);
    assert_eq!(body[0]["taskStatus"], "pending");
    assert_eq!(body[0]["holds"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[case("PT202603020001", StatusCode::NOT_FOUND)]
#[case("BATCH-1", StatusCode::BAD_REQUEST)]
#[actix_web::test]
async fn batch_details_maps_lookup_failures(#[case] raw: &str, #[case] expected: StatusCode) {
    let mut ports = MockHttpPorts::default();
    ports
        .sessions_query
        .expect_batch_details()
        .returning(|batch| Err(Error::not_found(format!("batch {batch} not found"))));
    let app =
        actix_test::init_service(test_app(ports, |scope| scope.service(batch_details))).await;

    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/batches/{raw}"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), expected);
}

#[rstest]
#[actix_web::test]
async fn complete_shipment_forwards_the_selection(shipment_body: Value) {
    let mut ports = MockHttpPorts::default();
    ports
        .shipments
        .expect_complete_shipment()
        .withf(|request| {
            request.batch_id == batch_id()
                && request.channel == ConfirmationChannel::Asn
                && request.selected_hold_ids == Some(vec![HoldId::new(2)])
                && request.waybill_number.is_none()
        })
        .times(1)
        .return_once(|request| {
            Ok(ShipmentSummary {
                batch_id: request.batch_id,
                trip_id: TripId::new(&request.trip_id).expect("trip"),
                plate_id: PlateId::new(&request.plate_id).expect("plate"),
                channel: request.channel,
                item_count: 1,
                carrier_message: "1 items accepted".to_owned(),
                carrier_attempts: 1,
                task_status: Some(TaskStatus::Partial),
            })
        });

    let (status, body) = post_shipment(ports, shipment_body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tripId"], "SFR20250001");
    assert_eq!(body["taskStatus"], "partial");
    assert_eq!(body["carrierAttempts"], 1);
}

#[rstest]
#[case(Error::carrier_rejected("trip refused"), StatusCode::UNPROCESSABLE_ENTITY)]
#[case(Error::carrier_unreachable("timed out"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::duplicate_trip("trip already used"), StatusCode::CONFLICT)]
#[actix_web::test]
async fn carrier_and_trip_failures_map_to_statuses(
    shipment_body: Value,
    #[case] error: Error,
    #[case] expected: StatusCode,
) {
    let code = error.code();
    let mut ports = MockHttpPorts::default();
    ports
        .shipments
        .expect_complete_shipment()
        .return_once(move |_| Err(error));

    let (status, body) = post_shipment(ports, shipment_body).await;

    assert_eq!(status, expected);
    assert_eq!(body["code"], json!(code));
}

#[rstest]
#[actix_web::test]
async fn unknown_channel_is_rejected_before_the_service(mut shipment_body: Value) {
    shipment_body["channel"] = json!("fax");
    let mut ports = MockHttpPorts::default();
    ports.shipments.expect_complete_shipment().never();

    let (status, body) = post_shipment(ports, shipment_body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "channel");
}
