//! Tests for scan HTTP handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use mockall::predicate::always;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::{DollyId, StationId};
use crate::inbound::http::test_utils::{MockHttpPorts, scanned_hold, test_app};

fn outcome() -> ScanOutcome {
    ScanOutcome {
        session_id: crate::domain::SessionId::new("LOAD_20260302_060000_OP1").expect("session"),
        station: StationId::new("EOL1").expect("station"),
        dolly_id: DollyId::new("D1").expect("dolly"),
        scan_order: 1,
        order_number: 1,
        holds: vec![scanned_hold(7, "D1", "V1")],
    }
}

#[rstest]
#[actix_web::test]
async fn capture_scan_returns_created_holds() {
    let mut ports = MockHttpPorts::default();
    ports
        .scans
        .expect_capture_scan()
        .withf(|request| {
            request.code == "D1" && request.operator.as_str() == "OP1" && request.session_id.is_none()
        })
        .times(1)
        .return_once(|_| Ok(outcome()));
    let app = actix_test::init_service(test_app(ports, |scope| scope.service(capture_scan))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/scans")
        .set_json(json!({ "code": "D1", "operatorId": "OP1" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["dollyId"], "D1");
    assert_eq!(body["station"], "EOL1");
    assert_eq!(body["holds"][0]["id"], 7);
    assert_eq!(body["holds"][0]["status"], "scanned");
    assert_eq!(body["holds"][0]["vinId"], "V1");
}

#[rstest]
#[actix_web::test]
async fn ordering_violation_maps_to_conflict() {
    let mut ports = MockHttpPorts::default();
    ports.scans.expect_capture_scan().with(always()).return_once(|_| {
        Err(Error::ordering_violation("dolly D3 is out of order")
            .with_details(json!({ "expectedDollyId": "D2" })))
    });
    let app = actix_test::init_service(test_app(ports, |scope| scope.service(capture_scan))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/scans")
        .set_json(json!({ "code": "D3", "operatorId": "OP1", "sessionId": "S1" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "ordering_violation");
    assert_eq!(body["details"]["expectedDollyId"], "D2");
}

#[rstest]
#[case(json!({ "code": "D1", "operatorId": "  " }))]
#[case(json!({ "code": "D1" }))]
#[actix_web::test]
async fn capture_scan_rejects_bad_payloads(#[case] payload: Value) {
    let mut ports = MockHttpPorts::default();
    ports.scans.expect_capture_scan().never();
    let app = actix_test::init_service(test_app(ports, |scope| scope.service(capture_scan))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/scans")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "validation_error");
}

#[rstest]
#[actix_web::test]
async fn undo_forwards_session_and_operator() {
    let mut ports = MockHttpPorts::default();
    ports
        .scans
        .expect_undo_last_scan()
        .withf(|request| request.session_id.as_str() == "S1" && request.code == "D1")
        .times(1)
        .return_once(|_| Ok(outcome()));
    let app =
        actix_test::init_service(test_app(ports, |scope| scope.service(undo_last_scan))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/scans/undo")
        .set_json(json!({ "sessionId": "S1", "code": "D1", "operatorId": "OP1" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn undo_of_older_scan_is_a_conflict() {
    let mut ports = MockHttpPorts::default();
    ports
        .scans
        .expect_undo_last_scan()
        .return_once(|_| Err(Error::not_last_scanned("D1 is not the latest scan")));
    let app =
        actix_test::init_service(test_app(ports, |scope| scope.service(undo_last_scan))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/scans/undo")
        .set_json(json!({ "sessionId": "S1", "code": "D1", "operatorId": "OP1" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "not_last_scanned");
}
