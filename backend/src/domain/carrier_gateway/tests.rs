//! Unit tests for carrier gateway retry and verdict handling.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rstest::{fixture, rstest};

use super::{
    CarrierGatewayConfig, CarrierGatewayRuntime, DISABLED_MESSAGE, EMPTY_SUBMISSION_MESSAGE,
    RetryingCarrierGateway,
};
use crate::domain::ports::{
    CarrierGateway, CarrierGatewayError, CarrierItem, CarrierReply, CarrierTransportError,
    MockCarrierTransport,
};
use crate::domain::{DollyId, TripId, VinId};
use crate::test_support::carrier::{
    AttemptOffsetJitter, ImmediateSleeper, MutableClock, NoJitter, RecordingSleeper,
    ScriptedCarrierTransport,
};
use crate::test_support::shift_start;

fn config() -> CarrierGatewayConfig {
    CarrierGatewayConfig {
        enabled: true,
        environment: "staging".to_owned(),
        retry_count: 2,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(150),
    }
}

fn gateway_over(
    transport: Arc<ScriptedCarrierTransport>,
    config: CarrierGatewayConfig,
) -> RetryingCarrierGateway {
    RetryingCarrierGateway::with_runtime(
        transport,
        Arc::new(MutableClock::new(shift_start())),
        CarrierGatewayRuntime {
            sleeper: Arc::new(ImmediateSleeper),
            jitter: Arc::new(NoJitter),
        },
        config,
    )
}

#[fixture]
fn trip() -> TripId {
    TripId::new("TR0001").expect("trip")
}

#[fixture]
fn items() -> Vec<CarrierItem> {
    vec![CarrierItem {
        dolly_id: DollyId::new("D1").expect("dolly"),
        order_number: 1,
        vin_id: VinId::new("V1").expect("vin"),
        part_number: "REF-V1".to_owned(),
        quantity: 1,
        process_date: NaiveDate::from_ymd_opt(2026, 3, 2).expect("date"),
        waybill_number: "TR0001".to_owned(),
        reason_code: "TRC-00".to_owned(),
    }]
}

fn accepted() -> Result<CarrierReply, CarrierTransportError> {
    Ok(CarrierReply {
        accepted: true,
        message: "kayit basarili".to_owned(),
    })
}

#[rstest]
#[tokio::test]
async fn empty_submission_is_refused_locally(trip: TripId) {
    let mut transport = MockCarrierTransport::new();
    transport.expect_submit().never();
    let gateway = RetryingCarrierGateway::new(
        Arc::new(transport),
        Arc::new(MutableClock::new(shift_start())),
        config(),
    );

    let verdict = gateway.submit_trip(&trip, &[]).await.expect("verdict");

    assert!(!verdict.accepted);
    assert_eq!(verdict.message, EMPTY_SUBMISSION_MESSAGE);
    assert_eq!(verdict.attempts, 0);
}

#[rstest]
#[case::with_items(false)]
#[case::without_items(true)]
#[tokio::test]
async fn disabled_carrier_accepts_without_network(
    #[case] empty: bool,
    trip: TripId,
    items: Vec<CarrierItem>,
) {
    let items = if empty { Vec::new() } else { items };
    let transport = Arc::new(ScriptedCarrierTransport::accepting());
    let gateway = gateway_over(
        transport.clone(),
        CarrierGatewayConfig {
            enabled: false,
            ..config()
        },
    );

    let verdict = gateway.submit_trip(&trip, &items).await.expect("verdict");

    assert!(verdict.accepted);
    assert_eq!(verdict.message, DISABLED_MESSAGE);
    assert_eq!(transport.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn transient_failures_are_retried_with_the_same_payload(
    trip: TripId,
    items: Vec<CarrierItem>,
) {
    let transport = Arc::new(ScriptedCarrierTransport::scripted(vec![
        Err(CarrierTransportError::unavailable(503_u16, "maintenance")),
        Err(CarrierTransportError::timeout("30s elapsed")),
        accepted(),
    ]));
    let gateway = gateway_over(transport.clone(), config());

    let verdict = gateway.submit_trip(&trip, &items).await.expect("verdict");

    assert!(verdict.accepted);
    assert_eq!(verdict.attempts, 3);
    let submissions = transport.submissions();
    assert_eq!(submissions.len(), 3);
    assert!(submissions.windows(2).all(|pair| pair[0] == pair[1]));
}

#[rstest]
#[tokio::test]
async fn exhausted_retries_report_unreachable(trip: TripId, items: Vec<CarrierItem>) {
    let transport = Arc::new(ScriptedCarrierTransport::scripted(vec![
        Err(CarrierTransportError::transport("reset")),
        Err(CarrierTransportError::rate_limited("slow down")),
        Err(CarrierTransportError::unavailable(502_u16, "bad gateway")),
        accepted(),
    ]));
    let gateway = gateway_over(transport.clone(), config());

    let error = gateway
        .submit_trip(&trip, &items)
        .await
        .expect_err("three failures exhaust two retries");

    assert!(matches!(
        error,
        CarrierGatewayError::Unreachable { attempts: 3, .. }
    ));
    assert_eq!(transport.calls(), 3);
}

#[rstest]
#[tokio::test]
async fn client_error_statuses_are_retried(trip: TripId, items: Vec<CarrierItem>) {
    let transport = Arc::new(ScriptedCarrierTransport::scripted(vec![
        Err(CarrierTransportError::unavailable(404_u16, "status 404")),
        accepted(),
    ]));
    let gateway = gateway_over(transport.clone(), config());

    let verdict = gateway.submit_trip(&trip, &items).await.expect("verdict");

    assert!(verdict.accepted);
    assert_eq!(verdict.attempts, 2);
    assert_eq!(transport.calls(), 2);
}

#[rstest]
#[tokio::test]
async fn carrier_refusal_is_returned_as_verdict(trip: TripId, items: Vec<CarrierItem>) {
    let transport = Arc::new(ScriptedCarrierTransport::rejecting("duplicate trip"));
    let gateway = gateway_over(transport, config());

    let verdict = gateway.submit_trip(&trip, &items).await.expect("verdict");

    assert!(!verdict.accepted);
    assert_eq!(verdict.message, "duplicate trip");
}

#[rstest]
#[tokio::test]
async fn invalid_requests_are_internal_failures(trip: TripId, items: Vec<CarrierItem>) {
    let transport = Arc::new(ScriptedCarrierTransport::scripted(vec![Err(
        CarrierTransportError::invalid_request("missing endpoint url"),
    )]));
    let gateway = gateway_over(transport, config());

    let error = gateway
        .submit_trip(&trip, &items)
        .await
        .expect_err("cannot build request");

    assert_eq!(
        error,
        CarrierGatewayError::internal("missing endpoint url")
    );
}

#[rstest]
#[tokio::test]
async fn backoff_doubles_until_capped(trip: TripId, items: Vec<CarrierItem>) {
    let transport = Arc::new(ScriptedCarrierTransport::scripted(vec![
        Err(CarrierTransportError::timeout("1")),
        Err(CarrierTransportError::timeout("2")),
        Err(CarrierTransportError::timeout("3")),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let gateway = RetryingCarrierGateway::with_runtime(
        transport,
        Arc::new(MutableClock::new(shift_start())),
        CarrierGatewayRuntime {
            sleeper: sleeper.clone(),
            jitter: Arc::new(AttemptOffsetJitter),
        },
        CarrierGatewayConfig {
            retry_count: 3,
            ..config()
        },
    );

    let result = gateway.submit_trip(&trip, &items).await;

    assert!(result.is_ok(), "fourth attempt falls through to acceptance");
    assert_eq!(
        sleeper.recorded(),
        vec![
            Duration::from_millis(101),
            Duration::from_millis(152),
            Duration::from_millis(153),
        ]
    );
}

#[rstest]
#[case(200, true)]
#[case(405, true)]
#[case(404, false)]
#[tokio::test]
async fn probe_accepts_ok_and_method_not_allowed(#[case] status: u16, #[case] reachable: bool) {
    let transport = Arc::new(ScriptedCarrierTransport::accepting().with_probe_status(status));
    let gateway = gateway_over(transport, config());

    let probe = gateway.probe().await.expect("probe");

    assert!(probe.enabled);
    assert_eq!(probe.reachable, reachable);
    assert_eq!(probe.status, Some(status));
    assert_eq!(probe.environment, "staging");
}

#[rstest]
#[tokio::test]
async fn probe_reports_transport_failures_as_unreachable() {
    let gateway = gateway_over(Arc::new(ScriptedCarrierTransport::accepting()), config());

    let probe = gateway.probe().await.expect("probe");

    assert!(!probe.reachable);
    assert_eq!(probe.status, None);
    assert!(probe.message.contains("connection refused"));
}
