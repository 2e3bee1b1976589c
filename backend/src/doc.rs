//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every workflow endpoint from the inbound layer
//! together with the request and response bodies they exchange. The document
//! backs Swagger UI in debug builds and is exported with
//! `cargo run --bin openapi-dump` for the scanner and office clients.

use utoipa::OpenApi;

use crate::domain::{
    ConfirmationChannel, Error, ErrorCode, HoldStatus, LifecycleSource, LifecycleStatus,
    TaskStatus,
};
use crate::inbound::http::diagnostics::{CarrierProbeBody, LifecycleEventBody};
use crate::inbound::http::dto::{BatchBody, HoldBody};
use crate::inbound::http::queue::{
    ArchiveOutcomeBody, ItemFailureBody, QueuePairBody, RemoveFromQueueBody, RemovedItemBody,
    RestoreFromArchiveBody,
};
use crate::inbound::http::scans::{CaptureScanBody, ScanResponseBody, UndoScanBody};
use crate::inbound::http::sessions::{
    CompleteSessionBody, SessionCompletionBody, SessionSummaryBody,
};
use crate::inbound::http::shipments::{CompleteShipmentBody, ShipmentSummaryBody};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dolly loading and shipment API",
        description = "Scan capture, loading sessions, carrier-confirmed shipments, and queue archive."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::scans::capture_scan,
        crate::inbound::http::scans::undo_last_scan,
        crate::inbound::http::sessions::complete_session,
        crate::inbound::http::sessions::list_sessions,
        crate::inbound::http::shipments::pending_shipments,
        crate::inbound::http::shipments::batch_details,
        crate::inbound::http::shipments::complete_shipment,
        crate::inbound::http::queue::remove_from_queue,
        crate::inbound::http::queue::list_removed,
        crate::inbound::http::queue::restore_from_archive,
        crate::inbound::http::diagnostics::lifecycle_trail,
        crate::inbound::http::diagnostics::carrier_probe,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        HoldStatus,
        TaskStatus,
        ConfirmationChannel,
        LifecycleStatus,
        LifecycleSource,
        HoldBody,
        BatchBody,
        CaptureScanBody,
        UndoScanBody,
        ScanResponseBody,
        CompleteSessionBody,
        SessionCompletionBody,
        SessionSummaryBody,
        CompleteShipmentBody,
        ShipmentSummaryBody,
        QueuePairBody,
        RemoveFromQueueBody,
        RestoreFromArchiveBody,
        ArchiveOutcomeBody,
        ItemFailureBody,
        RemovedItemBody,
        LifecycleEventBody,
        CarrierProbeBody,
    )),
    tags(
        (name = "scans", description = "Forklift scan capture and undo"),
        (name = "sessions", description = "Loading session completion and listing"),
        (name = "shipments", description = "Batches and carrier-confirmed shipments"),
        (name = "queue", description = "Supervisor queue archive"),
        (name = "diagnostics", description = "Lifecycle trails and carrier connectivity"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/api/v1/scans")]
    #[case("/api/v1/scans/undo")]
    #[case("/api/v1/sessions/{sessionId}/complete")]
    #[case("/api/v1/batches/{batchId}/shipments")]
    #[case("/api/v1/queue/restorations")]
    #[case("/api/v1/dollies/{dollyId}/lifecycle")]
    #[case("/health/ready")]
    fn document_lists_workflow_paths(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    fn document_registers_error_schema() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        assert!(schemas.contains_key("Error"));
        assert!(schemas.contains_key("ScanResponseBody"));
    }

    #[rstest]
    fn timestamps_are_documented_as_date_time() {
        let doc = serde_json::to_value(ApiDoc::openapi()).expect("serialise document");
        let scanned_at = &doc["components"]["schemas"]["HoldBody"]["properties"]["scannedAt"];
        assert_eq!(scanned_at["type"], "string");
        assert_eq!(scanned_at["format"], "date-time");
    }
}
