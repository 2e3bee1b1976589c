//! Domain primitives, entities, and workflow services.
//!
//! Purpose: model the loading and shipment pipeline (queue, scan holds,
//! batches, shipment ledger, lifecycle log) and the services that move a
//! dolly through it. Services depend only on the ports in [`ports`]; adapters
//! live under `outbound` and `inbound`.
//!
//! Public surface:
//! - Error / ErrorCode: the error taxonomy shared by every operation.
//! - Identifiers: DollyId, VinId, StationId, SessionId, OperatorId, HoldId,
//!   BatchId, TripId, PlateId.
//! - Services: ScanLedger, LoadingSessionService, ShipmentService,
//!   QueueArchiveService, LifecycleLog, RetryingCarrierGateway.

pub mod carrier_gateway;
pub mod error;
pub mod identifiers;
pub mod lifecycle;
pub mod lifecycle_log;
pub mod loading_session_service;
pub mod operator_task;
pub mod ports;
pub mod queue_archive_service;
pub mod queue_item;
pub mod scan_hold;
pub mod scan_ledger;
pub mod shipment_record;
pub mod shipment_service;
mod workflow_support;

pub use self::carrier_gateway::{
    BackoffJitter, CarrierGatewayConfig, CarrierGatewayRuntime, CarrierSleeper,
    RetryingCarrierGateway, SeededJitter, TokioSleeper,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identifiers::{
    BatchId, DollyId, HoldId, IDENTIFIER_MAX, IdentifierValidationError, OperatorId, PlateId,
    SessionId, StationId, TripId, VinId,
};
pub use self::lifecycle::{
    LifecycleEvent, LifecycleSource, LifecycleStatus, Metadata, ParseLifecycleLabelError,
};
pub use self::lifecycle_log::LifecycleLog;
pub use self::loading_session_service::{
    LoadingSessionService, StationChannelError, StationChannels,
};
pub use self::operator_task::{OperatorTask, ParseTaskStatusError, TaskStatus};
pub use self::queue_archive_service::QueueArchiveService;
pub use self::queue_item::{QueueItem, RemovedQueueItem};
pub use self::scan_hold::{HoldStatus, ParseHoldStatusError, ScanHold, ScanHoldDraft};
pub use self::scan_ledger::ScanLedger;
pub use self::shipment_record::{
    ConfirmationChannel, ParseConfirmationChannelError, ShipmentRecord,
};
pub use self::shipment_service::{DEFAULT_REASON_CODE, ShipmentService};
pub use self::workflow_support::WorkflowPorts;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use dolly_backend::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<u32> {
///     Err(Error::not_found("dolly D404 is not queued"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
