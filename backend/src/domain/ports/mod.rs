//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`LogisticsStore`, `CarrierTransport`, `CarrierGateway`,
//! `NotificationSink`, `AuditSink`) are implemented by outbound adapters.
//! Driving ports (`*Command`, `*Query`) are implemented by domain services and
//! consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod audit_sink;
mod carrier_gateway;
mod carrier_transport;
mod lifecycle_query;
mod loading_session_command;
mod logistics_store;
mod notification_sink;
mod queue_archive_command;
mod scan_ledger_command;
mod shipment_command;

#[cfg(test)]
pub use audit_sink::MockAuditSink;
pub use audit_sink::{AuditEntry, AuditSink, AuditSinkError, NoOpAuditSink};
#[cfg(test)]
pub use carrier_gateway::MockCarrierGateway;
pub use carrier_gateway::{CarrierGateway, CarrierGatewayError, CarrierProbe, CarrierVerdict};
#[cfg(test)]
pub use carrier_transport::MockCarrierTransport;
pub use carrier_transport::{
    CarrierItem, CarrierReply, CarrierSubmission, CarrierTransport, CarrierTransportError,
    FixtureCarrierTransport,
};
pub use lifecycle_query::LifecycleQuery;
#[cfg(test)]
pub use lifecycle_query::MockLifecycleQuery;
pub use loading_session_command::{
    BatchDetails, CompleteSessionRequest, LoadingSessionCommand, LoadingSessionQuery,
    SessionCompletion, SessionSummary,
};
#[cfg(test)]
pub use loading_session_command::{MockLoadingSessionCommand, MockLoadingSessionQuery};
#[cfg(test)]
pub use logistics_store::MockLogisticsStore;
pub use logistics_store::{
    LogisticsStore, LogisticsStoreError, LogisticsTransaction, PairLocation,
    RemovedQueueItemDraft,
};
#[cfg(test)]
pub use notification_sink::MockNotificationSink;
pub use notification_sink::{NoOpNotificationSink, NotificationSink, WorkflowNotification};
#[cfg(test)]
pub use queue_archive_command::MockQueueArchiveCommand;
pub use queue_archive_command::{
    ArchiveOutcome, ItemFailure, QueueArchiveCommand, RemoveFromQueueRequest,
    RestoreFromArchiveRequest,
};
#[cfg(test)]
pub use scan_ledger_command::MockScanLedgerCommand;
pub use scan_ledger_command::{
    CaptureScanRequest, ScanLedgerCommand, ScanOutcome, UndoScanRequest,
};
#[cfg(test)]
pub use shipment_command::MockShipmentCommand;
pub use shipment_command::{CompleteShipmentRequest, ShipmentCommand, ShipmentSummary};
