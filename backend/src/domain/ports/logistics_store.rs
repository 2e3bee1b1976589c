//! Port for the relational store of record behind the loading workflow.
//!
//! Mutations go through a [`LogisticsTransaction`] unit of work so the
//! services can stage several writes, call out to the carrier, and then decide
//! between commit and rollback. Read-only projections are served directly by
//! [`LogisticsStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    BatchId, DollyId, HoldId, HoldStatus, LifecycleEvent, OperatorId, OperatorTask, QueueItem,
    RemovedQueueItem, ScanHold, ScanHoldDraft, SessionId, ShipmentRecord, StationId, TripId, VinId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by logistics store adapters.
    pub enum LogisticsStoreError {
        /// Store connection could not be established or was lost.
        Connection { message: String } =>
            "logistics store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "logistics store query failed: {message}",
    }
}

/// Where a (dolly, VIN) pair currently lives in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairLocation {
    Queued,
    Held,
    Shipped,
}

/// Values for a new archive row; the store assigns the archive id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedQueueItemDraft {
    pub item: QueueItem,
    pub removed_by: OperatorId,
    pub reason: Option<String>,
    pub removed_at: DateTime<Utc>,
}

/// An open unit of work against the store.
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// every staged write.
#[async_trait]
pub trait LogisticsTransaction: Send {
    /// Serialise scans and undos on one grouping station.
    async fn lock_station(&mut self, station: &StationId) -> Result<(), LogisticsStoreError>;

    /// Serialise shipment submissions that share a trip id.
    async fn lock_trip(&mut self, trip: &TripId) -> Result<(), LogisticsStoreError>;

    /// Serialise shipment submissions against one batch.
    async fn lock_batch(&mut self, batch: &BatchId) -> Result<(), LogisticsStoreError>;

    /// Every queued VIN of the dolly whose id or barcode equals `code`.
    async fn queue_items_by_code(&mut self, code: &str)
    -> Result<Vec<QueueItem>, LogisticsStoreError>;

    /// One queued pair, if present.
    async fn queue_item(
        &mut self,
        dolly: &DollyId,
        vin: &VinId,
    ) -> Result<Option<QueueItem>, LogisticsStoreError>;

    /// Lowest order number still queued at `station`.
    async fn min_queued_order(
        &mut self,
        station: &StationId,
    ) -> Result<Option<i64>, LogisticsStoreError>;

    /// Dolly queued at `station` with the given order number.
    async fn queued_dolly_at_order(
        &mut self,
        station: &StationId,
        order_number: i64,
    ) -> Result<Option<DollyId>, LogisticsStoreError>;

    /// Delete queue rows by (dolly, VIN).
    async fn delete_queue_items(
        &mut self,
        keys: &[(DollyId, VinId)],
    ) -> Result<(), LogisticsStoreError>;

    /// Insert queue rows.
    async fn insert_queue_items(&mut self, items: &[QueueItem]) -> Result<(), LogisticsStoreError>;

    /// Active holds whose dolly id or barcode equals `code`.
    async fn active_holds_by_code(
        &mut self,
        code: &str,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError>;

    /// Highest order number among `scanned` holds for a station and session.
    async fn max_scanned_order_number(
        &mut self,
        station: &StationId,
        session: &SessionId,
    ) -> Result<Option<i64>, LogisticsStoreError>;

    /// Highest scan order among non-removed holds of a session.
    async fn max_scan_order(
        &mut self,
        session: &SessionId,
    ) -> Result<Option<i32>, LogisticsStoreError>;

    /// Insert holds in status `scanned` and return them with their ids.
    async fn insert_holds(
        &mut self,
        drafts: Vec<ScanHoldDraft>,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError>;

    /// All VIN holds of the most recently captured `scanned` dolly for a
    /// station, operator, and session.
    async fn last_scanned_holds(
        &mut self,
        station: &StationId,
        operator: &OperatorId,
        session: &SessionId,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError>;

    /// Holds of a session in status `scanned`.
    async fn scanned_holds_in_session(
        &mut self,
        session: &SessionId,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError>;

    /// Holds of a batch in the given status.
    async fn holds_in_batch(
        &mut self,
        batch: &BatchId,
        status: HoldStatus,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError>;

    /// Write back the mutable columns of existing holds.
    async fn update_holds(&mut self, holds: &[ScanHold]) -> Result<(), LogisticsStoreError>;

    /// Delete holds by id.
    async fn delete_holds(&mut self, ids: &[HoldId]) -> Result<(), LogisticsStoreError>;

    /// Where a pair currently lives, if anywhere.
    async fn pair_location(
        &mut self,
        dolly: &DollyId,
        vin: &VinId,
    ) -> Result<Option<PairLocation>, LogisticsStoreError>;

    /// Highest batch counter already used on `date`.
    async fn max_batch_counter(
        &mut self,
        date: NaiveDate,
    ) -> Result<Option<u32>, LogisticsStoreError>;

    /// Insert the operator task of a new batch.
    async fn insert_operator_task(&mut self, task: &OperatorTask)
    -> Result<(), LogisticsStoreError>;

    /// Operator task of a batch.
    async fn operator_task(
        &mut self,
        batch: &BatchId,
    ) -> Result<Option<OperatorTask>, LogisticsStoreError>;

    /// Overwrite the progress of an operator task.
    async fn update_operator_task(&mut self, task: &OperatorTask)
    -> Result<(), LogisticsStoreError>;

    /// Whether any shipment record already uses `trip`.
    async fn trip_exists(&mut self, trip: &TripId) -> Result<bool, LogisticsStoreError>;

    /// Production timestamps from the backing history, keyed by dolly.
    async fn production_dates(
        &mut self,
        dollies: &[DollyId],
    ) -> Result<BTreeMap<DollyId, DateTime<Utc>>, LogisticsStoreError>;

    /// Append shipment records.
    async fn insert_shipment_records(
        &mut self,
        records: &[ShipmentRecord],
    ) -> Result<(), LogisticsStoreError>;

    /// Move a queue row's values into the removal archive.
    async fn archive_queue_item(
        &mut self,
        draft: RemovedQueueItemDraft,
    ) -> Result<RemovedQueueItem, LogisticsStoreError>;

    /// One archive row.
    async fn removed_item(
        &mut self,
        archive_id: i64,
    ) -> Result<Option<RemovedQueueItem>, LogisticsStoreError>;

    /// Delete one archive row.
    async fn delete_removed_item(&mut self, archive_id: i64) -> Result<(), LogisticsStoreError>;

    /// Append lifecycle events.
    async fn append_lifecycle(
        &mut self,
        events: &[LifecycleEvent],
    ) -> Result<(), LogisticsStoreError>;

    /// Make every staged write durable.
    async fn commit(self: Box<Self>) -> Result<(), LogisticsStoreError>;

    /// Discard every staged write.
    async fn rollback(self: Box<Self>) -> Result<(), LogisticsStoreError>;
}

/// Port for the logistics store of record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogisticsStore: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> Result<Box<dyn LogisticsTransaction>, LogisticsStoreError>;

    /// Cheap round trip used by readiness probes.
    async fn ping(&self) -> Result<(), LogisticsStoreError>;

    /// Holds, optionally filtered by status.
    async fn holds(&self, status: Option<HoldStatus>)
    -> Result<Vec<ScanHold>, LogisticsStoreError>;

    /// Every hold of a batch regardless of status.
    async fn batch_holds(&self, batch: &BatchId) -> Result<Vec<ScanHold>, LogisticsStoreError>;

    /// Operator tasks keyed by batch.
    async fn operator_tasks(
        &self,
        batches: &[BatchId],
    ) -> Result<Vec<OperatorTask>, LogisticsStoreError>;

    /// Queue rows, optionally restricted to one station, ordered by order number.
    async fn queue_items(
        &self,
        station: Option<StationId>,
    ) -> Result<Vec<QueueItem>, LogisticsStoreError>;

    /// Shipment records of a trip.
    async fn shipment_records(
        &self,
        trip: &TripId,
    ) -> Result<Vec<ShipmentRecord>, LogisticsStoreError>;

    /// Lifecycle events of a dolly in recording order.
    async fn lifecycle_trail(
        &self,
        dolly: &DollyId,
    ) -> Result<Vec<LifecycleEvent>, LogisticsStoreError>;

    /// Archived queue removals, newest first.
    async fn removed_items(&self) -> Result<Vec<RemovedQueueItem>, LogisticsStoreError>;
}
