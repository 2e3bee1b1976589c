//! PostgreSQL-backed `LogisticsStore` implementation using Diesel ORM.
//!
//! Each [`DieselLogisticsTransaction`] owns one pooled connection with an open
//! transaction. Serialisation uses transaction-scoped advisory locks keyed by
//! `hashtext('<scope>:<id>')`, released automatically on commit or rollback.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use tracing::debug;

use super::diesel_basic_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    LifecycleEventRow, NewLifecycleEventRow, NewRemovedQueueItemRow, NewScanHoldRow,
    NewShipmentRecordRow, OperatorTaskProgress, OperatorTaskRow, QueueItemRow,
    RemovedQueueItemRow, ScanHoldRow, ScanHoldUpdate, ShipmentRecordRow, decode,
};
use super::pool::{DbPool, OwnedConnection};
use super::schema::{
    lifecycle_events, operator_tasks, production_history, queue_items, removed_queue_items,
    scan_holds, shipment_records,
};
use crate::domain::ports::{
    LogisticsStore, LogisticsStoreError, LogisticsTransaction, PairLocation,
    RemovedQueueItemDraft,
};
use crate::domain::{
    BatchId, DollyId, HoldId, HoldStatus, LifecycleEvent, OperatorId, OperatorTask, QueueItem,
    RemovedQueueItem, ScanHold, ScanHoldDraft, SessionId, ShipmentRecord, StationId, TripId, VinId,
};

type StoreResult<T> = Result<T, LogisticsStoreError>;

fn collect_domain<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> StoreResult<T>,
) -> StoreResult<Vec<T>> {
    rows.into_iter().map(convert).collect()
}

/// Diesel-backed implementation of the logistics store port.
#[derive(Clone)]
pub struct DieselLogisticsStore {
    pool: DbPool,
}

impl DieselLogisticsStore {
    /// Create a store over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Open unit of work on one owned connection.
///
/// Dropping it without commit returns the connection with an open
/// transaction; the pool discards such connections, which rolls back.
pub struct DieselLogisticsTransaction {
    conn: OwnedConnection,
}

impl DieselLogisticsTransaction {
    fn conn(&mut self) -> &mut AsyncPgConnection {
        &mut *self.conn
    }

    async fn advisory_lock(&mut self, scope: &str, key: &str) -> StoreResult<()> {
        diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind::<Text, _>(format!("{scope}:{key}"))
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "advisory lock"))
    }
}

#[async_trait]
impl LogisticsTransaction for DieselLogisticsTransaction {
    async fn lock_station(&mut self, station: &StationId) -> StoreResult<()> {
        self.advisory_lock("station", station.as_str()).await
    }

    async fn lock_trip(&mut self, trip: &TripId) -> StoreResult<()> {
        self.advisory_lock("trip", trip.as_str()).await
    }

    async fn lock_batch(&mut self, batch: &BatchId) -> StoreResult<()> {
        self.advisory_lock("batch", batch.as_str()).await
    }

    async fn queue_items_by_code(&mut self, code: &str) -> StoreResult<Vec<QueueItem>> {
        let rows: Vec<QueueItemRow> = queue_items::table
            .filter(
                queue_items::dolly_id
                    .eq(code)
                    .or(queue_items::barcode.eq(code)),
            )
            .order((queue_items::dolly_id.asc(), queue_items::vin_id.asc()))
            .select(QueueItemRow::as_select())
            .load(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "queue items by code"))?;
        collect_domain(rows, QueueItemRow::into_domain)
    }

    async fn queue_item(
        &mut self,
        dolly: &DollyId,
        vin: &VinId,
    ) -> StoreResult<Option<QueueItem>> {
        queue_items::table
            .find((dolly.as_str(), vin.as_str()))
            .select(QueueItemRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, "queue item"))?
            .map(QueueItemRow::into_domain)
            .transpose()
    }

    async fn min_queued_order(&mut self, station: &StationId) -> StoreResult<Option<i64>> {
        queue_items::table
            .filter(queue_items::station.eq(station.as_str()))
            .select(dsl::min(queue_items::order_number))
            .get_result(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "min queued order"))
    }

    async fn queued_dolly_at_order(
        &mut self,
        station: &StationId,
        order_number: i64,
    ) -> StoreResult<Option<DollyId>> {
        let dolly: Option<String> = queue_items::table
            .filter(queue_items::station.eq(station.as_str()))
            .filter(queue_items::order_number.eq(order_number))
            .select(queue_items::dolly_id)
            .first(self.conn())
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, "queued dolly at order"))?;
        dolly.map(|value| decode("dolly_id", value)).transpose()
    }

    async fn delete_queue_items(&mut self, keys: &[(DollyId, VinId)]) -> StoreResult<()> {
        for (dolly, vin) in keys {
            diesel::delete(queue_items::table.find((dolly.as_str(), vin.as_str())))
                .execute(self.conn())
                .await
                .map_err(|error| map_diesel_error(error, "delete queue item"))?;
        }
        Ok(())
    }

    async fn insert_queue_items(&mut self, items: &[QueueItem]) -> StoreResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let rows: Vec<QueueItemRow> = items.iter().map(QueueItemRow::from).collect();
        diesel::insert_into(queue_items::table)
            .values(&rows)
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "insert queue items"))
    }

    async fn active_holds_by_code(&mut self, code: &str) -> StoreResult<Vec<ScanHold>> {
        let rows: Vec<ScanHoldRow> = scan_holds::table
            .filter(scan_holds::status.ne(HoldStatus::Removed.as_str()))
            .filter(scan_holds::dolly_id.eq(code).or(scan_holds::barcode.eq(code)))
            .order(scan_holds::id.asc())
            .select(ScanHoldRow::as_select())
            .load(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "active holds by code"))?;
        collect_domain(rows, ScanHoldRow::into_domain)
    }

    async fn max_scanned_order_number(
        &mut self,
        station: &StationId,
        session: &SessionId,
    ) -> StoreResult<Option<i64>> {
        scan_holds::table
            .filter(scan_holds::station.eq(station.as_str()))
            .filter(scan_holds::session_id.eq(session.as_str()))
            .filter(scan_holds::status.eq(HoldStatus::Scanned.as_str()))
            .select(dsl::max(scan_holds::order_number))
            .get_result(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "max scanned order number"))
    }

    async fn max_scan_order(&mut self, session: &SessionId) -> StoreResult<Option<i32>> {
        scan_holds::table
            .filter(scan_holds::session_id.eq(session.as_str()))
            .filter(scan_holds::status.ne(HoldStatus::Removed.as_str()))
            .select(dsl::max(scan_holds::scan_order))
            .get_result(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "max scan order"))
    }

    async fn insert_holds(&mut self, drafts: Vec<ScanHoldDraft>) -> StoreResult<Vec<ScanHold>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewScanHoldRow> = drafts.iter().map(NewScanHoldRow::from).collect();
        let inserted: Vec<ScanHoldRow> = diesel::insert_into(scan_holds::table)
            .values(&rows)
            .returning(ScanHoldRow::as_returning())
            .get_results(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "insert holds"))?;
        collect_domain(inserted, ScanHoldRow::into_domain)
    }

    async fn last_scanned_holds(
        &mut self,
        station: &StationId,
        operator: &OperatorId,
        session: &SessionId,
    ) -> StoreResult<Vec<ScanHold>> {
        let scope = scan_holds::table
            .filter(scan_holds::station.eq(station.as_str()))
            .filter(scan_holds::operator_id.eq(operator.as_str()))
            .filter(scan_holds::session_id.eq(session.as_str()))
            .filter(scan_holds::status.eq(HoldStatus::Scanned.as_str()));

        let latest: Option<(String, i32)> = scope
            .clone()
            .order((
                scan_holds::scanned_at.desc(),
                scan_holds::scan_order.desc(),
                scan_holds::id.desc(),
            ))
            .select((scan_holds::dolly_id, scan_holds::scan_order))
            .first(self.conn())
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, "latest scanned hold"))?;
        let Some((dolly, scan_order)) = latest else {
            return Ok(Vec::new());
        };

        let rows: Vec<ScanHoldRow> = scope
            .filter(scan_holds::dolly_id.eq(dolly))
            .filter(scan_holds::scan_order.eq(scan_order))
            .order(scan_holds::id.asc())
            .select(ScanHoldRow::as_select())
            .load(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "last scanned holds"))?;
        collect_domain(rows, ScanHoldRow::into_domain)
    }

    async fn scanned_holds_in_session(&mut self, session: &SessionId) -> StoreResult<Vec<ScanHold>> {
        let rows: Vec<ScanHoldRow> = scan_holds::table
            .filter(scan_holds::session_id.eq(session.as_str()))
            .filter(scan_holds::status.eq(HoldStatus::Scanned.as_str()))
            .order((scan_holds::scan_order.asc(), scan_holds::id.asc()))
            .select(ScanHoldRow::as_select())
            .load(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "scanned holds in session"))?;
        collect_domain(rows, ScanHoldRow::into_domain)
    }

    async fn holds_in_batch(
        &mut self,
        batch: &BatchId,
        status: HoldStatus,
    ) -> StoreResult<Vec<ScanHold>> {
        let rows: Vec<ScanHoldRow> = scan_holds::table
            .filter(scan_holds::batch_id.eq(batch.as_str()))
            .filter(scan_holds::status.eq(status.as_str()))
            .order((scan_holds::scan_order.asc(), scan_holds::id.asc()))
            .select(ScanHoldRow::as_select())
            .load(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "holds in batch"))?;
        collect_domain(rows, ScanHoldRow::into_domain)
    }

    async fn update_holds(&mut self, holds: &[ScanHold]) -> StoreResult<()> {
        for hold in holds {
            diesel::update(scan_holds::table.find(hold.id.get()))
                .set(ScanHoldUpdate::from(hold))
                .execute(self.conn())
                .await
                .map_err(|error| map_diesel_error(error, "update hold"))?;
        }
        Ok(())
    }

    async fn delete_holds(&mut self, ids: &[HoldId]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        diesel::delete(scan_holds::table.filter(scan_holds::id.eq_any(raw)))
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "delete holds"))
    }

    async fn pair_location(
        &mut self,
        dolly: &DollyId,
        vin: &VinId,
    ) -> StoreResult<Option<PairLocation>> {
        let queued: bool = diesel::select(dsl::exists(
            queue_items::table.find((dolly.as_str(), vin.as_str())),
        ))
        .get_result(self.conn())
        .await
        .map_err(|error| map_diesel_error(error, "pair queued"))?;
        if queued {
            return Ok(Some(PairLocation::Queued));
        }

        let held: bool = diesel::select(dsl::exists(
            scan_holds::table
                .filter(scan_holds::dolly_id.eq(dolly.as_str()))
                .filter(scan_holds::vin_id.eq(vin.as_str()))
                .filter(scan_holds::status.ne(HoldStatus::Removed.as_str())),
        ))
        .get_result(self.conn())
        .await
        .map_err(|error| map_diesel_error(error, "pair held"))?;
        if held {
            return Ok(Some(PairLocation::Held));
        }

        let shipped: bool = diesel::select(dsl::exists(
            shipment_records::table
                .filter(shipment_records::dolly_id.eq(dolly.as_str()))
                .filter(shipment_records::vin_id.eq(vin.as_str())),
        ))
        .get_result(self.conn())
        .await
        .map_err(|error| map_diesel_error(error, "pair shipped"))?;
        Ok(shipped.then_some(PairLocation::Shipped))
    }

    async fn max_batch_counter(&mut self, date: NaiveDate) -> StoreResult<Option<u32>> {
        // Counters are zero-padded, so the lexicographic maximum is the
        // numeric one.
        let latest: Option<String> = operator_tasks::table
            .filter(operator_tasks::batch_id.like(format!("{}%", BatchId::prefix_for(date))))
            .select(dsl::max(operator_tasks::batch_id))
            .get_result(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "max batch counter"))?;
        latest
            .map(|value| decode::<BatchId>("batch_id", value).map(|batch| batch.counter()))
            .transpose()
    }

    async fn insert_operator_task(&mut self, task: &OperatorTask) -> StoreResult<()> {
        diesel::insert_into(operator_tasks::table)
            .values(OperatorTaskRow::from(task))
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "insert operator task"))
    }

    async fn operator_task(&mut self, batch: &BatchId) -> StoreResult<Option<OperatorTask>> {
        operator_tasks::table
            .find(batch.as_str())
            .select(OperatorTaskRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, "operator task"))?
            .map(OperatorTaskRow::into_domain)
            .transpose()
    }

    async fn update_operator_task(&mut self, task: &OperatorTask) -> StoreResult<()> {
        diesel::update(operator_tasks::table.find(task.batch_id.as_str()))
            .set(OperatorTaskProgress {
                status: task.status.as_str(),
                processed_items: task.processed_items,
                updated_at: task.updated_at,
            })
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "update operator task"))
    }

    async fn trip_exists(&mut self, trip: &TripId) -> StoreResult<bool> {
        diesel::select(dsl::exists(
            shipment_records::table.filter(shipment_records::trip_id.eq(trip.as_str())),
        ))
        .get_result(self.conn())
        .await
        .map_err(|error| map_diesel_error(error, "trip exists"))
    }

    async fn production_dates(
        &mut self,
        dollies: &[DollyId],
    ) -> StoreResult<BTreeMap<DollyId, DateTime<Utc>>> {
        if dollies.is_empty() {
            return Ok(BTreeMap::new());
        }
        let keys: Vec<&str> = dollies.iter().map(DollyId::as_str).collect();
        let rows: Vec<(String, DateTime<Utc>)> = production_history::table
            .filter(production_history::dolly_id.eq_any(keys))
            .select((production_history::dolly_id, production_history::produced_at))
            .load(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "production dates"))?;
        rows.into_iter()
            .map(|(dolly, produced_at)| Ok((decode("dolly_id", dolly)?, produced_at)))
            .collect()
    }

    async fn insert_shipment_records(&mut self, records: &[ShipmentRecord]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewShipmentRecordRow> =
            records.iter().map(NewShipmentRecordRow::from).collect();
        diesel::insert_into(shipment_records::table)
            .values(&rows)
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "insert shipment records"))
    }

    async fn archive_queue_item(
        &mut self,
        draft: RemovedQueueItemDraft,
    ) -> StoreResult<RemovedQueueItem> {
        let item = QueueItemRow::from(&draft.item);
        let row = NewRemovedQueueItemRow {
            dolly_id: item.dolly_id,
            vin_id: item.vin_id,
            customer_reference: item.customer_reference,
            station: item.station,
            quantity: item.quantity,
            produced_at: item.produced_at,
            order_number: item.order_number,
            barcode: item.barcode,
            removed_by: draft.removed_by.to_string(),
            reason: draft.reason,
            removed_at: draft.removed_at,
        };
        let stored: RemovedQueueItemRow = diesel::insert_into(removed_queue_items::table)
            .values(&row)
            .returning(RemovedQueueItemRow::as_returning())
            .get_result(self.conn())
            .await
            .map_err(|error| map_diesel_error(error, "archive queue item"))?;
        stored.into_domain()
    }

    async fn removed_item(&mut self, archive_id: i64) -> StoreResult<Option<RemovedQueueItem>> {
        removed_queue_items::table
            .find(archive_id)
            .select(RemovedQueueItemRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, "removed item"))?
            .map(RemovedQueueItemRow::into_domain)
            .transpose()
    }

    async fn delete_removed_item(&mut self, archive_id: i64) -> StoreResult<()> {
        diesel::delete(removed_queue_items::table.find(archive_id))
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "delete removed item"))
    }

    async fn append_lifecycle(&mut self, events: &[LifecycleEvent]) -> StoreResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewLifecycleEventRow> =
            events.iter().map(NewLifecycleEventRow::from).collect();
        diesel::insert_into(lifecycle_events::table)
            .values(&rows)
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "append lifecycle"))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let Self { mut conn } = *self;
        AnsiTransactionManager::commit_transaction(&mut *conn)
            .await
            .map_err(|error| map_diesel_error(error, "commit"))
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        let Self { mut conn } = *self;
        AnsiTransactionManager::rollback_transaction(&mut *conn)
            .await
            .map_err(|error| map_diesel_error(error, "rollback"))
    }
}

#[async_trait]
impl LogisticsStore for DieselLogisticsStore {
    async fn begin(&self) -> StoreResult<Box<dyn LogisticsTransaction>> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(|error| map_diesel_error(error, "begin"))?;
        debug!("logistics transaction opened");
        Ok(Box::new(DieselLogisticsTransaction { conn }))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "ping"))
    }

    async fn holds(&self, status: Option<HoldStatus>) -> StoreResult<Vec<ScanHold>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = scan_holds::table
            .order((
                scan_holds::session_id.asc(),
                scan_holds::scan_order.asc(),
                scan_holds::id.asc(),
            ))
            .select(ScanHoldRow::as_select())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(scan_holds::status.eq(status.as_str()));
        }
        let rows: Vec<ScanHoldRow> = query
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "holds"))?;
        collect_domain(rows, ScanHoldRow::into_domain)
    }

    async fn batch_holds(&self, batch: &BatchId) -> StoreResult<Vec<ScanHold>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ScanHoldRow> = scan_holds::table
            .filter(scan_holds::batch_id.eq(batch.as_str()))
            .order((scan_holds::scan_order.asc(), scan_holds::id.asc()))
            .select(ScanHoldRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "batch holds"))?;
        collect_domain(rows, ScanHoldRow::into_domain)
    }

    async fn operator_tasks(&self, batches: &[BatchId]) -> StoreResult<Vec<OperatorTask>> {
        if batches.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let keys: Vec<&str> = batches.iter().map(BatchId::as_str).collect();
        let rows: Vec<OperatorTaskRow> = operator_tasks::table
            .filter(operator_tasks::batch_id.eq_any(keys))
            .order(operator_tasks::batch_id.asc())
            .select(OperatorTaskRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "operator tasks"))?;
        collect_domain(rows, OperatorTaskRow::into_domain)
    }

    async fn queue_items(&self, station: Option<StationId>) -> StoreResult<Vec<QueueItem>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = queue_items::table
            .order((
                queue_items::order_number.asc(),
                queue_items::dolly_id.asc(),
                queue_items::vin_id.asc(),
            ))
            .select(QueueItemRow::as_select())
            .into_boxed();
        if let Some(station) = station {
            query = query.filter(queue_items::station.eq(station.to_string()));
        }
        let rows: Vec<QueueItemRow> = query
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "queue items"))?;
        collect_domain(rows, QueueItemRow::into_domain)
    }

    async fn shipment_records(&self, trip: &TripId) -> StoreResult<Vec<ShipmentRecord>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ShipmentRecordRow> = shipment_records::table
            .filter(shipment_records::trip_id.eq(trip.as_str()))
            .order(shipment_records::id.asc())
            .select(ShipmentRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "shipment records"))?;
        collect_domain(rows, ShipmentRecordRow::into_domain)
    }

    async fn lifecycle_trail(&self, dolly: &DollyId) -> StoreResult<Vec<LifecycleEvent>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LifecycleEventRow> = lifecycle_events::table
            .filter(lifecycle_events::dolly_id.eq(dolly.as_str()))
            .order(lifecycle_events::id.asc())
            .select(LifecycleEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "lifecycle trail"))?;
        collect_domain(rows, LifecycleEventRow::into_domain)
    }

    async fn removed_items(&self) -> StoreResult<Vec<RemovedQueueItem>> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RemovedQueueItemRow> = removed_queue_items::table
            .order((
                removed_queue_items::removed_at.desc(),
                removed_queue_items::archive_id.desc(),
            ))
            .select(RemovedQueueItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "removed items"))?;
        collect_domain(rows, RemovedQueueItemRow::into_domain)
    }
}

#[cfg(test)]
mod tests {
    use diesel::pg::Pg;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn station_head_query_takes_the_lowest_order() {
        let query = queue_items::table
            .filter(queue_items::station.eq("EOL1"))
            .select(dsl::min(queue_items::order_number));
        let sql = diesel::debug_query::<Pg, _>(&query).to_string().to_lowercase();
        assert!(sql.contains("min(\"queue_items\".\"order_number\")"), "{sql}");
    }

    #[rstest]
    fn batch_counter_query_takes_the_day_maximum() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).expect("date");
        let query = operator_tasks::table
            .filter(operator_tasks::batch_id.like(format!("{}%", BatchId::prefix_for(date))))
            .select(dsl::max(operator_tasks::batch_id));
        let sql = diesel::debug_query::<Pg, _>(&query).to_string().to_lowercase();
        assert!(sql.contains("max(\"operator_tasks\".\"batch_id\")"), "{sql}");
        assert!(sql.contains("pt20260302%"), "{sql}");
    }
}
