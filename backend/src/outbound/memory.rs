//! In-process logistics store used by tests and the fixture server mode.
//!
//! A transaction holds the state mutex for its whole lifetime and works on a
//! private copy, so staged writes become visible only on commit and dropping
//! the transaction discards them. Holding the mutex also serialises
//! transactions, which makes the explicit lock calls no-ops here.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ports::{
    LogisticsStore, LogisticsStoreError, LogisticsTransaction, PairLocation,
    RemovedQueueItemDraft,
};
use crate::domain::{
    BatchId, DollyId, HoldId, HoldStatus, LifecycleEvent, OperatorId, OperatorTask, QueueItem,
    RemovedQueueItem, ScanHold, ScanHoldDraft, SessionId, ShipmentRecord, StationId, TripId, VinId,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    queue: Vec<QueueItem>,
    holds: BTreeMap<HoldId, ScanHold>,
    next_hold_id: i64,
    tasks: BTreeMap<BatchId, OperatorTask>,
    shipments: Vec<ShipmentRecord>,
    history: BTreeMap<DollyId, DateTime<Utc>>,
    removed: BTreeMap<i64, RemovedQueueItem>,
    next_archive_id: i64,
    lifecycle: Vec<LifecycleEvent>,
}

impl MemoryState {
    fn active_holds(&self) -> impl Iterator<Item = &ScanHold> {
        self.holds.values().filter(|hold| hold.status.is_active())
    }
}

/// Mutex-guarded in-memory implementation of [`LogisticsStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogisticsStore {
    state: Arc<Mutex<MemoryState>>,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryLogisticsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add produced items to the queue.
    pub async fn seed_queue(&self, items: impl IntoIterator<Item = QueueItem>) {
        self.state.lock().await.queue.extend(items);
    }

    /// Record a production timestamp in the backing history.
    pub async fn seed_production(&self, dolly: DollyId, produced_at: DateTime<Utc>) {
        self.state.lock().await.history.insert(dolly, produced_at);
    }

    /// Make every following commit fail until switched off again.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LogisticsStore for InMemoryLogisticsStore {
    async fn begin(&self) -> Result<Box<dyn LogisticsTransaction>, LogisticsStoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            working,
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
        }))
    }

    async fn ping(&self) -> Result<(), LogisticsStoreError> {
        Ok(())
    }

    async fn holds(
        &self,
        status: Option<HoldStatus>,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .holds
            .values()
            .filter(|hold| status.is_none_or(|wanted| hold.status == wanted))
            .cloned()
            .collect())
    }

    async fn batch_holds(&self, batch: &BatchId) -> Result<Vec<ScanHold>, LogisticsStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .holds
            .values()
            .filter(|hold| hold.batch_id.as_ref() == Some(batch))
            .cloned()
            .collect())
    }

    async fn operator_tasks(
        &self,
        batches: &[BatchId],
    ) -> Result<Vec<OperatorTask>, LogisticsStoreError> {
        let state = self.state.lock().await;
        Ok(batches
            .iter()
            .filter_map(|batch| state.tasks.get(batch).cloned())
            .collect())
    }

    async fn queue_items(
        &self,
        station: Option<StationId>,
    ) -> Result<Vec<QueueItem>, LogisticsStoreError> {
        let state = self.state.lock().await;
        let mut items: Vec<_> = state
            .queue
            .iter()
            .filter(|item| station.as_ref().is_none_or(|wanted| &item.station == wanted))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (a.order_number, &a.dolly_id, &a.vin_id).cmp(&(b.order_number, &b.dolly_id, &b.vin_id))
        });
        Ok(items)
    }

    async fn shipment_records(
        &self,
        trip: &TripId,
    ) -> Result<Vec<ShipmentRecord>, LogisticsStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .shipments
            .iter()
            .filter(|record| &record.trip_id == trip)
            .cloned()
            .collect())
    }

    async fn lifecycle_trail(
        &self,
        dolly: &DollyId,
    ) -> Result<Vec<LifecycleEvent>, LogisticsStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .lifecycle
            .iter()
            .filter(|event| &event.dolly_id == dolly)
            .cloned()
            .collect())
    }

    async fn removed_items(&self) -> Result<Vec<RemovedQueueItem>, LogisticsStoreError> {
        let state = self.state.lock().await;
        let mut items: Vec<_> = state.removed.values().cloned().collect();
        items.sort_by(|a, b| {
            (b.removed_at, b.archive_id).cmp(&(a.removed_at, a.archive_id))
        });
        Ok(items)
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_commit: bool,
}

#[async_trait]
impl LogisticsTransaction for InMemoryTransaction {
    async fn lock_station(&mut self, _station: &StationId) -> Result<(), LogisticsStoreError> {
        Ok(())
    }

    async fn lock_trip(&mut self, _trip: &TripId) -> Result<(), LogisticsStoreError> {
        Ok(())
    }

    async fn lock_batch(&mut self, _batch: &BatchId) -> Result<(), LogisticsStoreError> {
        Ok(())
    }

    async fn queue_items_by_code(
        &mut self,
        code: &str,
    ) -> Result<Vec<QueueItem>, LogisticsStoreError> {
        let Some(dolly) = self
            .working
            .queue
            .iter()
            .find(|item| item.matches_code(code))
            .map(|item| item.dolly_id.clone())
        else {
            return Ok(Vec::new());
        };
        let mut items: Vec<_> = self
            .working
            .queue
            .iter()
            .filter(|item| item.dolly_id == dolly)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.vin_id.cmp(&b.vin_id));
        Ok(items)
    }

    async fn queue_item(
        &mut self,
        dolly: &DollyId,
        vin: &VinId,
    ) -> Result<Option<QueueItem>, LogisticsStoreError> {
        Ok(self
            .working
            .queue
            .iter()
            .find(|item| &item.dolly_id == dolly && &item.vin_id == vin)
            .cloned())
    }

    async fn min_queued_order(
        &mut self,
        station: &StationId,
    ) -> Result<Option<i64>, LogisticsStoreError> {
        Ok(self
            .working
            .queue
            .iter()
            .filter(|item| &item.station == station)
            .map(|item| item.order_number)
            .min())
    }

    async fn queued_dolly_at_order(
        &mut self,
        station: &StationId,
        order_number: i64,
    ) -> Result<Option<DollyId>, LogisticsStoreError> {
        Ok(self
            .working
            .queue
            .iter()
            .find(|item| &item.station == station && item.order_number == order_number)
            .map(|item| item.dolly_id.clone()))
    }

    async fn delete_queue_items(
        &mut self,
        keys: &[(DollyId, VinId)],
    ) -> Result<(), LogisticsStoreError> {
        self.working.queue.retain(|item| !keys.contains(&item.key()));
        Ok(())
    }

    async fn insert_queue_items(&mut self, items: &[QueueItem]) -> Result<(), LogisticsStoreError> {
        for item in items {
            if self.working.queue.iter().any(|queued| queued.key() == item.key()) {
                return Err(LogisticsStoreError::query(format!(
                    "duplicate queue row for dolly {} vin {}",
                    item.dolly_id, item.vin_id
                )));
            }
            self.working.queue.push(item.clone());
        }
        Ok(())
    }

    async fn active_holds_by_code(
        &mut self,
        code: &str,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError> {
        Ok(self
            .working
            .active_holds()
            .filter(|hold| hold.matches_code(code))
            .cloned()
            .collect())
    }

    async fn max_scanned_order_number(
        &mut self,
        station: &StationId,
        session: &SessionId,
    ) -> Result<Option<i64>, LogisticsStoreError> {
        Ok(self
            .working
            .holds
            .values()
            .filter(|hold| {
                hold.status == HoldStatus::Scanned
                    && hold.station() == station
                    && &hold.session_id == session
            })
            .map(|hold| hold.item.order_number)
            .max())
    }

    async fn max_scan_order(
        &mut self,
        session: &SessionId,
    ) -> Result<Option<i32>, LogisticsStoreError> {
        Ok(self
            .working
            .active_holds()
            .filter(|hold| &hold.session_id == session)
            .map(|hold| hold.scan_order)
            .max())
    }

    async fn insert_holds(
        &mut self,
        drafts: Vec<ScanHoldDraft>,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError> {
        let mut inserted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let occupied = self.working.active_holds().any(|hold| {
                hold.dolly_id() == &draft.item.dolly_id && hold.vin_id() == &draft.item.vin_id
            });
            if occupied {
                return Err(LogisticsStoreError::query(format!(
                    "active hold already exists for dolly {} vin {}",
                    draft.item.dolly_id, draft.item.vin_id
                )));
            }
            self.working.next_hold_id += 1;
            let hold = ScanHold::from_draft(HoldId::new(self.working.next_hold_id), draft);
            self.working.holds.insert(hold.id, hold.clone());
            inserted.push(hold);
        }
        Ok(inserted)
    }

    async fn last_scanned_holds(
        &mut self,
        station: &StationId,
        operator: &OperatorId,
        session: &SessionId,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError> {
        let candidates: Vec<_> = self
            .working
            .holds
            .values()
            .filter(|hold| {
                hold.status == HoldStatus::Scanned
                    && hold.station() == station
                    && &hold.operator == operator
                    && &hold.session_id == session
            })
            .collect();
        let Some(last) = candidates
            .iter()
            .max_by_key(|hold| (hold.scanned_at, hold.scan_order, hold.id))
        else {
            return Ok(Vec::new());
        };
        let (dolly, scan_order) = (last.dolly_id().clone(), last.scan_order);
        Ok(candidates
            .into_iter()
            .filter(|hold| hold.dolly_id() == &dolly && hold.scan_order == scan_order)
            .cloned()
            .collect())
    }

    async fn scanned_holds_in_session(
        &mut self,
        session: &SessionId,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError> {
        Ok(self
            .working
            .holds
            .values()
            .filter(|hold| hold.status == HoldStatus::Scanned && &hold.session_id == session)
            .cloned()
            .collect())
    }

    async fn holds_in_batch(
        &mut self,
        batch: &BatchId,
        status: HoldStatus,
    ) -> Result<Vec<ScanHold>, LogisticsStoreError> {
        Ok(self
            .working
            .holds
            .values()
            .filter(|hold| hold.status == status && hold.batch_id.as_ref() == Some(batch))
            .cloned()
            .collect())
    }

    async fn update_holds(&mut self, holds: &[ScanHold]) -> Result<(), LogisticsStoreError> {
        for hold in holds {
            let Some(slot) = self.working.holds.get_mut(&hold.id) else {
                return Err(LogisticsStoreError::query(format!("hold {} not found", hold.id)));
            };
            *slot = hold.clone();
        }
        Ok(())
    }

    async fn delete_holds(&mut self, ids: &[HoldId]) -> Result<(), LogisticsStoreError> {
        for id in ids {
            self.working.holds.remove(id);
        }
        Ok(())
    }

    async fn pair_location(
        &mut self,
        dolly: &DollyId,
        vin: &VinId,
    ) -> Result<Option<PairLocation>, LogisticsStoreError> {
        let key = (dolly.clone(), vin.clone());
        if self.working.queue.iter().any(|item| item.key() == key) {
            return Ok(Some(PairLocation::Queued));
        }
        if self
            .working
            .active_holds()
            .any(|hold| hold.dolly_id() == dolly && hold.vin_id() == vin)
        {
            return Ok(Some(PairLocation::Held));
        }
        if self
            .working
            .shipments
            .iter()
            .any(|record| &record.dolly_id == dolly && &record.vin_id == vin)
        {
            return Ok(Some(PairLocation::Shipped));
        }
        Ok(None)
    }

    async fn max_batch_counter(
        &mut self,
        date: NaiveDate,
    ) -> Result<Option<u32>, LogisticsStoreError> {
        let prefix = BatchId::prefix_for(date);
        Ok(self
            .working
            .tasks
            .keys()
            .filter(|batch| batch.as_str().starts_with(&prefix))
            .map(BatchId::counter)
            .max())
    }

    async fn insert_operator_task(
        &mut self,
        task: &OperatorTask,
    ) -> Result<(), LogisticsStoreError> {
        if self.working.tasks.contains_key(&task.batch_id) {
            return Err(LogisticsStoreError::query(format!(
                "operator task {} already exists",
                task.batch_id
            )));
        }
        self.working
            .tasks
            .insert(task.batch_id.clone(), task.clone());
        Ok(())
    }

    async fn operator_task(
        &mut self,
        batch: &BatchId,
    ) -> Result<Option<OperatorTask>, LogisticsStoreError> {
        Ok(self.working.tasks.get(batch).cloned())
    }

    async fn update_operator_task(
        &mut self,
        task: &OperatorTask,
    ) -> Result<(), LogisticsStoreError> {
        self.working
            .tasks
            .insert(task.batch_id.clone(), task.clone());
        Ok(())
    }

    async fn trip_exists(&mut self, trip: &TripId) -> Result<bool, LogisticsStoreError> {
        Ok(self
            .working
            .shipments
            .iter()
            .any(|record| &record.trip_id == trip))
    }

    async fn production_dates(
        &mut self,
        dollies: &[DollyId],
    ) -> Result<BTreeMap<DollyId, DateTime<Utc>>, LogisticsStoreError> {
        Ok(dollies
            .iter()
            .filter_map(|dolly| {
                self.working
                    .history
                    .get(dolly)
                    .map(|at| (dolly.clone(), *at))
            })
            .collect())
    }

    async fn insert_shipment_records(
        &mut self,
        records: &[ShipmentRecord],
    ) -> Result<(), LogisticsStoreError> {
        self.working.shipments.extend_from_slice(records);
        Ok(())
    }

    async fn archive_queue_item(
        &mut self,
        draft: RemovedQueueItemDraft,
    ) -> Result<RemovedQueueItem, LogisticsStoreError> {
        self.working.next_archive_id += 1;
        let removed = RemovedQueueItem {
            archive_id: self.working.next_archive_id,
            item: draft.item,
            removed_by: draft.removed_by,
            reason: draft.reason,
            removed_at: draft.removed_at,
        };
        self.working
            .removed
            .insert(removed.archive_id, removed.clone());
        Ok(removed)
    }

    async fn removed_item(
        &mut self,
        archive_id: i64,
    ) -> Result<Option<RemovedQueueItem>, LogisticsStoreError> {
        Ok(self.working.removed.get(&archive_id).cloned())
    }

    async fn delete_removed_item(&mut self, archive_id: i64) -> Result<(), LogisticsStoreError> {
        self.working.removed.remove(&archive_id);
        Ok(())
    }

    async fn append_lifecycle(
        &mut self,
        events: &[LifecycleEvent],
    ) -> Result<(), LogisticsStoreError> {
        self.working.lifecycle.extend_from_slice(events);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LogisticsStoreError> {
        let Self {
            mut guard,
            working,
            fail_commit,
        } = *self;
        if fail_commit {
            return Err(LogisticsStoreError::connection("commit failed (injected)"));
        }
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LogisticsStoreError> {
        Ok(())
    }
}
