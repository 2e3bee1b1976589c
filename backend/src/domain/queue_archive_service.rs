//! Supervisor removal and restoration of queued dollies.
//!
//! Both operations process every requested entry inside one transaction and
//! report per-entry failures instead of aborting the whole request.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::lifecycle_log::LifecycleLog;
use crate::domain::ports::{
    ArchiveOutcome, AuditEntry, ItemFailure, LogisticsTransaction, PairLocation,
    QueueArchiveCommand, RemoveFromQueueRequest, RemovedQueueItemDraft,
    RestoreFromArchiveRequest, WorkflowNotification,
};
use crate::domain::workflow_support::{WorkflowPorts, finish, map_store_error};
use crate::domain::{
    Error, LifecycleEvent, LifecycleSource, LifecycleStatus, RemovedQueueItem,
};

/// Queue archive service implementing [`QueueArchiveCommand`].
#[derive(Clone)]
pub struct QueueArchiveService {
    ports: WorkflowPorts,
}

impl QueueArchiveService {
    /// Create the service over the shared workflow ports.
    pub fn new(ports: WorkflowPorts) -> Self {
        Self { ports }
    }

    async fn stage_removal(
        &self,
        tx: &mut dyn LogisticsTransaction,
        request: &RemoveFromQueueRequest,
        now: DateTime<Utc>,
    ) -> Result<ArchiveOutcome, Error> {
        let mut outcome = ArchiveOutcome::default();
        let mut events = Vec::new();
        let keys: BTreeSet<_> = request.items.iter().cloned().collect();

        for (dolly, vin) in keys {
            let label = format!("{dolly}/{vin}");
            let Some(item) = tx.queue_item(&dolly, &vin).await.map_err(map_store_error)? else {
                outcome.failed.push(ItemFailure {
                    item: label,
                    reason: "not in queue".to_owned(),
                });
                continue;
            };
            tx.lock_station(&item.station)
                .await
                .map_err(map_store_error)?;
            tx.delete_queue_items(&[item.key()])
                .await
                .map_err(map_store_error)?;
            let archived = tx
                .archive_queue_item(RemovedQueueItemDraft {
                    item,
                    removed_by: request.removed_by.clone(),
                    reason: request.reason.clone(),
                    removed_at: now,
                })
                .await
                .map_err(map_store_error)?;

            let mut event = LifecycleEvent::new(
                dolly,
                vin,
                LifecycleStatus::QueueRemoved,
                LifecycleSource::Supervisor,
                now,
            )
            .with_meta("removedBy", request.removed_by.as_str())
            .with_meta("archiveId", archived.archive_id);
            if let Some(reason) = &request.reason {
                event = event.with_meta("reason", reason.as_str());
            }
            events.push(event);
            outcome.succeeded += 1;
        }

        LifecycleLog::stage(tx, &events)
            .await
            .map_err(map_store_error)?;
        Ok(outcome)
    }

    async fn stage_restore(
        &self,
        tx: &mut dyn LogisticsTransaction,
        request: &RestoreFromArchiveRequest,
        now: DateTime<Utc>,
    ) -> Result<ArchiveOutcome, Error> {
        let mut outcome = ArchiveOutcome::default();
        let mut events = Vec::new();
        let ids: BTreeSet<i64> = request.archive_ids.iter().copied().collect();

        for archive_id in ids {
            let Some(archived) = tx
                .removed_item(archive_id)
                .await
                .map_err(map_store_error)?
            else {
                outcome.failed.push(ItemFailure {
                    item: archive_id.to_string(),
                    reason: "archive entry not found".to_owned(),
                });
                continue;
            };
            let item = archived.item;
            tx.lock_station(&item.station)
                .await
                .map_err(map_store_error)?;
            if let Some(location) = tx
                .pair_location(&item.dolly_id, &item.vin_id)
                .await
                .map_err(map_store_error)?
            {
                outcome.failed.push(ItemFailure {
                    item: format!("{}/{}", item.dolly_id, item.vin_id),
                    reason: occupied_reason(location).to_owned(),
                });
                continue;
            }

            tx.insert_queue_items(std::slice::from_ref(&item))
                .await
                .map_err(map_store_error)?;
            tx.delete_removed_item(archive_id)
                .await
                .map_err(map_store_error)?;
            events.push(
                LifecycleEvent::new(
                    item.dolly_id,
                    item.vin_id,
                    LifecycleStatus::EolReady,
                    LifecycleSource::Supervisor,
                    now,
                )
                .with_meta("restoredBy", request.restored_by.as_str())
                .with_meta("archiveId", archive_id),
            );
            outcome.succeeded += 1;
        }

        LifecycleLog::stage(tx, &events)
            .await
            .map_err(map_store_error)?;
        Ok(outcome)
    }
}

const fn occupied_reason(location: PairLocation) -> &'static str {
    match location {
        PairLocation::Queued => "already queued",
        PairLocation::Held => "already scanned",
        PairLocation::Shipped => "already shipped",
    }
}

#[async_trait]
impl QueueArchiveCommand for QueueArchiveService {
    async fn remove_from_queue(
        &self,
        request: RemoveFromQueueRequest,
    ) -> Result<ArchiveOutcome, Error> {
        if request.items.is_empty() {
            return Err(Error::validation("select at least one queue item")
                .with_details(json!({ "field": "items" })));
        }
        let now = self.ports.clock.utc();
        let mut tx = self.ports.store.begin().await.map_err(map_store_error)?;
        let staged = self.stage_removal(tx.as_mut(), &request, now).await;
        let outcome = finish(tx, staged).await.inspect_err(|error| {
            warn!(removed_by = %request.removed_by, error = %error, "queue removal failed");
        })?;

        info!(
            removed_by = %request.removed_by,
            removed = outcome.succeeded,
            failed = outcome.failed.len(),
            "queue items archived"
        );
        if outcome.succeeded > 0 {
            self.ports
                .notifications
                .publish(WorkflowNotification::QueueChanged {
                    removed: outcome.succeeded,
                    restored: 0,
                });
        }
        self.ports
            .record_audit(AuditEntry {
                action: "queue_items_removed",
                actor: request.removed_by,
                subject: format!("{} items", request.items.len()),
                details: json!({
                    "removed": outcome.succeeded,
                    "failed": outcome.failed.len(),
                    "reason": request.reason,
                }),
                at: now,
            })
            .await;
        Ok(outcome)
    }

    async fn restore_from_archive(
        &self,
        request: RestoreFromArchiveRequest,
    ) -> Result<ArchiveOutcome, Error> {
        if request.archive_ids.is_empty() {
            return Err(Error::validation("select at least one archive entry")
                .with_details(json!({ "field": "archiveIds" })));
        }
        let now = self.ports.clock.utc();
        let mut tx = self.ports.store.begin().await.map_err(map_store_error)?;
        let staged = self.stage_restore(tx.as_mut(), &request, now).await;
        let outcome = finish(tx, staged).await.inspect_err(|error| {
            warn!(restored_by = %request.restored_by, error = %error, "queue restore failed");
        })?;

        info!(
            restored_by = %request.restored_by,
            restored = outcome.succeeded,
            failed = outcome.failed.len(),
            "archived items restored"
        );
        if outcome.succeeded > 0 {
            self.ports
                .notifications
                .publish(WorkflowNotification::QueueChanged {
                    removed: 0,
                    restored: outcome.succeeded,
                });
        }
        self.ports
            .record_audit(AuditEntry {
                action: "queue_items_restored",
                actor: request.restored_by,
                subject: format!("{} archive entries", request.archive_ids.len()),
                details: json!({
                    "restored": outcome.succeeded,
                    "failed": outcome.failed.len(),
                }),
                at: now,
            })
            .await;
        Ok(outcome)
    }

    async fn list_removed(&self) -> Result<Vec<RemovedQueueItem>, Error> {
        self.ports
            .store
            .removed_items()
            .await
            .map_err(map_store_error)
    }
}

#[cfg(test)]
#[path = "queue_archive_service_tests.rs"]
mod tests;
