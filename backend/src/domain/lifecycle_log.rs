//! Append-only lifecycle event log.
//!
//! Other services stage events into their own open transaction through
//! [`LifecycleLog::stage`]; [`LifecycleLog::record`] is the standalone form
//! for callers outside a workflow transaction.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{LifecycleQuery, LogisticsStoreError, LogisticsTransaction};
use crate::domain::workflow_support::{WorkflowPorts, finish, map_store_error};
use crate::domain::{
    DollyId, Error, LifecycleEvent, LifecycleSource, LifecycleStatus, Metadata, VinId,
};

/// Lifecycle log service.
#[derive(Clone)]
pub struct LifecycleLog {
    ports: WorkflowPorts,
}

impl LifecycleLog {
    /// Create the log over the shared workflow ports.
    pub fn new(ports: WorkflowPorts) -> Self {
        Self { ports }
    }

    /// Record one event in its own transaction.
    pub async fn record(
        &self,
        dolly_id: DollyId,
        vin_id: VinId,
        status: LifecycleStatus,
        source: LifecycleSource,
        metadata: Metadata,
    ) -> Result<(), Error> {
        let event = LifecycleEvent {
            dolly_id,
            vin_id,
            status,
            source,
            metadata,
            recorded_at: self.ports.clock.utc(),
        };
        let mut tx = self.ports.store.begin().await.map_err(map_store_error)?;
        let staged = Self::stage(tx.as_mut(), &[event])
            .await
            .map_err(map_store_error);
        finish(tx, staged).await
    }

    /// Stage events into an open transaction.
    pub async fn stage(
        tx: &mut dyn LogisticsTransaction,
        events: &[LifecycleEvent],
    ) -> Result<(), LogisticsStoreError> {
        let Some(first) = events.first() else {
            return Ok(());
        };
        debug!(count = events.len(), status = %first.status, "staging lifecycle events");
        tx.append_lifecycle(events).await
    }
}

#[async_trait]
impl LifecycleQuery for LifecycleLog {
    async fn trail(&self, dolly: DollyId) -> Result<Vec<LifecycleEvent>, Error> {
        self.ports
            .store
            .lifecycle_trail(&dolly)
            .await
            .map_err(map_store_error)
    }
}
