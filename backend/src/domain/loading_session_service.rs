//! Loading session coordinator.
//!
//! Closing a session moves every `scanned` hold of the session to
//! `loading_completed`, assigns the next batch id of the day, and opens the
//! operator task the shipment desk works from.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::lifecycle_log::LifecycleLog;
use crate::domain::ports::{
    AuditEntry, BatchDetails, CompleteSessionRequest, LoadingSessionCommand, LoadingSessionQuery,
    LogisticsTransaction, SessionCompletion, SessionSummary, WorkflowNotification,
};
use crate::domain::workflow_support::{WorkflowPorts, finish, map_store_error};
use crate::domain::{
    BatchId, ConfirmationChannel, Error, HoldStatus, LifecycleEvent, LifecycleSource,
    LifecycleStatus, OperatorId, OperatorTask, ScanHold, SessionId, StationId, TaskStatus,
};

/// Highest per-day counter a batch id can encode.
const MAX_BATCH_COUNTER: u32 = 9_999;

/// Error raised while parsing `STATION=channel` entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StationChannelError {
    #[error("station channel entry must look like STATION=channel: {0}")]
    Malformed(String),
    #[error("invalid station in channel entry {entry}: {message}")]
    Station { entry: String, message: String },
    #[error("invalid channel in entry {entry}: {message}")]
    Channel { entry: String, message: String },
}

/// Confirmation channel configured per grouping station.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationChannels(BTreeMap<StationId, ConfirmationChannel>);

impl StationChannels {
    /// Parse `STATION=channel` entries such as `EOL1=asn`.
    ///
    /// # Examples
    /// ```
    /// use dolly_backend::domain::{ConfirmationChannel, StationChannels, StationId};
    ///
    /// let channels = StationChannels::parse_entries(["EOL1=asn"]).expect("entries");
    /// let eol1 = StationId::new("EOL1").expect("station");
    /// let eol2 = StationId::new("EOL2").expect("station");
    /// assert_eq!(channels.channel_for(&eol1), ConfirmationChannel::Asn);
    /// assert_eq!(channels.channel_for(&eol2), ConfirmationChannel::Both);
    /// ```
    pub fn parse_entries<I, S>(entries: I) -> Result<Self, StationChannelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut channels = BTreeMap::new();
        for entry in entries {
            let entry = entry.as_ref();
            let Some((station, channel)) = entry.split_once('=') else {
                return Err(StationChannelError::Malformed(entry.to_owned()));
            };
            let station =
                StationId::new(station).map_err(|error| StationChannelError::Station {
                    entry: entry.to_owned(),
                    message: error.to_string(),
                })?;
            let channel = channel
                .parse::<ConfirmationChannel>()
                .map_err(|error| StationChannelError::Channel {
                    entry: entry.to_owned(),
                    message: error.to_string(),
                })?;
            channels.insert(station, channel);
        }
        Ok(Self(channels))
    }

    /// Channel tag for `station`, `both` when none is configured.
    pub fn channel_for(&self, station: &StationId) -> ConfirmationChannel {
        self.0.get(station).copied().unwrap_or_default()
    }
}

/// Loading session service implementing the session command and query ports.
#[derive(Clone)]
pub struct LoadingSessionService {
    ports: WorkflowPorts,
    channels: StationChannels,
}

impl LoadingSessionService {
    /// Create the coordinator.
    pub fn new(ports: WorkflowPorts, channels: StationChannels) -> Self {
        Self { ports, channels }
    }

    async fn stage_completion(
        &self,
        tx: &mut dyn LogisticsTransaction,
        request: &CompleteSessionRequest,
        now: DateTime<Utc>,
    ) -> Result<SessionCompletion, Error> {
        let holds = tx
            .scanned_holds_in_session(&request.session_id)
            .await
            .map_err(map_store_error)?;
        let Some(first) = holds.first() else {
            return Err(Error::empty_session(format!(
                "session {} has no scanned dollies",
                request.session_id
            ))
            .with_details(json!({ "sessionId": request.session_id })));
        };
        let channel = self.channels.channel_for(first.station());

        let batch_id = next_batch_id(tx, now.date_naive()).await?;
        let total = i32::try_from(holds.len())
            .map_err(|_| Error::system("session holds exceed task capacity"))?;

        let completed: Vec<ScanHold> = holds
            .into_iter()
            .map(|mut hold| {
                hold.status = HoldStatus::LoadingCompleted;
                hold.batch_id = Some(batch_id.clone());
                hold.loading_completed_at = Some(now);
                hold.updated_at = now;
                hold
            })
            .collect();
        tx.update_holds(&completed).await.map_err(map_store_error)?;

        let task = OperatorTask::new(batch_id.clone(), channel, total, now);
        tx.insert_operator_task(&task)
            .await
            .map_err(map_store_error)?;

        let events: Vec<_> = completed
            .iter()
            .map(|hold| {
                LifecycleEvent::new(
                    hold.dolly_id().clone(),
                    hold.vin_id().clone(),
                    LifecycleStatus::LoadingCompleted,
                    LifecycleSource::Forklift,
                    now,
                )
                .with_meta("sessionId", request.session_id.as_str())
                .with_meta("batchId", batch_id.as_str())
                .with_meta("operator", request.operator.as_str())
            })
            .collect();
        LifecycleLog::stage(tx, &events)
            .await
            .map_err(map_store_error)?;

        Ok(SessionCompletion {
            session_id: request.session_id.clone(),
            batch_id,
            item_count: completed.len(),
            channel,
        })
    }
}

async fn next_batch_id(
    tx: &mut dyn LogisticsTransaction,
    date: NaiveDate,
) -> Result<BatchId, Error> {
    // Counter 0 is never assigned; its lock guards the day's allocation.
    tx.lock_batch(&BatchId::compose(date, 0))
        .await
        .map_err(map_store_error)?;
    let counter = tx
        .max_batch_counter(date)
        .await
        .map_err(map_store_error)?
        .unwrap_or(0)
        + 1;
    if counter > MAX_BATCH_COUNTER {
        return Err(Error::system(format!("batch counter exhausted for {date}")));
    }
    Ok(BatchId::compose(date, counter))
}

fn summarise_sessions(holds: Vec<ScanHold>) -> Vec<SessionSummary> {
    let mut groups: BTreeMap<(SessionId, HoldStatus, OperatorId), SessionSummary> =
        BTreeMap::new();
    for hold in holds {
        let key = (hold.session_id.clone(), hold.status, hold.operator.clone());
        let summary = groups.entry(key).or_insert_with(|| SessionSummary {
            session_id: hold.session_id.clone(),
            status: hold.status,
            operator: hold.operator.clone(),
            item_count: 0,
            first_scan_at: hold.scanned_at,
            loading_completed_at: None,
            batch_id: None,
        });
        summary.item_count += 1;
        summary.first_scan_at = summary.first_scan_at.min(hold.scanned_at);
        summary.loading_completed_at = summary.loading_completed_at.max(hold.loading_completed_at);
        if summary.batch_id.is_none() {
            summary.batch_id = hold.batch_id;
        }
    }
    let mut summaries: Vec<_> = groups.into_values().collect();
    summaries.sort_by(|a, b| {
        b.first_scan_at
            .cmp(&a.first_scan_at)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    summaries
}

fn batch_details(
    batch_id: BatchId,
    task: Option<OperatorTask>,
    mut holds: Vec<ScanHold>,
) -> BatchDetails {
    holds.sort_by_key(|hold| (hold.scan_order, hold.id));
    match task {
        Some(task) => BatchDetails {
            batch_id,
            channel: task.channel,
            task_status: task.status,
            total_items: task.total_items,
            processed_items: task.processed_items,
            holds,
        },
        None => BatchDetails {
            batch_id,
            channel: ConfirmationChannel::default(),
            task_status: TaskStatus::Pending,
            total_items: i32::try_from(holds.len()).unwrap_or(i32::MAX),
            processed_items: 0,
            holds,
        },
    }
}

#[async_trait]
impl LoadingSessionCommand for LoadingSessionService {
    async fn complete_session(
        &self,
        request: CompleteSessionRequest,
    ) -> Result<SessionCompletion, Error> {
        let now = self.ports.clock.utc();
        let mut tx = self.ports.store.begin().await.map_err(map_store_error)?;
        let staged = self.stage_completion(tx.as_mut(), &request, now).await;
        let completion = finish(tx, staged).await.inspect_err(|error| {
            warn!(
                session_id = %request.session_id,
                operator = %request.operator,
                error_code = ?error.code(),
                error = %error,
                "session completion rejected"
            );
        })?;

        info!(
            session_id = %completion.session_id,
            batch_id = %completion.batch_id,
            items = completion.item_count,
            channel = %completion.channel,
            "loading session completed"
        );
        self.ports
            .notifications
            .publish(WorkflowNotification::SessionCompleted {
                session_id: completion.session_id.clone(),
                batch_id: completion.batch_id.clone(),
                item_count: completion.item_count,
            });
        self.ports
            .record_audit(AuditEntry {
                action: "session_completed",
                actor: request.operator,
                subject: completion.batch_id.to_string(),
                details: json!({
                    "sessionId": completion.session_id,
                    "itemCount": completion.item_count,
                    "channel": completion.channel,
                }),
                at: now,
            })
            .await;
        Ok(completion)
    }
}

#[async_trait]
impl LoadingSessionQuery for LoadingSessionService {
    async fn list_sessions(
        &self,
        status: Option<HoldStatus>,
    ) -> Result<Vec<SessionSummary>, Error> {
        let mut holds = self
            .ports
            .store
            .holds(status)
            .await
            .map_err(map_store_error)?;
        if status.is_none() {
            holds.retain(|hold| hold.status.is_active());
        }
        Ok(summarise_sessions(holds))
    }

    async fn pending_shipments(&self) -> Result<Vec<BatchDetails>, Error> {
        let holds = self
            .ports
            .store
            .holds(Some(HoldStatus::LoadingCompleted))
            .await
            .map_err(map_store_error)?;
        let mut by_batch: BTreeMap<BatchId, Vec<ScanHold>> = BTreeMap::new();
        for hold in holds {
            if let Some(batch) = hold.batch_id.clone() {
                by_batch.entry(batch).or_default().push(hold);
            }
        }
        let batches: Vec<_> = by_batch.keys().cloned().collect();
        let mut tasks: BTreeMap<BatchId, OperatorTask> = self
            .ports
            .store
            .operator_tasks(&batches)
            .await
            .map_err(map_store_error)?
            .into_iter()
            .map(|task| (task.batch_id.clone(), task))
            .collect();

        Ok(by_batch
            .into_iter()
            .map(|(batch, holds)| {
                let task = tasks.remove(&batch);
                batch_details(batch, task, holds)
            })
            .collect())
    }

    async fn batch_details(&self, batch: BatchId) -> Result<BatchDetails, Error> {
        let holds: Vec<_> = self
            .ports
            .store
            .batch_holds(&batch)
            .await
            .map_err(map_store_error)?
            .into_iter()
            .filter(|hold| hold.status == HoldStatus::LoadingCompleted)
            .collect();
        let task = self
            .ports
            .store
            .operator_tasks(std::slice::from_ref(&batch))
            .await
            .map_err(map_store_error)?
            .into_iter()
            .next();
        if task.is_none() && holds.is_empty() {
            return Err(Error::not_found(format!("batch {batch} not found"))
                .with_details(json!({ "batchId": batch })));
        }
        Ok(batch_details(batch, task, holds))
    }
}

#[cfg(test)]
#[path = "loading_session_service_tests.rs"]
mod tests;
