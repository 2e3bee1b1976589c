//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions validate every identifier and
//! status label read back from storage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::{
    lifecycle_events, operator_tasks, queue_items, removed_queue_items, scan_holds,
    shipment_records,
};
use crate::domain::ports::LogisticsStoreError;
use crate::domain::{
    HoldId, LifecycleEvent, Metadata, OperatorTask, QueueItem, RemovedQueueItem, ScanHold,
    ScanHoldDraft, ShipmentRecord,
};

/// Decode a stored identifier or label, reporting corrupt rows as query errors.
pub(crate) fn decode<T>(column: &'static str, value: String) -> Result<T, LogisticsStoreError>
where
    T: TryFrom<String>,
    T::Error: fmt::Display,
{
    T::try_from(value)
        .map_err(|error| LogisticsStoreError::query(format!("corrupt {column} column: {error}")))
}

fn decode_label<T>(column: &'static str, value: &str) -> Result<T, LogisticsStoreError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|error| LogisticsStoreError::query(format!("corrupt {column} column: {error}")))
}

fn decode_optional<T>(
    column: &'static str,
    value: Option<String>,
) -> Result<Option<T>, LogisticsStoreError>
where
    T: TryFrom<String>,
    T::Error: fmt::Display,
{
    value.map(|inner| decode(column, inner)).transpose()
}

pub(crate) fn metadata_to_json(metadata: &Metadata) -> Value {
    Value::Object(
        metadata
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

fn metadata_from_json(value: Value) -> Result<Metadata, LogisticsStoreError> {
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(Metadata::new()),
        other => Err(LogisticsStoreError::query(format!(
            "corrupt metadata column: expected object, found {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = queue_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct QueueItemRow {
    pub dolly_id: String,
    pub vin_id: String,
    pub customer_reference: String,
    pub station: String,
    pub quantity: i32,
    pub produced_at: Option<DateTime<Utc>>,
    pub order_number: i64,
    pub barcode: Option<String>,
}

impl From<&QueueItem> for QueueItemRow {
    fn from(item: &QueueItem) -> Self {
        Self {
            dolly_id: item.dolly_id.to_string(),
            vin_id: item.vin_id.to_string(),
            customer_reference: item.customer_reference.clone(),
            station: item.station.to_string(),
            quantity: item.quantity,
            produced_at: item.produced_at,
            order_number: item.order_number,
            barcode: item.barcode.clone(),
        }
    }
}

impl QueueItemRow {
    pub(crate) fn into_domain(self) -> Result<QueueItem, LogisticsStoreError> {
        Ok(QueueItem {
            dolly_id: decode("dolly_id", self.dolly_id)?,
            vin_id: decode("vin_id", self.vin_id)?,
            customer_reference: self.customer_reference,
            station: decode("station", self.station)?,
            quantity: self.quantity,
            produced_at: self.produced_at,
            order_number: self.order_number,
            barcode: self.barcode,
        })
    }
}

// ---------------------------------------------------------------------------
// Scan holds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scan_holds)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ScanHoldRow {
    pub id: i64,
    pub status: String,
    pub session_id: String,
    pub scan_order: i32,
    pub operator_id: String,
    pub batch_id: Option<String>,
    pub dolly_id: String,
    pub vin_id: String,
    pub customer_reference: String,
    pub station: String,
    pub quantity: i32,
    pub produced_at: Option<DateTime<Utc>>,
    pub order_number: i64,
    pub barcode: Option<String>,
    pub trip_id: Option<String>,
    pub plate_id: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub loading_completed_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub metadata: Value,
}

impl ScanHoldRow {
    pub(crate) fn into_domain(self) -> Result<ScanHold, LogisticsStoreError> {
        let item = QueueItemRow {
            dolly_id: self.dolly_id,
            vin_id: self.vin_id,
            customer_reference: self.customer_reference,
            station: self.station,
            quantity: self.quantity,
            produced_at: self.produced_at,
            order_number: self.order_number,
            barcode: self.barcode,
        }
        .into_domain()?;
        Ok(ScanHold {
            id: HoldId::new(self.id),
            status: decode_label("status", &self.status)?,
            session_id: decode("session_id", self.session_id)?,
            scan_order: self.scan_order,
            operator: decode("operator_id", self.operator_id)?,
            batch_id: decode_optional("batch_id", self.batch_id)?,
            item,
            trip_id: decode_optional("trip_id", self.trip_id)?,
            plate_id: decode_optional("plate_id", self.plate_id)?,
            scanned_at: self.scanned_at,
            loading_completed_at: self.loading_completed_at,
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
            metadata: metadata_from_json(self.metadata)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scan_holds)]
pub(crate) struct NewScanHoldRow {
    pub status: &'static str,
    pub session_id: String,
    pub scan_order: i32,
    pub operator_id: String,
    pub dolly_id: String,
    pub vin_id: String,
    pub customer_reference: String,
    pub station: String,
    pub quantity: i32,
    pub produced_at: Option<DateTime<Utc>>,
    pub order_number: i64,
    pub barcode: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: Value,
}

impl From<&ScanHoldDraft> for NewScanHoldRow {
    fn from(draft: &ScanHoldDraft) -> Self {
        let item = QueueItemRow::from(&draft.item);
        Self {
            status: crate::domain::HoldStatus::Scanned.as_str(),
            session_id: draft.session_id.to_string(),
            scan_order: draft.scan_order,
            operator_id: draft.operator.to_string(),
            dolly_id: item.dolly_id,
            vin_id: item.vin_id,
            customer_reference: item.customer_reference,
            station: item.station,
            quantity: item.quantity,
            produced_at: item.produced_at,
            order_number: item.order_number,
            barcode: item.barcode,
            scanned_at: draft.scanned_at,
            updated_at: draft.scanned_at,
            metadata: metadata_to_json(&draft.metadata),
        }
    }
}

/// Mutable columns of a hold; `None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = scan_holds)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ScanHoldUpdate {
    pub status: &'static str,
    pub batch_id: Option<String>,
    pub trip_id: Option<String>,
    pub plate_id: Option<String>,
    pub loading_completed_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub metadata: Value,
}

impl From<&ScanHold> for ScanHoldUpdate {
    fn from(hold: &ScanHold) -> Self {
        Self {
            status: hold.status.as_str(),
            batch_id: hold.batch_id.as_ref().map(ToString::to_string),
            trip_id: hold.trip_id.as_ref().map(ToString::to_string),
            plate_id: hold.plate_id.as_ref().map(ToString::to_string),
            loading_completed_at: hold.loading_completed_at,
            submitted_at: hold.submitted_at,
            updated_at: hold.updated_at,
            metadata: metadata_to_json(&hold.metadata),
        }
    }
}

// ---------------------------------------------------------------------------
// Operator tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = operator_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OperatorTaskRow {
    pub batch_id: String,
    pub status: String,
    pub channel: String,
    pub total_items: i32,
    pub processed_items: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&OperatorTask> for OperatorTaskRow {
    fn from(task: &OperatorTask) -> Self {
        Self {
            batch_id: task.batch_id.to_string(),
            status: task.status.as_str().to_owned(),
            channel: task.channel.as_str().to_owned(),
            total_items: task.total_items,
            processed_items: task.processed_items,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl OperatorTaskRow {
    pub(crate) fn into_domain(self) -> Result<OperatorTask, LogisticsStoreError> {
        Ok(OperatorTask {
            batch_id: decode("batch_id", self.batch_id)?,
            status: decode_label("status", &self.status)?,
            channel: decode_label("channel", &self.channel)?,
            total_items: self.total_items,
            processed_items: self.processed_items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = operator_tasks)]
pub(crate) struct OperatorTaskProgress<'a> {
    pub status: &'a str,
    pub processed_items: i32,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Shipment ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shipment_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShipmentRecordRow {
    #[diesel(column_name = id)]
    pub _id: i64,
    pub dolly_id: String,
    pub vin_id: String,
    pub trip_id: String,
    pub plate_id: String,
    pub batch_id: String,
    pub order_number: i64,
    pub customer_reference: String,
    pub quantity: i32,
    pub station: String,
    pub loading_operator: String,
    pub data_entry_operator: String,
    pub produced_at: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
    pub asn_confirmed_at: Option<DateTime<Utc>>,
    pub waybill_confirmed_at: Option<DateTime<Utc>>,
}

impl ShipmentRecordRow {
    pub(crate) fn into_domain(self) -> Result<ShipmentRecord, LogisticsStoreError> {
        Ok(ShipmentRecord {
            dolly_id: decode("dolly_id", self.dolly_id)?,
            vin_id: decode("vin_id", self.vin_id)?,
            trip_id: decode("trip_id", self.trip_id)?,
            plate_id: decode("plate_id", self.plate_id)?,
            batch_id: decode("batch_id", self.batch_id)?,
            order_number: self.order_number,
            customer_reference: self.customer_reference,
            quantity: self.quantity,
            station: decode("station", self.station)?,
            loading_operator: decode("loading_operator", self.loading_operator)?,
            data_entry_operator: decode("data_entry_operator", self.data_entry_operator)?,
            produced_at: self.produced_at,
            loaded_at: self.loaded_at,
            asn_confirmed_at: self.asn_confirmed_at,
            waybill_confirmed_at: self.waybill_confirmed_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shipment_records)]
pub(crate) struct NewShipmentRecordRow {
    pub dolly_id: String,
    pub vin_id: String,
    pub trip_id: String,
    pub plate_id: String,
    pub batch_id: String,
    pub order_number: i64,
    pub customer_reference: String,
    pub quantity: i32,
    pub station: String,
    pub loading_operator: String,
    pub data_entry_operator: String,
    pub produced_at: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
    pub asn_confirmed_at: Option<DateTime<Utc>>,
    pub waybill_confirmed_at: Option<DateTime<Utc>>,
}

impl From<&ShipmentRecord> for NewShipmentRecordRow {
    fn from(record: &ShipmentRecord) -> Self {
        Self {
            dolly_id: record.dolly_id.to_string(),
            vin_id: record.vin_id.to_string(),
            trip_id: record.trip_id.to_string(),
            plate_id: record.plate_id.to_string(),
            batch_id: record.batch_id.to_string(),
            order_number: record.order_number,
            customer_reference: record.customer_reference.clone(),
            quantity: record.quantity,
            station: record.station.to_string(),
            loading_operator: record.loading_operator.to_string(),
            data_entry_operator: record.data_entry_operator.to_string(),
            produced_at: record.produced_at,
            loaded_at: record.loaded_at,
            asn_confirmed_at: record.asn_confirmed_at,
            waybill_confirmed_at: record.waybill_confirmed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Removal archive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = removed_queue_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RemovedQueueItemRow {
    pub archive_id: i64,
    pub dolly_id: String,
    pub vin_id: String,
    pub customer_reference: String,
    pub station: String,
    pub quantity: i32,
    pub produced_at: Option<DateTime<Utc>>,
    pub order_number: i64,
    pub barcode: Option<String>,
    pub removed_by: String,
    pub reason: Option<String>,
    pub removed_at: DateTime<Utc>,
}

impl RemovedQueueItemRow {
    pub(crate) fn into_domain(self) -> Result<RemovedQueueItem, LogisticsStoreError> {
        let item = QueueItemRow {
            dolly_id: self.dolly_id,
            vin_id: self.vin_id,
            customer_reference: self.customer_reference,
            station: self.station,
            quantity: self.quantity,
            produced_at: self.produced_at,
            order_number: self.order_number,
            barcode: self.barcode,
        }
        .into_domain()?;
        Ok(RemovedQueueItem {
            archive_id: self.archive_id,
            item,
            removed_by: decode("removed_by", self.removed_by)?,
            reason: self.reason,
            removed_at: self.removed_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = removed_queue_items)]
pub(crate) struct NewRemovedQueueItemRow {
    pub dolly_id: String,
    pub vin_id: String,
    pub customer_reference: String,
    pub station: String,
    pub quantity: i32,
    pub produced_at: Option<DateTime<Utc>>,
    pub order_number: i64,
    pub barcode: Option<String>,
    pub removed_by: String,
    pub reason: Option<String>,
    pub removed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Lifecycle log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lifecycle_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LifecycleEventRow {
    #[diesel(column_name = id)]
    pub _id: i64,
    pub dolly_id: String,
    pub vin_id: String,
    pub status: String,
    pub source: String,
    pub metadata: Value,
    pub recorded_at: DateTime<Utc>,
}

impl LifecycleEventRow {
    pub(crate) fn into_domain(self) -> Result<LifecycleEvent, LogisticsStoreError> {
        Ok(LifecycleEvent {
            dolly_id: decode("dolly_id", self.dolly_id)?,
            vin_id: decode("vin_id", self.vin_id)?,
            status: decode_label("status", &self.status)?,
            source: decode_label("source", &self.source)?,
            metadata: metadata_from_json(self.metadata)?,
            recorded_at: self.recorded_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lifecycle_events)]
pub(crate) struct NewLifecycleEventRow {
    pub dolly_id: String,
    pub vin_id: String,
    pub status: &'static str,
    pub source: &'static str,
    pub metadata: Value,
    pub recorded_at: DateTime<Utc>,
}

impl From<&LifecycleEvent> for NewLifecycleEventRow {
    fn from(event: &LifecycleEvent) -> Self {
        Self {
            dolly_id: event.dolly_id.to_string(),
            vin_id: event.vin_id.to_string(),
            status: event.status.as_str(),
            source: event.source.as_str(),
            metadata: metadata_to_json(&event.metadata),
            recorded_at: event.recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::{HoldStatus, LifecycleSource, LifecycleStatus};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn hold_row() -> ScanHoldRow {
        ScanHoldRow {
            id: 7,
            status: "loading_completed".to_owned(),
            session_id: "LOAD_20260302_060000_OP1".to_owned(),
            scan_order: 2,
            operator_id: "OP1".to_owned(),
            batch_id: Some("PT202603020001".to_owned()),
            dolly_id: "D1".to_owned(),
            vin_id: "V1".to_owned(),
            customer_reference: "REF-V1".to_owned(),
            station: "EOL1".to_owned(),
            quantity: 1,
            produced_at: None,
            order_number: 5,
            barcode: None,
            trip_id: None,
            plate_id: None,
            scanned_at: at(),
            loading_completed_at: Some(at()),
            submitted_at: None,
            updated_at: at(),
            metadata: json!({ "source": "gun-3" }),
        }
    }

    #[rstest]
    fn hold_rows_decode_into_domain_holds() {
        let hold = hold_row().into_domain().expect("valid row");
        assert_eq!(hold.id, HoldId::new(7));
        assert_eq!(hold.status, HoldStatus::LoadingCompleted);
        assert_eq!(hold.dolly_id().as_str(), "D1");
        assert_eq!(
            hold.batch_id.as_ref().map(ToString::to_string).as_deref(),
            Some("PT202603020001")
        );
        assert_eq!(hold.metadata.get("source"), Some(&json!("gun-3")));
    }

    #[rstest]
    #[case::status(|row: &mut ScanHoldRow| row.status = "lost".to_owned(), "status")]
    #[case::batch(|row: &mut ScanHoldRow| row.batch_id = Some("B-1".to_owned()), "batch_id")]
    #[case::dolly(|row: &mut ScanHoldRow| row.dolly_id = "  ".to_owned(), "dolly_id")]
    #[case::metadata(|row: &mut ScanHoldRow| row.metadata = json!([1, 2]), "metadata")]
    fn corrupt_hold_rows_are_query_errors(
        #[case] corrupt: fn(&mut ScanHoldRow),
        #[case] column: &str,
    ) {
        let mut row = hold_row();
        corrupt(&mut row);
        let error = row.into_domain().expect_err("corrupt row");
        assert!(matches!(error, LogisticsStoreError::Query { .. }));
        assert!(error.to_string().contains(column));
    }

    #[rstest]
    fn lifecycle_events_round_trip_their_labels() {
        let event = LifecycleEvent::new(
            crate::domain::DollyId::new("D1").expect("dolly"),
            crate::domain::VinId::new("V1").expect("vin"),
            LifecycleStatus::CompletedBoth,
            LifecycleSource::Operator,
            at(),
        )
        .with_meta("tripId", "TR0001");
        let new_row = NewLifecycleEventRow::from(&event);
        let stored = LifecycleEventRow {
            _id: 1,
            dolly_id: new_row.dolly_id,
            vin_id: new_row.vin_id,
            status: new_row.status.to_owned(),
            source: new_row.source.to_owned(),
            metadata: new_row.metadata,
            recorded_at: new_row.recorded_at,
        };
        assert_eq!(stored.into_domain().expect("valid row"), event);
    }
}
