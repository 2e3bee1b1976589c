//! Shipment transaction coordinator.
//!
//! A shipment is staged inside one store transaction: holds are stamped,
//! shipment records are built, and the carrier is asked for confirmation
//! before anything is committed. Only an accepted submission commits; every
//! other outcome rolls the whole stage back.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::lifecycle_log::LifecycleLog;
use crate::domain::ports::{
    AuditEntry, CarrierGateway, CarrierGatewayError, CarrierItem, CompleteShipmentRequest,
    LogisticsTransaction, ShipmentCommand, ShipmentSummary, WorkflowNotification,
};
use crate::domain::workflow_support::{WorkflowPorts, finish, map_store_error};
use crate::domain::{
    BatchId, DollyId, Error, HoldId, HoldStatus, LifecycleEvent, LifecycleSource,
    LifecycleStatus, PlateId, ScanHold, ShipmentRecord, TripId,
};

/// Reason code sent when the operator does not supply one.
pub const DEFAULT_REASON_CODE: &str = "TRC-00";

/// Shipment service implementing [`ShipmentCommand`].
#[derive(Clone)]
pub struct ShipmentService {
    ports: WorkflowPorts,
    gateway: Arc<dyn CarrierGateway>,
}

struct ValidatedShipment {
    trip: TripId,
    plate: PlateId,
    waybill_number: String,
    reason_code: String,
}

impl ShipmentService {
    /// Create the coordinator over the shared ports and a carrier gateway.
    pub fn new(ports: WorkflowPorts, gateway: Arc<dyn CarrierGateway>) -> Self {
        Self { ports, gateway }
    }

    async fn stage_shipment(
        &self,
        tx: &mut dyn LogisticsTransaction,
        request: &CompleteShipmentRequest,
        shipment: &ValidatedShipment,
        now: DateTime<Utc>,
    ) -> Result<ShipmentSummary, Error> {
        let ValidatedShipment { trip, plate, .. } = shipment;
        let batch = &request.batch_id;

        tx.lock_trip(trip).await.map_err(map_store_error)?;
        if tx.trip_exists(trip).await.map_err(map_store_error)? {
            return Err(Error::duplicate_trip(format!("trip {trip} was already shipped"))
                .with_details(json!({ "tripId": trip })));
        }

        tx.lock_batch(batch).await.map_err(map_store_error)?;
        let available = tx
            .holds_in_batch(batch, HoldStatus::LoadingCompleted)
            .await
            .map_err(map_store_error)?;
        if available.is_empty() {
            return Err(Error::not_found(format!(
                "batch {batch} has no holds awaiting shipment"
            ))
            .with_details(json!({ "batchId": batch })));
        }
        let mut holds = select_holds(available, request.selected_hold_ids.as_deref(), batch)?;
        holds.sort_by_key(|hold| (hold.scan_order, hold.id));

        for hold in &mut holds {
            hold.trip_id = Some(trip.clone());
            hold.plate_id = Some(plate.clone());
            hold.status = HoldStatus::Completed;
            hold.submitted_at = Some(now);
            hold.updated_at = now;
        }
        tx.update_holds(&holds).await.map_err(map_store_error)?;

        let dollies: Vec<DollyId> = holds
            .iter()
            .map(|hold| hold.dolly_id().clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let history = tx
            .production_dates(&dollies)
            .await
            .map_err(map_store_error)?;

        let records: Vec<ShipmentRecord> = holds
            .iter()
            .map(|hold| build_record(hold, request, shipment, &history, now))
            .collect();
        let items: Vec<CarrierItem> = holds
            .iter()
            .zip(&records)
            .map(|(hold, record)| CarrierItem {
                dolly_id: hold.dolly_id().clone(),
                order_number: hold.item.order_number,
                vin_id: hold.vin_id().clone(),
                part_number: hold.item.customer_reference.clone(),
                quantity: hold.item.quantity,
                process_date: record.produced_at.date_naive(),
                waybill_number: shipment.waybill_number.clone(),
                reason_code: shipment.reason_code.clone(),
            })
            .collect();

        let verdict = self
            .gateway
            .submit_trip(trip, &items)
            .await
            .map_err(|error| map_gateway_error(error, trip, batch))?;
        if !verdict.accepted {
            return Err(Error::carrier_rejected(verdict.message.clone()).with_details(json!({
                "tripId": trip,
                "batchId": batch,
                "attempts": verdict.attempts,
            })));
        }

        tx.insert_shipment_records(&records)
            .await
            .map_err(map_store_error)?;
        let ids: Vec<HoldId> = holds.iter().map(|hold| hold.id).collect();
        tx.delete_holds(&ids).await.map_err(map_store_error)?;

        let task_status = match tx.operator_task(batch).await.map_err(map_store_error)? {
            Some(mut task) => {
                let shipped = i32::try_from(holds.len())
                    .map_err(|_| Error::system("shipment exceeds task capacity"))?;
                task.record_shipped(shipped, now);
                tx.update_operator_task(&task)
                    .await
                    .map_err(map_store_error)?;
                Some(task.status)
            }
            None => None,
        };

        let label = LifecycleStatus::completed_via(request.channel);
        let events: Vec<_> = holds
            .iter()
            .map(|hold| {
                LifecycleEvent::new(
                    hold.dolly_id().clone(),
                    hold.vin_id().clone(),
                    label,
                    LifecycleSource::Operator,
                    now,
                )
                .with_meta("tripId", trip.as_str())
                .with_meta("plateId", plate.as_str())
                .with_meta("batchId", batch.as_str())
                .with_meta("operator", request.operator.as_str())
            })
            .collect();
        LifecycleLog::stage(tx, &events)
            .await
            .map_err(map_store_error)?;

        Ok(ShipmentSummary {
            batch_id: batch.clone(),
            trip_id: trip.clone(),
            plate_id: plate.clone(),
            channel: request.channel,
            item_count: holds.len(),
            carrier_message: verdict.message,
            carrier_attempts: verdict.attempts,
            task_status,
        })
    }
}

fn validate(request: &CompleteShipmentRequest) -> Result<ValidatedShipment, Error> {
    let trip = TripId::new(&request.trip_id).map_err(|error| {
        Error::validation(error.to_string())
            .with_details(json!({ "field": "tripId", "value": request.trip_id }))
    })?;
    let plate = PlateId::new(&request.plate_id).map_err(|error| {
        Error::validation(error.to_string())
            .with_details(json!({ "field": "plateId", "value": request.plate_id }))
    })?;
    let waybill_number = non_blank(request.waybill_number.as_deref())
        .unwrap_or_else(|| trip.as_str().to_owned());
    let reason_code =
        non_blank(request.reason_code.as_deref()).unwrap_or_else(|| DEFAULT_REASON_CODE.to_owned());
    Ok(ValidatedShipment {
        trip,
        plate,
        waybill_number,
        reason_code,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn select_holds(
    available: Vec<ScanHold>,
    selected: Option<&[HoldId]>,
    batch: &BatchId,
) -> Result<Vec<ScanHold>, Error> {
    let Some(selected) = selected else {
        return Ok(available);
    };
    let wanted: BTreeSet<HoldId> = selected.iter().copied().collect();
    if wanted.is_empty() {
        return Err(Error::validation("select at least one hold to ship")
            .with_details(json!({ "field": "selectedHoldIds" })));
    }
    let known: BTreeSet<HoldId> = available.iter().map(|hold| hold.id).collect();
    let unknown: Vec<HoldId> = wanted.difference(&known).copied().collect();
    if !unknown.is_empty() {
        return Err(Error::validation(format!(
            "holds not awaiting shipment in batch {batch}"
        ))
        .with_details(json!({
            "field": "selectedHoldIds",
            "unknownHoldIds": unknown,
        })));
    }
    Ok(available
        .into_iter()
        .filter(|hold| wanted.contains(&hold.id))
        .collect())
}

fn build_record(
    hold: &ScanHold,
    request: &CompleteShipmentRequest,
    shipment: &ValidatedShipment,
    history: &BTreeMap<DollyId, DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ShipmentRecord {
    let produced_at = history
        .get(hold.dolly_id())
        .copied()
        .or(hold.item.produced_at)
        .unwrap_or(hold.scanned_at);
    ShipmentRecord {
        dolly_id: hold.dolly_id().clone(),
        vin_id: hold.vin_id().clone(),
        trip_id: shipment.trip.clone(),
        plate_id: shipment.plate.clone(),
        batch_id: request.batch_id.clone(),
        order_number: hold.item.order_number,
        customer_reference: hold.item.customer_reference.clone(),
        quantity: hold.item.quantity,
        station: hold.station().clone(),
        loading_operator: hold.operator.clone(),
        data_entry_operator: request.operator.clone(),
        produced_at,
        loaded_at: hold.loading_completed_at.unwrap_or(hold.scanned_at),
        asn_confirmed_at: request.channel.confirms_asn().then_some(now),
        waybill_confirmed_at: request.channel.confirms_waybill().then_some(now),
    }
}

fn map_gateway_error(error: CarrierGatewayError, trip: &TripId, batch: &BatchId) -> Error {
    match error {
        CarrierGatewayError::Unreachable { message, attempts } => {
            Error::carrier_unreachable(message).with_details(json!({
                "tripId": trip,
                "batchId": batch,
                "attempts": attempts,
            }))
        }
        CarrierGatewayError::Internal { message } => {
            Error::system(format!("carrier submission failed: {message}"))
        }
    }
}

#[async_trait]
impl ShipmentCommand for ShipmentService {
    async fn complete_shipment(
        &self,
        request: CompleteShipmentRequest,
    ) -> Result<ShipmentSummary, Error> {
        let shipment = validate(&request).inspect_err(|error| {
            warn!(batch_id = %request.batch_id, error = %error, "shipment request invalid");
        })?;
        let now = self.ports.clock.utc();

        let mut tx = self.ports.store.begin().await.map_err(map_store_error)?;
        let staged = self
            .stage_shipment(tx.as_mut(), &request, &shipment, now)
            .await;
        let summary = finish(tx, staged).await.inspect_err(|error| {
            warn!(
                batch_id = %request.batch_id,
                trip_id = %shipment.trip,
                error_code = ?error.code(),
                error = %error,
                "shipment rolled back"
            );
        })?;

        info!(
            batch_id = %summary.batch_id,
            trip_id = %summary.trip_id,
            plate_id = %summary.plate_id,
            items = summary.item_count,
            attempts = summary.carrier_attempts,
            "shipment confirmed"
        );
        self.ports
            .notifications
            .publish(WorkflowNotification::ShipmentCompleted {
                batch_id: summary.batch_id.clone(),
                trip_id: summary.trip_id.clone(),
                item_count: summary.item_count,
            });
        self.ports
            .record_audit(AuditEntry {
                action: "shipment_completed",
                actor: request.operator,
                subject: summary.trip_id.to_string(),
                details: json!({
                    "batchId": summary.batch_id,
                    "plateId": summary.plate_id,
                    "channel": summary.channel,
                    "itemCount": summary.item_count,
                }),
                at: now,
            })
            .await;
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "shipment_service_tests.rs"]
mod tests;
