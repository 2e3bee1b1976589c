//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Produced dollies waiting to be scanned, one row per VIN.
    queue_items (dolly_id, vin_id) {
        dolly_id -> Varchar,
        vin_id -> Varchar,
        customer_reference -> Text,
        station -> Varchar,
        quantity -> Int4,
        produced_at -> Nullable<Timestamptz>,
        /// Physical order number, monotonic per station.
        order_number -> Int8,
        barcode -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Scan holds carrying the consumed queue metadata.
    scan_holds (id) {
        id -> Int8,
        /// One of `pending`, `scanned`, `loading_completed`, `completed`,
        /// `removed`.
        status -> Varchar,
        session_id -> Varchar,
        scan_order -> Int4,
        operator_id -> Varchar,
        batch_id -> Nullable<Varchar>,
        dolly_id -> Varchar,
        vin_id -> Varchar,
        customer_reference -> Text,
        station -> Varchar,
        quantity -> Int4,
        produced_at -> Nullable<Timestamptz>,
        order_number -> Int8,
        barcode -> Nullable<Varchar>,
        trip_id -> Nullable<Varchar>,
        plate_id -> Nullable<Varchar>,
        scanned_at -> Timestamptz,
        loading_completed_at -> Nullable<Timestamptz>,
        submitted_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
        metadata -> Jsonb,
    }
}

diesel::table! {
    /// Data-entry task opened for every completed loading session.
    operator_tasks (batch_id) {
        batch_id -> Varchar,
        status -> Varchar,
        channel -> Varchar,
        total_items -> Int4,
        processed_items -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only shipment ledger.
    shipment_records (id) {
        id -> Int8,
        dolly_id -> Varchar,
        vin_id -> Varchar,
        trip_id -> Varchar,
        plate_id -> Varchar,
        batch_id -> Varchar,
        order_number -> Int8,
        customer_reference -> Text,
        quantity -> Int4,
        station -> Varchar,
        loading_operator -> Varchar,
        data_entry_operator -> Varchar,
        produced_at -> Timestamptz,
        loaded_at -> Timestamptz,
        asn_confirmed_at -> Nullable<Timestamptz>,
        waybill_confirmed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Read-only production timestamps fed by the line systems.
    production_history (dolly_id) {
        dolly_id -> Varchar,
        produced_at -> Timestamptz,
    }
}

diesel::table! {
    /// Queue rows removed by a supervisor.
    removed_queue_items (archive_id) {
        archive_id -> Int8,
        dolly_id -> Varchar,
        vin_id -> Varchar,
        customer_reference -> Text,
        station -> Varchar,
        quantity -> Int4,
        produced_at -> Nullable<Timestamptz>,
        order_number -> Int8,
        barcode -> Nullable<Varchar>,
        removed_by -> Varchar,
        reason -> Nullable<Text>,
        removed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only lifecycle log.
    lifecycle_events (id) {
        id -> Int8,
        dolly_id -> Varchar,
        vin_id -> Varchar,
        status -> Varchar,
        source -> Varchar,
        metadata -> Jsonb,
        recorded_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    queue_items,
    scan_holds,
    operator_tasks,
    shipment_records,
    production_history,
    removed_queue_items,
    lifecycle_events,
);
