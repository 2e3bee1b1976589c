//! Diesel and pool error mapping for the logistics store.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;
use crate::domain::ports::LogisticsStoreError;

/// Map pool errors into store connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> LogisticsStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            LogisticsStoreError::connection(message)
        }
    }
}

/// Map Diesel errors into store errors, tagging them with the operation.
///
/// Constraint violations keep the constraint name so that callers can tell a
/// duplicate pair from a generic failure in the logs.
pub(crate) fn map_diesel_error(error: DieselError, operation: &'static str) -> LogisticsStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, operation, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            operation,
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => LogisticsStoreError::query(format!("{operation}: record not found")),
        DieselError::QueryBuilderError(_) => {
            LogisticsStoreError::query(format!("{operation}: database query error"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            LogisticsStoreError::connection(format!("{operation}: database connection error"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            LogisticsStoreError::query(format!(
                "{operation}: duplicate row ({})",
                info.constraint_name().unwrap_or("unique constraint")
            ))
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            LogisticsStoreError::query(format!("{operation}: serialization failure"))
        }
        _ => LogisticsStoreError::query(format!("{operation}: database error")),
    }
}
