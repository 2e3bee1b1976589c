//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Provides the `LogisticsStore` implementation backed by PostgreSQL through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapter**: the store only translates between Diesel rows and
//!   domain types. Workflow rules live in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Unit of work**: each transaction owns a pooled connection for its
//!   whole lifetime.
//!
//! # Example
//!
//! ```ignore
//! use dolly_backend::outbound::persistence::{DbPool, DieselLogisticsStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/logistics")).await?;
//! let store = DieselLogisticsStore::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_logistics_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_logistics_store::{DieselLogisticsStore, DieselLogisticsTransaction};
pub use migrations::{MigrationError, apply_migrations};
pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};
