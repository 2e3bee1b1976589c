//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed logistics store using Diesel ORM
//! - **memory**: in-process logistics store for tests and database-less runs
//! - **carrier**: SOAP-over-HTTP carrier confirmation transport
//! - **notifications**: broadcast channel feeding dashboard subscribers
//! - **audit**: audit entries emitted as structured tracing events
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod audit;
pub mod carrier;
pub mod memory;
pub mod notifications;
pub mod persistence;
