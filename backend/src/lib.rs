//! Loading and shipment workflow engine for finished-goods dollies.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the workflow
//! services and ports, [`outbound`] the adapters they drive (PostgreSQL,
//! the carrier SOAP endpoint, notification and audit sinks), and [`inbound`]
//! the HTTP surface that drives them.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
