//! HTTP inbound adapter exposing the workflow REST endpoints.
//!
//! Handlers parse camelCase JSON into port requests, call the driving ports
//! held in [`state::HttpState`], and render domain errors through
//! [`error`].

pub mod diagnostics;
pub mod dto;
pub mod error;
pub mod health;
pub mod queue;
pub mod scans;
pub mod sessions;
pub mod shipments;
pub mod state;
#[cfg(test)]
pub mod test_utils;
mod validation;

pub use crate::domain::ApiResult;
