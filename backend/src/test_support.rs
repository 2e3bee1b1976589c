//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`; compiled
//! for tests and behind the `test-support` feature.

pub mod carrier;
pub mod workflow;

pub use workflow::{queue_item, shift_start};
