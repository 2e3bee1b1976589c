//! Driving port for reading a dolly's lifecycle trail.

use async_trait::async_trait;

use crate::domain::{DollyId, Error, LifecycleEvent};

/// Port for lifecycle diagnostics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LifecycleQuery: Send + Sync {
    /// Every recorded event of a dolly, oldest first.
    async fn trail(&self, dolly: DollyId) -> Result<Vec<LifecycleEvent>, Error>;
}
