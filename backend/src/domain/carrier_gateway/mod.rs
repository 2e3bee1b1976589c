//! Carrier confirmation gateway.
//!
//! Wraps a [`CarrierTransport`] with the submission rules the shipment
//! coordinator relies on: empty submissions never leave the process, a
//! disabled carrier accepts synthetically, and HTTP-layer failures are
//! retried with the same payload under jittered exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::TripId;
use crate::domain::ports::{
    CarrierGateway, CarrierGatewayError, CarrierItem, CarrierProbe, CarrierReply,
    CarrierSubmission, CarrierTransport, CarrierTransportError, CarrierVerdict,
};

mod attempt_error;
mod runtime;

use attempt_error::AttemptError;
pub use runtime::{CarrierGatewayRuntime, SeededJitter, TokioSleeper};

/// Message returned for a submission without items.
pub const EMPTY_SUBMISSION_MESSAGE: &str = "at least one item required";
/// Message returned while the carrier is switched off.
pub const DISABLED_MESSAGE: &str = "carrier disabled (test mode)";

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierGatewayConfig {
    /// When false every submission is accepted without a network call.
    pub enabled: bool,
    /// Label reported by the connectivity probe.
    pub environment: String,
    /// Extra attempts after the first failed one.
    pub retry_count: u32,
    /// Initial retry backoff.
    pub initial_backoff: Duration,
    /// Maximum retry backoff cap.
    pub max_backoff: Duration,
}

impl Default for CarrierGatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            environment: "production".to_owned(),
            retry_count: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

/// Async sleeping abstraction so tests can skip real delays.
#[async_trait]
pub trait CarrierSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use dolly_backend::domain::BackoffJitter;
    /// use std::time::Duration;
    ///
    /// struct FixedJitter;
    /// impl BackoffJitter for FixedJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 10)
    ///     }
    /// }
    ///
    /// let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).single().expect("valid time");
    /// assert_eq!(
    ///     FixedJitter.jittered_delay(Duration::from_millis(100), 2, now),
    ///     Duration::from_millis(120),
    /// );
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Retrying gateway in front of the carrier transport.
pub struct RetryingCarrierGateway {
    transport: Arc<dyn CarrierTransport>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn CarrierSleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: CarrierGatewayConfig,
}

impl RetryingCarrierGateway {
    /// Build a gateway using the default runtime helpers.
    pub fn new(
        transport: Arc<dyn CarrierTransport>,
        clock: Arc<dyn Clock>,
        config: CarrierGatewayConfig,
    ) -> Self {
        Self::with_runtime(transport, clock, CarrierGatewayRuntime::default(), config)
    }

    /// Build a gateway with injected runtime helpers.
    pub fn with_runtime(
        transport: Arc<dyn CarrierTransport>,
        clock: Arc<dyn Clock>,
        runtime: CarrierGatewayRuntime,
        config: CarrierGatewayConfig,
    ) -> Self {
        Self {
            transport,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    async fn run_single_attempt(
        &self,
        submission: &CarrierSubmission,
    ) -> Result<CarrierReply, AttemptError> {
        self.transport
            .submit(submission)
            .await
            .map_err(AttemptError::from)
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

#[async_trait]
impl CarrierGateway for RetryingCarrierGateway {
    async fn submit_trip(
        &self,
        trip: &TripId,
        items: &[CarrierItem],
    ) -> Result<CarrierVerdict, CarrierGatewayError> {
        if !self.config.enabled {
            info!(trip_id = %trip, items = items.len(), "carrier disabled; accepting locally");
            return Ok(CarrierVerdict {
                accepted: true,
                message: DISABLED_MESSAGE.to_owned(),
                attempts: 0,
            });
        }
        if items.is_empty() {
            return Ok(CarrierVerdict {
                accepted: false,
                message: EMPTY_SUBMISSION_MESSAGE.to_owned(),
                attempts: 0,
            });
        }

        let submission = CarrierSubmission {
            trip_id: trip.clone(),
            items: items.to_vec(),
        };
        let max_attempts = self.config.retry_count.saturating_add(1);

        for attempt in 1..=max_attempts {
            match self.run_single_attempt(&submission).await {
                Ok(reply) => {
                    info!(
                        trip_id = %trip,
                        attempt,
                        accepted = reply.accepted,
                        message = %reply.message,
                        "carrier answered"
                    );
                    return Ok(CarrierVerdict {
                        accepted: reply.accepted,
                        message: reply.message,
                        attempts: attempt,
                    });
                }
                Err(AttemptError::Retryable(error)) if attempt < max_attempts => {
                    let base_delay = self.retry_base_delay(attempt);
                    let delay = self
                        .jitter
                        .jittered_delay(base_delay, attempt, self.clock.utc());
                    warn!(
                        trip_id = %trip,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "carrier attempt failed; retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(AttemptError::Retryable(error)) => {
                    warn!(trip_id = %trip, attempt, error = %error, "carrier retries exhausted");
                    return Err(CarrierGatewayError::unreachable(error.to_string(), attempt));
                }
                Err(AttemptError::Invalid(message)) => {
                    return Err(CarrierGatewayError::internal(message));
                }
            }
        }

        Err(CarrierGatewayError::internal(
            "carrier retry loop ended without an outcome",
        ))
    }

    async fn probe(&self) -> Result<CarrierProbe, CarrierGatewayError> {
        let environment = self.config.environment.clone();
        if !self.config.enabled {
            return Ok(CarrierProbe {
                enabled: false,
                reachable: false,
                status: None,
                environment,
                message: DISABLED_MESSAGE.to_owned(),
            });
        }

        match self.transport.probe().await {
            Ok(status) => {
                let reachable = matches!(status, 200 | 405);
                let message = if reachable {
                    "carrier endpoint reachable".to_owned()
                } else {
                    format!("carrier endpoint answered with status {status}")
                };
                Ok(CarrierProbe {
                    enabled: true,
                    reachable,
                    status: Some(status),
                    environment,
                    message,
                })
            }
            Err(CarrierTransportError::InvalidRequest { message }) => {
                Err(CarrierGatewayError::internal(message))
            }
            Err(error) => {
                let status = match &error {
                    CarrierTransportError::Unavailable { status, .. } => Some(*status),
                    _ => None,
                };
                Ok(CarrierProbe {
                    enabled: true,
                    reachable: false,
                    status,
                    environment,
                    message: error.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests;
