//! Shared doubles for carrier gateway and shipment tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    CarrierReply, CarrierSubmission, CarrierTransport, CarrierTransportError,
};
use crate::domain::{BackoffJitter, CarrierSleeper};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("test double mutex poisoned"),
    }
}

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0) += TimeDelta::seconds(seconds);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl CarrierSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl CarrierSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0).push(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptOffsetJitter;

impl BackoffJitter for AttemptOffsetJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, _now: DateTime<Utc>) -> Duration {
        base + Duration::from_millis(u64::from(attempt))
    }
}

/// Transport answering from a script, then accepting once the script runs dry.
#[derive(Default)]
pub struct ScriptedCarrierTransport {
    scripted: Mutex<VecDeque<Result<CarrierReply, CarrierTransportError>>>,
    submissions: Mutex<Vec<CarrierSubmission>>,
    calls: AtomicUsize,
    probe_status: Option<u16>,
}

impl ScriptedCarrierTransport {
    pub fn scripted(scripted: Vec<Result<CarrierReply, CarrierTransportError>>) -> Self {
        Self {
            scripted: Mutex::new(scripted.into()),
            ..Self::default()
        }
    }

    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting(message: &str) -> Self {
        Self::scripted(vec![Ok(CarrierReply {
            accepted: false,
            message: message.to_owned(),
        })])
    }

    pub fn with_probe_status(mut self, status: u16) -> Self {
        self.probe_status = Some(status);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<CarrierSubmission> {
        lock(&self.submissions).clone()
    }
}

#[async_trait]
impl CarrierTransport for ScriptedCarrierTransport {
    async fn submit(
        &self,
        submission: &CarrierSubmission,
    ) -> Result<CarrierReply, CarrierTransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.submissions).push(submission.clone());
        lock(&self.scripted).pop_front().unwrap_or_else(|| {
            Ok(CarrierReply {
                accepted: true,
                message: "OK".to_owned(),
            })
        })
    }

    async fn probe(&self) -> Result<u16, CarrierTransportError> {
        self.probe_status
            .ok_or_else(|| CarrierTransportError::transport("connection refused"))
    }
}
