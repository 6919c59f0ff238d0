//! NotificationScheduler: arms and cancels notification schedules.
//!
//! Each characteristic that supports notify has a [`NotifyPolicy`]:
//!
//! - [`NotifyPolicy::OnChange`] – no timer.  The engine pushes when a write
//!   changes the value (Terminal).
//! - [`NotifyPolicy::Periodic`] – a tokio task samples a [`ValueSource`] every
//!   `interval` and pushes the result (DeviceStatus).  The first push happens
//!   immediately on subscribe.
//!
//! Every schedule is bound to the subscription's `CancellationToken`.  The
//! task stops as soon as the token is cancelled, and each push re-checks the
//! token under the characteristic's state lock (see [`Characteristic::fire`]).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vps_core::BridgeError;

use super::ports::NotificationSink;
use super::slot::Characteristic;

/// Shortest period a schedule runs at; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// One value produced for a scheduled push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub value: Vec<u8>,
    /// Failure absorbed while producing `value` (the value is a fallback).
    pub degraded: Option<BridgeError>,
}

impl Sample {
    pub fn fresh(value: Vec<u8>) -> Self {
        Self {
            value,
            degraded: None,
        }
    }
}

/// Produces the values a periodic schedule pushes.
#[async_trait]
pub trait ValueSource: Send + Sync {
    async fn sample(&self) -> Sample;
}

/// How a characteristic's subscription delivers values.
#[derive(Clone)]
pub enum NotifyPolicy {
    OnChange,
    Periodic {
        interval: Duration,
        source: Arc<dyn ValueSource>,
    },
}

impl std::fmt::Debug for NotifyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyPolicy::OnChange => f.write_str("OnChange"),
            NotifyPolicy::Periodic { interval, .. } => f
                .debug_struct("Periodic")
                .field("interval", interval)
                .finish_non_exhaustive(),
        }
    }
}

/// Starts and stops notification schedules.
pub struct NotificationScheduler {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationScheduler {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &dyn NotificationSink {
        self.sink.as_ref()
    }

    /// Subscribes `slot` under `policy`.
    ///
    /// Returns `false` if the slot was already subscribed; the existing
    /// schedule is left untouched.
    pub fn start(&self, slot: &Arc<Characteristic>, policy: NotifyPolicy) -> bool {
        slot.subscribe(|token| match policy {
            NotifyPolicy::OnChange => None,
            NotifyPolicy::Periodic { interval, source } => Some(tokio::spawn(run_periodic(
                Arc::clone(slot),
                token,
                interval,
                source,
                Arc::clone(&self.sink),
            ))),
        })
    }

    /// Cancels the subscription of `slot`.
    ///
    /// When this returns, no further push for `slot` can be delivered.
    pub fn stop(&self, slot: &Characteristic) -> bool {
        slot.unsubscribe()
    }
}

async fn run_periodic(
    slot: Arc<Characteristic>,
    token: CancellationToken,
    interval: Duration,
    source: Arc<dyn ValueSource>,
    sink: Arc<dyn NotificationSink>,
) {
    let interval = interval.max(MIN_PERIOD);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(characteristic = %slot.kind(), ?interval, "periodic notifications started");

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let sample = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            sample = source.sample() => sample,
        };

        if let Some(err) = &sample.degraded {
            warn!(characteristic = %slot.kind(), error = %err, "scheduled sample degraded");
            slot.record_failure(err.kind());
        }

        if !slot.fire(&token, sample.value, sink.as_ref()) {
            break;
        }
    }

    debug!(characteristic = %slot.kind(), "periodic notifications stopped");
}
