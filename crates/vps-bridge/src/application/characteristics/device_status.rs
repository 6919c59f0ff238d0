//! DeviceStatus: battery level plus readiness, `"<battery>,Ready"`.
//!
//! A failed telemetry read never fails the characteristic.  The source
//! remembers the last good reading and serves it (or the `-1` sentinel before
//! the first good reading) together with the failure, which the caller logs
//! and records.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vps_core::{BatteryReading, DeviceStatus};

use crate::application::ports::TelemetryProvider;
use crate::application::scheduler::{Sample, ValueSource};

pub struct DeviceStatusSource {
    telemetry: Arc<dyn TelemetryProvider>,
    last_known: Mutex<Option<BatteryReading>>,
}

impl DeviceStatusSource {
    pub fn new(telemetry: Arc<dyn TelemetryProvider>) -> Self {
        Self {
            telemetry,
            last_known: Mutex::new(None),
        }
    }

    /// The last successfully parsed reading, if any.
    pub fn last_known(&self) -> Option<BatteryReading> {
        *self.last_known.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Reads telemetry and composes the current status.
    pub async fn current(&self) -> Sample {
        // The telemetry call runs before the lock is taken.
        let reading = self.telemetry.read_battery_percentage().await;

        let mut last_known = self.last_known.lock().unwrap_or_else(|p| p.into_inner());
        let degraded = match reading {
            Ok(reading) => {
                *last_known = Some(reading);
                None
            }
            Err(err) => Some(err),
        };
        let status = DeviceStatus {
            battery: *last_known,
        };
        Sample {
            value: status.to_bytes(),
            degraded,
        }
    }
}

#[async_trait]
impl ValueSource for DeviceStatusSource {
    async fn sample(&self) -> Sample {
        self.current().await
    }
}
