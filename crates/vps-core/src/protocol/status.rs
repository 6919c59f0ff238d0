//! Battery telemetry parsing and the DeviceStatus value.

use std::fmt;

use crate::domain::error::BridgeError;

/// Token that precedes the state-of-charge value in a telemetry reply.
const CHARGE_TOKEN: &str = "uint16";

/// Value sent in place of a percentage before any reading succeeded.
pub const UNKNOWN_BATTERY: &str = "-1";

/// Battery state of charge, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReading {
    percentage: u8,
}

impl BatteryReading {
    /// Builds a reading from a raw 16-bit telemetry value, clamping to 100.
    pub fn from_raw(raw: u16) -> Self {
        Self {
            percentage: raw.min(100) as u8,
        }
    }

    pub fn percentage(self) -> u8 {
        self.percentage
    }

    /// Extracts the reading from a telemetry reply such as
    /// `"   variant       uint16 87"`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TelemetryParseFailure`] when no `uint16 <n>`
    /// pair with `n` in `0..=65535` is present.
    pub fn parse_reply(reply: &str) -> Result<Self, BridgeError> {
        let mut tokens = reply.split_whitespace();
        while let Some(token) = tokens.next() {
            if token != CHARGE_TOKEN {
                continue;
            }
            if let Some(raw) = tokens.next().and_then(|v| v.parse::<u16>().ok()) {
                return Ok(Self::from_raw(raw));
            }
        }
        Err(BridgeError::TelemetryParseFailure(format!(
            "no `{CHARGE_TOKEN} <value>` in reply {:?}",
            reply.trim()
        )))
    }
}

/// The value served by the DeviceStatus characteristic: `"<battery>,Ready"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    pub battery: Option<BatteryReading>,
}

impl DeviceStatus {
    pub fn to_bytes(self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.battery {
            Some(reading) => write!(f, "{},Ready", reading.percentage()),
            None => write!(f, "{UNKNOWN_BATTERY},Ready"),
        }
    }
}
