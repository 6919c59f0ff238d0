//! Recording fakes of every port, for unit and integration tests.
//!
//! Each fake records the calls it receives and replies from a queue of
//! scripted results, so tests can drive the engine without spawning
//! processes, resolving names, or talking HTTP.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use vps_core::protocol::recorder::{RecorderRequest, RecorderResponse};
use vps_core::{BatteryReading, BridgeError, ServiceDescriptor};

use crate::application::ports::{
    CommandExecutor, CommandLine, CommandResult, NetworkInfoProvider, NotificationSink,
    PeripheralTransport, RecorderClient, TelemetryProvider, TransportError,
};

// ── Command executor ──────────────────────────────────────────────────────────

/// A [`CommandExecutor`] that records commands and replays scripted results.
///
/// When the script is empty every command succeeds with empty output.
#[derive(Default)]
pub struct FakeCommandExecutor {
    calls: Mutex<Vec<CommandLine>>,
    results: Mutex<VecDeque<CommandResult>>,
}

impl FakeCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result of the next command.
    pub fn push_result(&self, result: CommandResult) {
        self.results.lock().expect("lock poisoned").push_back(result);
    }

    /// Commands executed so far, in order.
    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl CommandExecutor for FakeCommandExecutor {
    async fn execute(&self, command: &CommandLine) -> CommandResult {
        self.calls.lock().expect("lock poisoned").push(command.clone());
        self.results
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| CommandResult::ok(""))
    }
}

// ── Network info ──────────────────────────────────────────────────────────────

/// A [`NetworkInfoProvider`] with fixed answers.
pub struct FakeNetworkInfo {
    ssid: Option<String>,
    hostname: String,
    ip: IpAddr,
    should_fail: bool,
}

impl FakeNetworkInfo {
    /// Host `headset-07` at `192.168.4.20`, joined to `ssid`.
    pub fn connected(ssid: &str) -> Self {
        Self {
            ssid: Some(ssid.to_string()),
            hostname: "headset-07".to_string(),
            ip: IpAddr::V4(Ipv4Addr::new(192, 168, 4, 20)),
            should_fail: false,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            ssid: None,
            ..Self::connected("")
        }
    }

    /// Every query fails with `NetworkQueryFailure`.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::disconnected()
        }
    }

    fn check(&self) -> Result<(), BridgeError> {
        if self.should_fail {
            return Err(BridgeError::NetworkQueryFailure("name resolution failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkInfoProvider for FakeNetworkInfo {
    async fn active_ssid(&self) -> Result<Option<String>, BridgeError> {
        self.check()?;
        Ok(self.ssid.clone())
    }

    async fn hostname(&self) -> Result<String, BridgeError> {
        self.check()?;
        Ok(self.hostname.clone())
    }

    async fn ip_address(&self) -> Result<IpAddr, BridgeError> {
        self.check()?;
        Ok(self.ip)
    }
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// A [`TelemetryProvider`] that replays scripted readings.
///
/// When the script is empty every read fails with `TelemetryParseFailure`.
#[derive(Default)]
pub struct FakeTelemetry {
    script: Mutex<VecDeque<Result<BatteryReading, BridgeError>>>,
    reads: Mutex<u32>,
}

impl FakeTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_percentage(&self, raw: u16) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(Ok(BatteryReading::from_raw(raw)));
    }

    pub fn push_failure(&self) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(Err(BridgeError::TelemetryParseFailure("scripted failure".into())));
    }

    /// Number of reads performed.
    pub fn reads(&self) -> u32 {
        *self.reads.lock().expect("lock poisoned")
    }
}

#[async_trait]
impl TelemetryProvider for FakeTelemetry {
    async fn read_battery_percentage(&self) -> Result<BatteryReading, BridgeError> {
        *self.reads.lock().expect("lock poisoned") += 1;
        self.script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::TelemetryParseFailure("no reply".into())))
    }
}

// ── Recorder ──────────────────────────────────────────────────────────────────

/// A [`RecorderClient`] that records requests and answers with one status.
pub struct FakeRecorder {
    requests: Mutex<Vec<RecorderRequest>>,
    status: Option<u16>,
}

impl FakeRecorder {
    /// Accepts every request (status 200).
    pub fn new() -> Self {
        Self::with_status(Some(200))
    }

    /// Answers every request with `status` (`None` = no response).
    pub fn with_status(status: Option<u16>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            status,
        }
    }

    pub fn requests(&self) -> Vec<RecorderRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

impl Default for FakeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecorderClient for FakeRecorder {
    async fn send(&self, request: &RecorderRequest) -> RecorderResponse {
        self.requests.lock().expect("lock poisoned").push(request.clone());
        RecorderResponse {
            status: self.status,
        }
    }
}

// ── Notification sink ─────────────────────────────────────────────────────────

/// A [`NotificationSink`] that records every push.
#[derive(Default)]
pub struct RecordingSink {
    pushes: Mutex<Vec<(Uuid, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.pushes.lock().expect("lock poisoned").clone()
    }

    /// Pushes for one characteristic.
    pub fn pushes_for(&self, characteristic: Uuid) -> Vec<Vec<u8>> {
        self.pushes()
            .into_iter()
            .filter(|(id, _)| *id == characteristic)
            .map(|(_, value)| value)
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, characteristic: Uuid, value: Vec<u8>) {
        self.pushes
            .lock()
            .expect("lock poisoned")
            .push((characteristic, value));
    }
}

// ── Peripheral transport ──────────────────────────────────────────────────────

/// A [`PeripheralTransport`] that records registrations and advertisements.
#[derive(Default)]
pub struct FakeTransport {
    pub registered: Mutex<Vec<ServiceDescriptor>>,
    pub advertised: Mutex<Vec<String>>,
    /// When `true`, registration fails.
    pub should_fail: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) -> Vec<ServiceDescriptor> {
        self.registered.lock().expect("lock poisoned").clone()
    }

    pub fn advertised(&self) -> Vec<String> {
        self.advertised.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl PeripheralTransport for FakeTransport {
    async fn register(&self, service: &ServiceDescriptor) -> Result<(), TransportError> {
        if self.should_fail {
            return Err(TransportError::Registration("adapter not powered".into()));
        }
        self.registered
            .lock()
            .expect("lock poisoned")
            .push(service.clone());
        Ok(())
    }

    async fn advertise(&self, local_name: &str) -> Result<(), TransportError> {
        self.advertised
            .lock()
            .expect("lock poisoned")
            .push(local_name.to_string());
        Ok(())
    }
}
