//! VPS peripheral bridge: entry point.
//!
//! This binary exposes the headset's control surface as a GATT service:
//! Wi-Fi provisioning, network identity, a remote terminal, recorder remote
//! control, and a periodically pushed device status.
//!
//! The radio stack is reached through a [`PeripheralTransport`].  This build
//! ships the console transport, which speaks the GATT operations as
//! newline-delimited JSON on stdin/stdout, so the whole bridge can be driven
//! from a shell or a test harness.
//!
//! # Usage
//!
//! ```text
//! vps-bridge [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Config file [default: /etc/vps-bridge/config.toml]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable     | Default                         | Description          |
//! |--------------|---------------------------------|----------------------|
//! | `VPS_CONFIG` | `/etc/vps-bridge/config.toml`   | Config file path     |
//! | `LOG_LEVEL`  | config `log_level` (`info`)     | `tracing` filter     |
//!
//! # Architecture overview
//!
//! ```text
//! Controller (phone)
//!       ↕  GATT read / write / subscribe
//! PeripheralTransport      ← console transport on stdin/stdout
//!       ↕  GattEvent
//! event loop               one lane per characteristic
//!       ↕
//! DispatchEngine           capability checks, handlers, notification scheduler
//!       ↕
//! nmcli · sh · battery IPC · recorder HTTP API
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

use vps_bridge::application::characteristics::Ports;
use vps_bridge::application::dispatch::{DispatchEngine, EngineConfig};
use vps_bridge::application::event_loop;
use vps_bridge::application::ports::{CommandLine, NetworkInfoProvider, PeripheralTransport};
use vps_bridge::infrastructure::logging;
use vps_bridge::infrastructure::recorder::HttpRecorderClient;
use vps_bridge::infrastructure::storage::config::{load_config, BridgeConfig, DEFAULT_CONFIG_PATH};
use vps_bridge::infrastructure::system::command::SystemCommandExecutor;
use vps_bridge::infrastructure::system::network::HostNetworkInfo;
use vps_bridge::infrastructure::system::telemetry::CommandTelemetry;
use vps_bridge::infrastructure::transport::console::ConsoleTransport;
use vps_core::domain::service::local_name;
use vps_core::ServiceDescriptor;

/// Capacity of the transport → event loop queue.
const EVENT_QUEUE_DEPTH: usize = 64;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// VPS peripheral bridge.
#[derive(Debug, Parser)]
#[command(
    name = "vps-bridge",
    about = "GATT characteristic dispatch and notification engine for the VPS headset",
    version
)]
struct Cli {
    /// Path of the TOML config file.  A missing file means all defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, env = "VPS_CONFIG")]
    config: PathBuf,
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Builds the production adapters from `config`.
fn build_ports(config: &BridgeConfig) -> anyhow::Result<Ports> {
    let executor = Arc::new(SystemCommandExecutor::new(
        config.command_timeout(),
        config.settle_delay(),
    ));
    // Telemetry is polled on a timer; it gets its own bound and no settle delay.
    let telemetry_executor = Arc::new(SystemCommandExecutor::new(
        config.telemetry_timeout(),
        std::time::Duration::ZERO,
    ));
    let telemetry_command = CommandLine::from_argv(&config.telemetry.command)
        .context("telemetry.command is empty")?;
    let recorder = HttpRecorderClient::new(&config.recorder.base_url, config.recorder_timeout())
        .context("failed to build the recorder HTTP client")?;

    Ok(Ports {
        executor: executor.clone(),
        network: Arc::new(HostNetworkInfo::new(executor)),
        telemetry: Arc::new(CommandTelemetry::new(telemetry_executor, telemetry_command)),
        recorder: Arc::new(recorder),
    })
}

/// Registers the VPS service on `transport` and advertises it as
/// `VPS_<hostname>`, returning the advertised name.
///
/// An unavailable hostname is not fatal; the bridge advertises
/// `VPS_unknown` instead.
async fn announce(
    transport: &dyn PeripheralTransport,
    network: &dyn NetworkInfoProvider,
) -> anyhow::Result<String> {
    transport
        .register(&ServiceDescriptor::vps())
        .await
        .context("failed to register the GATT service")?;

    let hostname = match network.hostname().await {
        Ok(hostname) => hostname,
        Err(e) => {
            warn!(error = %e, "hostname unavailable, advertising a placeholder name");
            "unknown".to_string()
        }
    };
    let name = local_name(&hostname);
    transport
        .advertise(&name)
        .await
        .context("failed to start advertising")?;
    Ok(name)
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments are parsed and the config file is loaded.
/// 2. Logging is initialised (`LOG_LEVEL`, then the config's `log_level`).
/// 3. The adapters and the [`DispatchEngine`] are built.
/// 4. The service is registered and advertised as `VPS_<hostname>`.
/// 5. Requests are served until stdin closes or Ctrl+C is pressed; every
///    notification schedule is then cancelled.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    logging::init(&config.log_level);
    info!(config = %cli.config.display(), "VPS bridge starting");

    let ports = build_ports(&config)?;
    let network = Arc::clone(&ports.network);

    let (transport, sink, writer) = ConsoleTransport::spawn(tokio::io::stdout());
    let engine = Arc::new(DispatchEngine::new(
        ports,
        Arc::new(sink),
        EngineConfig {
            device_status_interval: config.device_status_interval(),
        },
    ));

    // ── Registration and advertising ──────────────────────────────────────────
    let name = announce(&transport, network.as_ref()).await?;
    info!(local_name = %name, "advertising");

    // ── Request loop ──────────────────────────────────────────────────────────
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let server = tokio::spawn(event_loop::serve(Arc::clone(&engine), events_rx));

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = transport.run_requests(stdin, events_tx) => {
            result.context("console transport failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("received Ctrl+C, shutting down"),
                Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
            }
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    //
    // The request sender is gone by now, so `serve` drains its lanes and
    // returns.  Cancelling the schedules drops the last notification pushes.
    if let Err(e) = server.await {
        warn!(error = %e, "event loop task failed");
    }
    engine.shutdown();
    drop(transport);
    drop(engine);
    match writer.await {
        Ok(result) => result.context("console writer failed")?,
        Err(e) => warn!(error = %e, "console writer task failed"),
    }

    info!("VPS bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
