//! Console transport: the GATT protocol as newline-delimited JSON.
//!
//! Useful for bench testing the bridge without a Bluetooth adapter: pipe
//! requests into stdin and watch replies and notifications on stdout.
//!
//! # Requests (one JSON object per line)
//!
//! ```json
//! {"op": "read", "characteristic": "device-status"}
//! {"op": "write", "characteristic": "terminal", "value": "uptime", "id": 7}
//! {"op": "subscribe", "characteristic": "00002007-710e-4a5b-8d75-3e5b444bc3cf"}
//! ```
//!
//! `characteristic` is either the UUID or the kebab-case name.  `id` is
//! optional and echoed in the reply.
//!
//! # Output
//!
//! ```json
//! {"kind": "registered", "service": "...", "primary": true, "characteristics": [...]}
//! {"kind": "advertising", "local_name": "VPS_headset-07"}
//! {"kind": "value", "id": 7, "characteristic": "...", "value": "87,Ready"}
//! {"kind": "ok", "characteristic": "..."}
//! {"kind": "error", "error": "malformed input: ..."}
//! {"kind": "notification", "characteristic": "...", "value": "hi\n"}
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use vps_core::{BridgeError, CharacteristicKind, ServiceDescriptor};

use super::{ChannelNotificationSink, Notification};
use crate::application::event_loop::GattEvent;
use crate::application::ports::{PeripheralTransport, TransportError};

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Read,
    Write,
    Subscribe,
    Unsubscribe,
}

/// One request line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleRequest {
    pub op: Op,
    pub characteristic: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacteristicEntry {
    pub uuid: Uuid,
    pub name: &'static str,
    pub flags: Vec<&'static str>,
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConsoleMessage {
    Registered {
        service: Uuid,
        primary: bool,
        characteristics: Vec<CharacteristicEntry>,
    },
    Advertising {
        local_name: String,
    },
    Value {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        characteristic: Uuid,
        value: String,
    },
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        characteristic: Uuid,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        error: String,
    },
    Notification {
        characteristic: Uuid,
        value: String,
    },
}

impl From<Notification> for ConsoleMessage {
    fn from(n: Notification) -> Self {
        ConsoleMessage::Notification {
            characteristic: n.characteristic,
            value: String::from_utf8_lossy(&n.value).into_owned(),
        }
    }
}

/// Resolves a UUID string or kebab-case characteristic name.
pub fn resolve_characteristic(name: &str) -> Option<Uuid> {
    Uuid::from_str(name)
        .ok()
        .or_else(|| CharacteristicKind::from_str(name).ok().map(|k| k.uuid()))
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// [`PeripheralTransport`] over a pair of async byte streams.
pub struct ConsoleTransport {
    outbound: mpsc::UnboundedSender<ConsoleMessage>,
}

impl ConsoleTransport {
    /// Starts the writer task on `writer`.
    ///
    /// Returns the transport, the sink to hand to the dispatch engine, and
    /// the writer task, which ends once the transport and its reply tasks
    /// are gone.
    pub fn spawn<W>(
        writer: W,
    ) -> (
        Self,
        ChannelNotificationSink,
        JoinHandle<Result<(), TransportError>>,
    )
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (sink, notifications) = ChannelNotificationSink::new();
        let writer = tokio::spawn(write_loop(writer, outbound_rx, notifications));
        (Self { outbound }, sink, writer)
    }

    fn emit(&self, message: ConsoleMessage) -> Result<(), TransportError> {
        self.outbound
            .send(message)
            .map_err(|_| TransportError::Io(std::io::ErrorKind::BrokenPipe.into()))
    }

    /// Reads request lines from `reader` and forwards them to `events` until
    /// end of input.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if reading fails.  Malformed lines are
    /// answered with an error message and skipped.
    pub async fn run_requests<R>(
        &self,
        reader: R,
        events: mpsc::Sender<GattEvent>,
    ) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let request: ConsoleRequest = match serde_json::from_str(line) {
                Ok(request) => request,
                Err(e) => {
                    debug!(error = %e, "unparseable console request");
                    self.emit(ConsoleMessage::Error {
                        id: None,
                        error: format!("invalid request: {e}"),
                    })?;
                    continue;
                }
            };
            if !self.forward(request, &events).await? {
                break;
            }
        }
        debug!("console input closed");
        Ok(())
    }

    /// Turns `request` into a [`GattEvent`] and spawns a task that emits the
    /// reply.  Returns `false` once the event loop is gone.
    async fn forward(
        &self,
        request: ConsoleRequest,
        events: &mpsc::Sender<GattEvent>,
    ) -> Result<bool, TransportError> {
        let id = request.id;
        let Some(characteristic) = resolve_characteristic(&request.characteristic) else {
            self.emit(ConsoleMessage::Error {
                id,
                error: format!("unknown characteristic {:?}", request.characteristic),
            })?;
            return Ok(true);
        };

        let outbound = self.outbound.clone();
        let (event, reply_task) = match request.op {
            Op::Read => {
                let (tx, rx) = oneshot::channel::<Result<Vec<u8>, BridgeError>>();
                let task = tokio::spawn(async move {
                    let message = match flatten(rx.await) {
                        Ok(value) => ConsoleMessage::Value {
                            id,
                            characteristic,
                            value: String::from_utf8_lossy(&value).into_owned(),
                        },
                        Err(e) => error_message(id, e),
                    };
                    let _ = outbound.send(message);
                });
                (GattEvent::Read { characteristic, reply: tx }, task)
            }
            Op::Write => {
                let (tx, rx) = oneshot::channel();
                let value = request.value.unwrap_or_default().into_bytes();
                let task = spawn_ack(outbound, id, characteristic, rx);
                (GattEvent::Write { characteristic, value, reply: tx }, task)
            }
            Op::Subscribe => {
                let (tx, rx) = oneshot::channel();
                let task = spawn_ack(outbound, id, characteristic, rx);
                (GattEvent::Subscribe { characteristic, reply: tx }, task)
            }
            Op::Unsubscribe => {
                let (tx, rx) = oneshot::channel();
                let task = spawn_ack(outbound, id, characteristic, rx);
                (GattEvent::Unsubscribe { characteristic, reply: tx }, task)
            }
        };

        if events.send(event).await.is_err() {
            warn!("event loop stopped, dropping console input");
            reply_task.abort();
            return Ok(false);
        }
        Ok(true)
    }
}

#[async_trait]
impl PeripheralTransport for ConsoleTransport {
    async fn register(&self, service: &ServiceDescriptor) -> Result<(), TransportError> {
        let characteristics = service
            .characteristics
            .iter()
            .map(|kind| CharacteristicEntry {
                uuid: kind.uuid(),
                name: kind.slug(),
                flags: kind.capabilities().flags(),
            })
            .collect();
        self.emit(ConsoleMessage::Registered {
            service: service.uuid,
            primary: service.primary,
            characteristics,
        })
        .map_err(|e| TransportError::Registration(e.to_string()))
    }

    async fn advertise(&self, local_name: &str) -> Result<(), TransportError> {
        self.emit(ConsoleMessage::Advertising {
            local_name: local_name.to_string(),
        })
        .map_err(|e| TransportError::Advertising(e.to_string()))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn flatten<T>(
    reply: Result<Result<T, BridgeError>, oneshot::error::RecvError>,
) -> Result<T, String> {
    match reply {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("request dropped".to_string()),
    }
}

fn error_message(id: Option<u64>, error: String) -> ConsoleMessage {
    ConsoleMessage::Error { id, error }
}

fn spawn_ack(
    outbound: mpsc::UnboundedSender<ConsoleMessage>,
    id: Option<u64>,
    characteristic: Uuid,
    rx: oneshot::Receiver<Result<(), BridgeError>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let message = match flatten(rx.await) {
            Ok(()) => ConsoleMessage::Ok { id, characteristic },
            Err(e) => error_message(id, e),
        };
        let _ = outbound.send(message);
    })
}

async fn write_loop<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<ConsoleMessage>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    loop {
        // Notifications first: a push queued before a reply was produced is
        // written before that reply, so nothing follows an unsubscribe ack.
        let message = tokio::select! {
            biased;
            Some(notification) = notifications.recv() => ConsoleMessage::from(notification),
            message = outbound.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };
        let mut line = serde_json::to_vec(&message)
            .map_err(|e| TransportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.flush().await?;
    Ok(())
}
