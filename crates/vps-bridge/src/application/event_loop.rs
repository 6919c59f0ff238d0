//! Event loop: feeds transport events to the dispatch engine.
//!
//! The transport delivers [`GattEvent`]s on one channel.  The loop gives
//! every characteristic its own *lane* (an unbounded channel drained by one
//! task), so:
//!
//! - events for the same characteristic are handled strictly in arrival
//!   order, one at a time;
//! - a slow command on Terminal never delays a read of DeviceStatus.
//!
//! ```text
//! transport ──► serve() ──► lane[terminal]       ──► engine.handle_*()
//!                      ├──► lane[device-status]  ──► engine.handle_*()
//!                      └──► ...
//! ```
//!
//! Each event carries a `oneshot` reply sender; a transport that no longer
//! waits for the reply simply drops the receiver.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, trace};
use uuid::Uuid;

use vps_core::BridgeError;

use super::dispatch::DispatchEngine;

/// Reply channel of one event.
pub type Reply<T> = oneshot::Sender<Result<T, BridgeError>>;

/// One protocol event from the transport.
#[derive(Debug)]
pub enum GattEvent {
    Read {
        characteristic: Uuid,
        reply: Reply<Vec<u8>>,
    },
    Write {
        characteristic: Uuid,
        value: Vec<u8>,
        reply: Reply<()>,
    },
    Subscribe {
        characteristic: Uuid,
        reply: Reply<()>,
    },
    Unsubscribe {
        characteristic: Uuid,
        reply: Reply<()>,
    },
}

impl GattEvent {
    pub fn characteristic(&self) -> Uuid {
        match self {
            GattEvent::Read { characteristic, .. }
            | GattEvent::Write { characteristic, .. }
            | GattEvent::Subscribe { characteristic, .. }
            | GattEvent::Unsubscribe { characteristic, .. } => *characteristic,
        }
    }
}

/// Runs `event` against the engine and sends the reply.
pub async fn dispatch(engine: &DispatchEngine, event: GattEvent) {
    // A dropped receiver means the transport stopped waiting; nothing to do.
    match event {
        GattEvent::Read {
            characteristic,
            reply,
        } => {
            let _ = reply.send(engine.handle_read(characteristic).await);
        }
        GattEvent::Write {
            characteristic,
            value,
            reply,
        } => {
            let _ = reply.send(engine.handle_write(characteristic, &value).await);
        }
        GattEvent::Subscribe {
            characteristic,
            reply,
        } => {
            let _ = reply.send(engine.handle_subscribe(characteristic).await);
        }
        GattEvent::Unsubscribe {
            characteristic,
            reply,
        } => {
            let _ = reply.send(engine.handle_unsubscribe(characteristic).await);
        }
    }
}

/// Consumes `events` until the channel closes, then drains every lane.
pub async fn serve(engine: Arc<DispatchEngine>, mut events: mpsc::Receiver<GattEvent>) {
    let mut lanes: HashMap<Uuid, mpsc::UnboundedSender<GattEvent>> = HashMap::new();
    let mut workers = JoinSet::new();

    while let Some(event) = events.recv().await {
        let id = event.characteristic();

        // Unknown UUIDs get no lane; the engine rejects them immediately.
        if engine.service().find(id).is_none() {
            dispatch(&engine, event).await;
            continue;
        }

        let lane = lanes.entry(id).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            workers.spawn(run_lane(Arc::clone(&engine), id, rx));
            tx
        });
        if lane.send(event).is_err() {
            debug!(characteristic = %id, "lane closed, event dropped");
        }
    }

    drop(lanes);
    while workers.join_next().await.is_some() {}
    debug!("event loop stopped");
}

async fn run_lane(
    engine: Arc<DispatchEngine>,
    id: Uuid,
    mut events: mpsc::UnboundedReceiver<GattEvent>,
) {
    trace!(characteristic = %id, "lane started");
    while let Some(event) = events.recv().await {
        dispatch(&engine, event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::characteristics::Ports;
    use crate::application::dispatch::EngineConfig;
    use crate::application::ports::{CommandExecutor, CommandLine, CommandResult};
    use crate::infrastructure::mock::{
        FakeCommandExecutor, FakeNetworkInfo, FakeRecorder, FakeTelemetry, RecordingSink,
    };
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};
    use vps_core::CharacteristicKind;

    /// Executor that holds every command until the test releases it.
    struct GatedExecutor {
        entered: Notify,
        gate: Semaphore,
    }

    #[async_trait]
    impl CommandExecutor for GatedExecutor {
        async fn execute(&self, _command: &CommandLine) -> CommandResult {
            self.entered.notify_one();
            match self.gate.acquire().await {
                Ok(_permit) => CommandResult::ok("done\n"),
                Err(_) => CommandResult::failed("gate closed"),
            }
        }
    }

    fn engine(executor: Arc<dyn CommandExecutor>) -> Arc<DispatchEngine> {
        let ports = Ports {
            executor,
            network: Arc::new(FakeNetworkInfo::connected("LabNet")),
            telemetry: Arc::new(FakeTelemetry::new()),
            recorder: Arc::new(FakeRecorder::new()),
        };
        Arc::new(DispatchEngine::new(
            ports,
            Arc::new(RecordingSink::new()),
            EngineConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_events_on_one_characteristic_are_handled_in_order() {
        // Arrange
        let executor = Arc::new(FakeCommandExecutor::new());
        executor.push_result(CommandResult::ok("one"));
        executor.push_result(CommandResult::ok("two"));
        let (tx, rx) = mpsc::channel(8);
        let server = tokio::spawn(serve(engine(executor.clone()), rx));
        let terminal = CharacteristicKind::Terminal.uuid();

        // Act
        let (w1, r1) = oneshot::channel();
        let (w2, r2) = oneshot::channel();
        let (rd, rr) = oneshot::channel();
        tx.send(GattEvent::Write { characteristic: terminal, value: b"echo one".to_vec(), reply: w1 })
            .await
            .unwrap();
        tx.send(GattEvent::Write { characteristic: terminal, value: b"echo two".to_vec(), reply: w2 })
            .await
            .unwrap();
        tx.send(GattEvent::Read { characteristic: terminal, reply: rd }).await.unwrap();

        // Assert
        assert!(r1.await.unwrap().is_ok());
        assert!(r2.await.unwrap().is_ok());
        assert_eq!(rr.await.unwrap().unwrap(), b"two");
        assert_eq!(
            executor.calls(),
            vec![CommandLine::shell("echo one"), CommandLine::shell("echo two")]
        );

        drop(tx);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_blocked_terminal_write_does_not_delay_device_status_read() {
        // Arrange: the terminal command blocks until the gate opens
        let executor = Arc::new(GatedExecutor {
            entered: Notify::new(),
            gate: Semaphore::new(0),
        });
        let (tx, rx) = mpsc::channel(8);
        let server = tokio::spawn(serve(engine(executor.clone()), rx));

        let (write_reply, mut write_response) = oneshot::channel();
        tx.send(GattEvent::Write {
            characteristic: CharacteristicKind::Terminal.uuid(),
            value: b"sleep 60".to_vec(),
            reply: write_reply,
        })
        .await
        .unwrap();
        executor.entered.notified().await;

        // Act
        let (read_reply, read_response) = oneshot::channel();
        tx.send(GattEvent::Read {
            characteristic: CharacteristicKind::DeviceStatus.uuid(),
            reply: read_reply,
        })
        .await
        .unwrap();
        let status = tokio::time::timeout(Duration::from_secs(1), read_response)
            .await
            .expect("device status read waited on the terminal lane");

        // Assert
        assert_eq!(status.unwrap().unwrap(), b"-1,Ready");
        assert!(matches!(
            write_response.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));

        executor.gate.add_permits(1);
        assert!(write_response.await.unwrap().is_ok());
        drop(tx);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_characteristic_is_answered() {
        let (tx, rx) = mpsc::channel(8);
        let server = tokio::spawn(serve(engine(Arc::new(FakeCommandExecutor::new())), rx));
        let id = Uuid::from_u128(7);

        let (reply, response) = oneshot::channel();
        tx.send(GattEvent::Read { characteristic: id, reply }).await.unwrap();

        assert_eq!(
            response.await.unwrap(),
            Err(BridgeError::UnknownCharacteristic(id))
        );
        drop(tx);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_serve_returns_when_transport_closes() {
        let (tx, rx) = mpsc::channel::<GattEvent>(1);
        drop(tx);
        serve(engine(Arc::new(FakeCommandExecutor::new())), rx).await;
    }
}
