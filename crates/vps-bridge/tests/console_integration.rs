//! End-to-end test of the console transport.
//!
//! Requests go in as JSON lines over an in-memory pipe, through the event
//! loop and the dispatch engine, and replies come back as JSON lines.  The
//! test runs in lock-step: one request, then its reply.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::mpsc;

use vps_bridge::application::characteristics::Ports;
use vps_bridge::application::dispatch::{DispatchEngine, EngineConfig};
use vps_bridge::application::event_loop;
use vps_bridge::application::ports::{CommandResult, PeripheralTransport};
use vps_bridge::infrastructure::mock::{
    FakeCommandExecutor, FakeNetworkInfo, FakeRecorder, FakeTelemetry,
};
use vps_bridge::infrastructure::transport::console::ConsoleTransport;
use vps_core::{CharacteristicKind, ServiceDescriptor};

struct Client {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
}

impl Client {
    async fn send(&mut self, request: Value) {
        let mut line = request.to_string();
        line.push('\n');
        self.input.write_all(line.as_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = self
            .output
            .next_line()
            .await
            .unwrap()
            .expect("console output closed");
        serde_json::from_str(&line).unwrap()
    }
}

#[tokio::test]
async fn test_console_round_trip_through_engine() {
    // Arrange
    let (client_in, server_in) = tokio::io::duplex(4096);
    let (server_out, client_out) = tokio::io::duplex(4096);

    let executor = Arc::new(FakeCommandExecutor::new());
    executor.push_result(CommandResult::ok("hi\n"));
    let telemetry = Arc::new(FakeTelemetry::new());
    telemetry.push_percentage(87);
    let ports = Ports {
        executor,
        network: Arc::new(FakeNetworkInfo::connected("LabNet")),
        telemetry,
        recorder: Arc::new(FakeRecorder::new()),
    };

    let (transport, sink, writer) = ConsoleTransport::spawn(server_out);
    let engine = Arc::new(DispatchEngine::new(
        ports,
        Arc::new(sink),
        EngineConfig::default(),
    ));
    transport.register(&ServiceDescriptor::vps()).await.unwrap();

    let (events_tx, events_rx) = mpsc::channel(8);
    let server = tokio::spawn(event_loop::serve(Arc::clone(&engine), events_rx));
    let reader = tokio::spawn(async move {
        transport
            .run_requests(BufReader::new(server_in), events_tx)
            .await
    });

    let mut client = Client {
        input: client_in,
        output: BufReader::new(client_out).lines(),
    };

    // Act / Assert: registration comes first
    let registered = client.recv().await;
    assert_eq!(registered["kind"], "registered");
    assert_eq!(registered["characteristics"].as_array().unwrap().len(), 7);

    client
        .send(json!({"op": "read", "characteristic": "ip", "id": 1}))
        .await;
    let reply = client.recv().await;
    assert_eq!(reply["kind"], "value");
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["value"], "192.168.4.20");

    client
        .send(json!({"op": "read", "characteristic": "device-status", "id": 2}))
        .await;
    assert_eq!(client.recv().await["value"], "87,Ready");

    client
        .send(json!({"op": "subscribe", "characteristic": "terminal", "id": 3}))
        .await;
    let reply = client.recv().await;
    assert_eq!(reply["kind"], "ok");
    assert_eq!(
        reply["characteristic"],
        CharacteristicKind::Terminal.uuid().to_string()
    );

    client
        .send(json!({"op": "write", "characteristic": "terminal", "value": "echo hi", "id": 4}))
        .await;
    // The push is queued before the write is acknowledged.
    let notification = client.recv().await;
    assert_eq!(notification["kind"], "notification");
    assert_eq!(notification["value"], "hi\n");
    let reply = client.recv().await;
    assert_eq!(reply["kind"], "ok");
    assert_eq!(reply["id"], 4);

    client
        .send(json!({"op": "unsubscribe", "characteristic": "terminal", "id": 5}))
        .await;
    assert_eq!(client.recv().await["kind"], "ok");

    client
        .send(json!({"op": "read", "characteristic": "wifi-connect", "id": 6}))
        .await;
    let reply = client.recv().await;
    assert_eq!(reply["kind"], "error");
    assert_eq!(reply["id"], 6);

    client
        .send(json!({"op": "read", "characteristic": "no-such-thing", "id": 7}))
        .await;
    assert_eq!(client.recv().await["kind"], "error");

    client.input.write_all(b"not json\n").await.unwrap();
    assert_eq!(client.recv().await["kind"], "error");

    // Closing the input ends the request reader and the event loop.
    drop(client.input);
    reader.await.unwrap().unwrap();
    server.await.unwrap();
    engine.shutdown();
    drop(engine);
    writer.await.unwrap().unwrap();
}
