//! Peripheral transport adapters.
//!
//! - **`console`** – a development transport speaking newline-delimited JSON
//!   over any async byte stream (stdin/stdout in the binary).
//!
//! Every transport delivers pushed values through a
//! [`ChannelNotificationSink`]: the engine calls
//! [`NotificationSink::notify`] under a characteristic lock, so the sink
//! only enqueues and the transport's writer task does the actual I/O.

pub mod console;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::ports::NotificationSink;

/// One value pushed to a subscribed controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub characteristic: Uuid,
    pub value: Vec<u8>,
}

/// [`NotificationSink`] that enqueues onto an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotificationSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, characteristic: Uuid, value: Vec<u8>) {
        // The receiver only goes away at shutdown.
        let _ = self.tx.send(Notification {
            characteristic,
            value,
        });
    }
}
