//! Runtime state of one characteristic.
//!
//! A [`Characteristic`] owns two locks:
//!
//! - a short-lived **state lock** (`std::sync::Mutex`) guarding the current
//!   value, the subscription, and the last absorbed failure.  It is never
//!   held across an `.await`, so it can never be held across I/O.
//! - an async **serial lock** that orders engine calls on this
//!   characteristic.  It *is* held across handler I/O, but only blocks other
//!   calls to the same characteristic.
//!
//! # Pushes and unsubscribe
//!
//! Every push (event-driven or scheduled) checks the subscription token and
//! hands the value to the [`NotificationSink`] while holding the state lock.
//! Unsubscribe cancels the token under the same lock.  Once
//! [`Characteristic::unsubscribe`] has returned, any later push attempt sees
//! the cancelled token and is dropped, including a scheduled fire that was
//! already computing its value when the controller unsubscribed.

use std::sync::{Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use uuid::Uuid;

use vps_core::{CharacteristicKind, ErrorKind};

use super::ports::NotificationSink;

/// The active subscription of a characteristic.
struct Subscription {
    token: CancellationToken,
    /// Periodic schedule, `None` for event-driven notification.
    task: Option<JoinHandle<()>>,
}

struct SlotState {
    value: Vec<u8>,
    subscription: Option<Subscription>,
    last_failure: Option<ErrorKind>,
}

/// One characteristic of the service, as seen by the engine.
pub struct Characteristic {
    kind: CharacteristicKind,
    state: Mutex<SlotState>,
    serial: tokio::sync::Mutex<()>,
}

impl Characteristic {
    pub fn new(kind: CharacteristicKind, initial: Vec<u8>) -> Self {
        Self {
            kind,
            state: Mutex::new(SlotState {
                value: initial,
                subscription: None,
                last_failure: None,
            }),
            serial: tokio::sync::Mutex::new(()),
        }
    }

    pub fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    pub fn uuid(&self) -> Uuid {
        self.kind.uuid()
    }

    /// Waits for exclusive use of this characteristic.
    pub async fn serialize(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.serial.lock().await
    }

    // A panic while the guard is held cannot leave the state half-written,
    // so a poisoned lock is still usable.
    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn value(&self) -> Vec<u8> {
        self.state().value.clone()
    }

    pub fn set_value(&self, value: Vec<u8>) {
        self.state().value = value;
    }

    pub fn is_notifying(&self) -> bool {
        self.state()
            .subscription
            .as_ref()
            .is_some_and(|s| !s.token.is_cancelled())
    }

    pub fn last_failure(&self) -> Option<ErrorKind> {
        self.state().last_failure
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.state().last_failure = Some(kind);
    }

    /// Replaces the value and, if subscribed, pushes it once.
    ///
    /// Returns `true` if a notification was pushed.
    pub fn update_and_notify(&self, value: Vec<u8>, sink: &dyn NotificationSink) -> bool {
        let mut state = self.state();
        state.value = value;
        let subscribed = state
            .subscription
            .as_ref()
            .is_some_and(|s| !s.token.is_cancelled());
        if subscribed {
            sink.notify(self.uuid(), state.value.clone());
        }
        subscribed
    }

    /// Pushes a scheduled value if `token` is still the live subscription.
    ///
    /// Returns `false` (and pushes nothing) once the subscription has been
    /// cancelled.
    pub fn fire(&self, token: &CancellationToken, value: Vec<u8>, sink: &dyn NotificationSink) -> bool {
        let mut state = self.state();
        if token.is_cancelled() {
            trace!(characteristic = %self.kind, "dropping push after unsubscribe");
            return false;
        }
        state.value = value;
        sink.notify(self.uuid(), state.value.clone());
        true
    }

    /// Opens a subscription unless one is already active.
    ///
    /// `arm` receives the new token and may start a schedule; it runs under
    /// the state lock and must not block.  Returns `false` for a duplicate
    /// subscribe, in which case `arm` is not called.
    pub fn subscribe<F>(&self, arm: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Option<JoinHandle<()>>,
    {
        let mut state = self.state();
        if state.subscription.is_some() {
            return false;
        }
        let token = CancellationToken::new();
        let task = arm(token.clone());
        state.subscription = Some(Subscription { token, task });
        true
    }

    /// Cancels the active subscription.
    ///
    /// Returns `false` if there was none.
    pub fn unsubscribe(&self) -> bool {
        let mut state = self.state();
        let Some(subscription) = state.subscription.take() else {
            return false;
        };
        subscription.token.cancel();
        if let Some(task) = subscription.task {
            task.abort();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::RecordingSink;

    #[test]
    fn test_update_without_subscription_does_not_push() {
        // Arrange
        let slot = Characteristic::new(CharacteristicKind::Terminal, Vec::new());
        let sink = RecordingSink::new();

        // Act
        let pushed = slot.update_and_notify(b"out".to_vec(), &sink);

        // Assert
        assert!(!pushed);
        assert_eq!(slot.value(), b"out");
        assert!(sink.pushes().is_empty());
    }

    #[test]
    fn test_update_while_subscribed_pushes_once() {
        // Arrange
        let slot = Characteristic::new(CharacteristicKind::Terminal, Vec::new());
        let sink = RecordingSink::new();
        assert!(slot.subscribe(|_| None));

        // Act
        slot.update_and_notify(b"hi\n".to_vec(), &sink);

        // Assert
        assert_eq!(
            sink.pushes(),
            vec![(CharacteristicKind::Terminal.uuid(), b"hi\n".to_vec())]
        );
    }

    #[test]
    fn test_second_subscribe_does_not_arm_again() {
        let slot = Characteristic::new(CharacteristicKind::DeviceStatus, Vec::new());
        let mut armed = 0;

        assert!(slot.subscribe(|_| {
            armed += 1;
            None
        }));
        assert!(!slot.subscribe(|_| {
            armed += 1;
            None
        }));

        assert_eq!(armed, 1);
        assert!(slot.is_notifying());
    }

    #[test]
    fn test_fire_with_cancelled_token_is_dropped() {
        // Arrange
        let slot = Characteristic::new(CharacteristicKind::DeviceStatus, b"-1,Ready".to_vec());
        let sink = RecordingSink::new();
        let mut captured = None;
        slot.subscribe(|token| {
            captured = Some(token);
            None
        });
        let token = captured.unwrap();

        // Act
        assert!(slot.unsubscribe());
        let fired = slot.fire(&token, b"50,Ready".to_vec(), &sink);

        // Assert
        assert!(!fired);
        assert!(sink.pushes().is_empty());
        assert_eq!(slot.value(), b"-1,Ready");
        assert!(!slot.is_notifying());
    }

    #[test]
    fn test_unsubscribe_when_idle_is_noop() {
        let slot = Characteristic::new(CharacteristicKind::Terminal, Vec::new());
        assert!(!slot.unsubscribe());
        assert!(!slot.is_notifying());
    }

    #[test]
    fn test_record_failure_is_visible() {
        let slot = Characteristic::new(CharacteristicKind::WifiConnect, Vec::new());
        assert_eq!(slot.last_failure(), None);
        slot.record_failure(ErrorKind::CommandFailure);
        assert_eq!(slot.last_failure(), Some(ErrorKind::CommandFailure));
    }
}
