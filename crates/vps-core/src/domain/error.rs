//! Failure taxonomy shared by every characteristic handler.
//!
//! Handlers convert every external failure (a command exiting non-zero, an
//! HTTP request that did not return 200, a telemetry reply without the
//! expected token) into one of these variants at their boundary.  Nothing
//! below the dispatch engine is allowed to panic on bad input or a failing
//! collaborator.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// The protocol operation a request attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Subscribe,
    Unsubscribe,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Subscribe => "subscribe",
            Operation::Unsubscribe => "unsubscribe",
        })
    }
}

/// Errors reported by the dispatch engine and its handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// No characteristic with this UUID is registered.
    #[error("unknown characteristic {0}")]
    UnknownCharacteristic(Uuid),

    /// The characteristic does not advertise the requested operation.
    #[error("characteristic {characteristic} does not support {operation}")]
    UnsupportedOperation {
        characteristic: Uuid,
        operation: Operation,
    },

    /// A written payload could not be parsed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A local command exited unsuccessfully, could not be spawned, or timed out.
    #[error("command `{command}` failed (code={code:?}): {detail}")]
    CommandFailure {
        command: String,
        code: Option<i32>,
        detail: String,
    },

    /// Host name or address resolution failed.
    #[error("network query failed: {0}")]
    NetworkQueryFailure(String),

    /// The recorder service answered with something other than 200, or not at all.
    #[error("recorder request {endpoint} failed: {detail}")]
    RemoteRequestFailure { endpoint: String, detail: String },

    /// The telemetry reply did not contain a battery value.
    #[error("telemetry reply could not be parsed: {0}")]
    TelemetryParseFailure(String),
}

/// Field-less discriminant of [`BridgeError`], cheap to store and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownCharacteristic,
    UnsupportedOperation,
    MalformedInput,
    CommandFailure,
    NetworkQueryFailure,
    RemoteRequestFailure,
    TelemetryParseFailure,
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::UnknownCharacteristic(_) => ErrorKind::UnknownCharacteristic,
            BridgeError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            BridgeError::MalformedInput(_) => ErrorKind::MalformedInput,
            BridgeError::CommandFailure { .. } => ErrorKind::CommandFailure,
            BridgeError::NetworkQueryFailure(_) => ErrorKind::NetworkQueryFailure,
            BridgeError::RemoteRequestFailure { .. } => ErrorKind::RemoteRequestFailure,
            BridgeError::TelemetryParseFailure(_) => ErrorKind::TelemetryParseFailure,
        }
    }

    /// Returns `true` for failures of an external collaborator (command,
    /// network query, HTTP, IPC).
    ///
    /// Write and subscribe paths log and absorb these; the remaining kinds
    /// describe the request itself and go back to the controller.
    pub fn is_external(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CommandFailure
                | ErrorKind::NetworkQueryFailure
                | ErrorKind::RemoteRequestFailure
                | ErrorKind::TelemetryParseFailure
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = BridgeError::MalformedInput("no separator".into());
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let err = BridgeError::CommandFailure {
            command: "false".into(),
            code: Some(1),
            detail: String::new(),
        };
        assert_eq!(err.kind(), ErrorKind::CommandFailure);
    }

    #[test]
    fn test_external_failures_are_classified() {
        assert!(BridgeError::NetworkQueryFailure("dns".into()).is_external());
        assert!(BridgeError::TelemetryParseFailure("empty".into()).is_external());
        assert!(BridgeError::RemoteRequestFailure {
            endpoint: "/recording/front/start".into(),
            detail: "status 500".into(),
        }
        .is_external());
    }

    #[test]
    fn test_request_failures_are_not_external() {
        assert!(!BridgeError::MalformedInput("x".into()).is_external());
        assert!(!BridgeError::UnknownCharacteristic(Uuid::nil()).is_external());
        assert!(!BridgeError::UnsupportedOperation {
            characteristic: Uuid::nil(),
            operation: Operation::Read,
        }
        .is_external());
    }

    #[test]
    fn test_unsupported_operation_message_names_operation() {
        let err = BridgeError::UnsupportedOperation {
            characteristic: Uuid::nil(),
            operation: Operation::Subscribe,
        };
        assert!(err.to_string().contains("subscribe"));
    }
}
