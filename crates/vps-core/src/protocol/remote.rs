//! Command codes written to the RemoteControl characteristic.
//!
//! The code table is total over the advertised codes and every code maps to
//! exactly one recorder action:
//!
//! | code | action                |
//! |------|-----------------------|
//! | 1    | start recording       |
//! | 2    | stop recording        |
//! | 3    | start front live view |
//! | 4    | stop front live view  |
//! | 5    | start eye live view   |
//! | 6    | stop eye live view    |
//!
//! Codes outside the table decode to [`RemotePayload::Unrecognized`], which
//! the handler treats as a no-op.  A payload starting with `{` is a
//! [`SettingsDocument`].

use crate::domain::error::BridgeError;
use crate::protocol::recorder::{RecorderRequest, SettingsDocument};

/// A recorder action selected by a command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    StartRecording,
    StopRecording,
    StartFrontLive,
    StopFrontLive,
    StartEyeLive,
    StopEyeLive,
}

impl RemoteCommand {
    pub const ALL: [RemoteCommand; 6] = [
        RemoteCommand::StartRecording,
        RemoteCommand::StopRecording,
        RemoteCommand::StartFrontLive,
        RemoteCommand::StopFrontLive,
        RemoteCommand::StartEyeLive,
        RemoteCommand::StopEyeLive,
    ];

    pub fn code(self) -> u8 {
        match self {
            RemoteCommand::StartRecording => 1,
            RemoteCommand::StopRecording => 2,
            RemoteCommand::StartFrontLive => 3,
            RemoteCommand::StopFrontLive => 4,
            RemoteCommand::StartEyeLive => 5,
            RemoteCommand::StopEyeLive => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// The recorder request this command issues.
    pub fn request(self) -> RecorderRequest {
        match self {
            RemoteCommand::StartRecording => RecorderRequest::StartRecording,
            RemoteCommand::StopRecording => RecorderRequest::StopRecording,
            RemoteCommand::StartFrontLive => RecorderRequest::StartFrontLive,
            RemoteCommand::StopFrontLive => RecorderRequest::StopFrontLive,
            RemoteCommand::StartEyeLive => RecorderRequest::StartEyeLive,
            RemoteCommand::StopEyeLive => RecorderRequest::StopEyeLive,
        }
    }
}

/// A decoded RemoteControl write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemotePayload {
    Command(RemoteCommand),
    Settings(Box<SettingsDocument>),
    /// Text that is not a code in the table; kept for the log line.
    Unrecognized(String),
}

impl RemotePayload {
    /// Decodes a RemoteControl payload.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedInput`] for non-UTF-8 payloads and for
    /// settings documents that do not parse.  Unknown codes are not errors.
    pub fn parse(payload: &[u8]) -> Result<Self, BridgeError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| BridgeError::MalformedInput("remote payload is not UTF-8".into()))?
            .trim();

        if text.starts_with('{') {
            return SettingsDocument::parse(text.as_bytes())
                .map(|doc| RemotePayload::Settings(Box::new(doc)));
        }

        match text.parse::<u8>().ok().and_then(RemoteCommand::from_code) {
            Some(command) => Ok(RemotePayload::Command(command)),
            None => {
                tracing::trace!(code = %text, "remote code not in the table");
                Ok(RemotePayload::Unrecognized(text.to_string()))
            }
        }
    }
}
