//! Requests understood by the recorder service's HTTP API.
//!
//! Every request is an HTTP POST to a fixed path below the recorder base URL.
//! Control requests carry no body; settings requests carry a JSON object with
//! a fixed shape.
//!
//! ```text
//! /recording/settings       {gaze_overlay, gaze_file, audio, heat_map, location, file_format, front_resolution}
//! /miscellaneous/settings   {buzzer_on, glasses_led}
//! /recording/front/start    (empty)
//! /recording/front/stop     (empty)
//! /live/front/start         (empty)
//! /live/front/stop          (empty)
//! /live/eye/start           (empty)
//! /live/eye/stop            (empty)
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::error::BridgeError;

/// Payload of `/recording/settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub gaze_overlay: bool,
    pub gaze_file: bool,
    pub audio: bool,
    pub heat_map: bool,
    pub location: bool,
    pub file_format: String,
    pub front_resolution: String,
}

/// Behaviour of the LED on the glasses frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlassesLed {
    Off,
    On,
    Blinking,
    #[default]
    ContinuousBlinking,
}

/// Payload of `/miscellaneous/settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscSettings {
    pub buzzer_on: bool,
    pub glasses_led: GlassesLed,
}

/// One request to the recorder service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderRequest {
    StartRecording,
    StopRecording,
    StartFrontLive,
    StopFrontLive,
    StartEyeLive,
    StopEyeLive,
    RecordingSettings(RecordingSettings),
    MiscSettings(MiscSettings),
}

impl RecorderRequest {
    /// Path of the endpoint, relative to the recorder base URL.
    pub fn path(&self) -> &'static str {
        match self {
            RecorderRequest::StartRecording => "/recording/front/start",
            RecorderRequest::StopRecording => "/recording/front/stop",
            RecorderRequest::StartFrontLive => "/live/front/start",
            RecorderRequest::StopFrontLive => "/live/front/stop",
            RecorderRequest::StartEyeLive => "/live/eye/start",
            RecorderRequest::StopEyeLive => "/live/eye/stop",
            RecorderRequest::RecordingSettings(_) => "/recording/settings",
            RecorderRequest::MiscSettings(_) => "/miscellaneous/settings",
        }
    }

    /// JSON body of the request, `None` for control requests.
    pub fn body(&self) -> Option<serde_json::Value> {
        match self {
            RecorderRequest::RecordingSettings(s) => serde_json::to_value(s).ok(),
            RecorderRequest::MiscSettings(s) => serde_json::to_value(s).ok(),
            _ => None,
        }
    }
}

/// Outcome of one recorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderResponse {
    /// HTTP status, `None` if no response arrived (connect error, timeout).
    pub status: Option<u16>,
}

impl RecorderResponse {
    pub fn accepted(&self) -> bool {
        self.status == Some(200)
    }

    /// Converts a non-200 outcome into [`BridgeError::RemoteRequestFailure`].
    pub fn into_result(self, request: &RecorderRequest) -> Result<(), BridgeError> {
        if self.accepted() {
            return Ok(());
        }
        let detail = match self.status {
            Some(code) => format!("status {code}"),
            None => "no response".to_string(),
        };
        Err(BridgeError::RemoteRequestFailure {
            endpoint: request.path().to_string(),
            detail,
        })
    }
}

// ── Controller-side settings document ────────────────────────────────────────

/// The settings document a controller writes to the RemoteControl
/// characteristic, using the controller app's own key names.
///
/// ```json
/// {
///   "recording": {"gazeoverlay": true, "gazefile": true, "audio": false,
///                 "heatmap": false, "location": true, "container": "mp4",
///                 "fc_resolution": "1080p"},
///   "hmi": {"buzzer": true, "glasses_led": "on"}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettingsDocument {
    pub recording: RecordingSection,
    pub hmi: HmiSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordingSection {
    pub gazeoverlay: bool,
    pub gazefile: bool,
    pub audio: bool,
    pub heatmap: bool,
    pub location: bool,
    pub container: String,
    pub fc_resolution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HmiSection {
    pub buzzer: bool,
    #[serde(default)]
    pub glasses_led: GlassesLed,
}

impl SettingsDocument {
    /// Parses a settings document from a characteristic payload.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedInput`] if the payload is not a valid
    /// document.
    pub fn parse(payload: &[u8]) -> Result<Self, BridgeError> {
        serde_json::from_slice(payload)
            .map_err(|e| BridgeError::MalformedInput(format!("settings document: {e}")))
    }

    pub fn recording_settings(&self) -> RecordingSettings {
        let r = &self.recording;
        RecordingSettings {
            gaze_overlay: r.gazeoverlay,
            gaze_file: r.gazefile,
            audio: r.audio,
            heat_map: r.heatmap,
            location: r.location,
            file_format: r.container.clone(),
            front_resolution: r.fc_resolution.clone(),
        }
    }

    pub fn misc_settings(&self) -> MiscSettings {
        MiscSettings {
            buzzer_on: self.hmi.buzzer,
            glasses_led: self.hmi.glasses_led,
        }
    }
}
