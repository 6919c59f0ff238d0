//! RemoteControl: drive the recorder service from the controller.

use std::sync::Arc;

use tracing::{info, warn};

use vps_core::protocol::recorder::RecorderRequest;
use vps_core::{BridgeError, RemotePayload};

use crate::application::ports::RecorderClient;

pub struct RemoteControl {
    recorder: Arc<dyn RecorderClient>,
}

impl RemoteControl {
    pub fn new(recorder: Arc<dyn RecorderClient>) -> Self {
        Self { recorder }
    }

    /// Decodes `payload` and issues the matching recorder request(s).
    ///
    /// Unknown command codes are logged and ignored.  A settings document
    /// pushes the recording settings and then the miscellaneous settings;
    /// both are attempted even if the first is rejected, and the first
    /// rejection is returned.
    pub async fn write(&self, payload: &[u8]) -> Result<(), BridgeError> {
        match RemotePayload::parse(payload)? {
            RemotePayload::Command(command) => {
                info!(code = command.code(), ?command, "remote command");
                self.issue(command.request()).await
            }
            RemotePayload::Settings(document) => {
                info!("applying settings document");
                let recording = self
                    .issue(RecorderRequest::RecordingSettings(document.recording_settings()))
                    .await;
                let misc = self
                    .issue(RecorderRequest::MiscSettings(document.misc_settings()))
                    .await;
                recording.and(misc)
            }
            RemotePayload::Unrecognized(text) => {
                warn!(payload = %text, "ignoring unrecognized remote command");
                Ok(())
            }
        }
    }

    async fn issue(&self, request: RecorderRequest) -> Result<(), BridgeError> {
        self.recorder.send(&request).await.into_result(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::{mock, predicate::eq, Sequence};
    use vps_core::protocol::recorder::RecorderResponse;
    use vps_core::ErrorKind;

    mock! {
        pub Recorder {}

        #[async_trait]
        impl RecorderClient for Recorder {
            async fn send(&self, request: &RecorderRequest) -> RecorderResponse;
        }
    }

    fn accepted() -> RecorderResponse {
        RecorderResponse { status: Some(200) }
    }

    const SETTINGS: &[u8] = br#"{"recording": {"gazeoverlay": true, "gazefile": false,
        "audio": true, "heatmap": false, "location": false, "container": "mp4",
        "fc_resolution": "1080p"}, "hmi": {"buzzer": true}}"#;

    #[tokio::test]
    async fn test_start_code_issues_start_exactly_once_and_never_stop() {
        // Arrange
        let mut recorder = MockRecorder::new();
        recorder
            .expect_send()
            .with(eq(RecorderRequest::StartRecording))
            .times(1)
            .returning(|_| accepted());
        let handler = RemoteControl::new(Arc::new(recorder));

        // Act / Assert: any other request (including stop) fails the mock
        handler.write(b"1").await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_code_issues_stop() {
        let mut recorder = MockRecorder::new();
        recorder
            .expect_send()
            .with(eq(RecorderRequest::StopRecording))
            .times(1)
            .returning(|_| accepted());
        let handler = RemoteControl::new(Arc::new(recorder));

        handler.write(b"2\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_code_issues_nothing() {
        let mut recorder = MockRecorder::new();
        recorder.expect_send().never();
        let handler = RemoteControl::new(Arc::new(recorder));

        handler.write(b"99").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_request_reports_remote_failure() {
        let mut recorder = MockRecorder::new();
        recorder
            .expect_send()
            .returning(|_| RecorderResponse { status: Some(500) });
        let handler = RemoteControl::new(Arc::new(recorder));

        let err = handler.write(b"3").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteRequestFailure);
    }

    #[tokio::test]
    async fn test_settings_document_pushes_recording_then_misc() {
        // Arrange
        let mut recorder = MockRecorder::new();
        let mut seq = Sequence::new();
        recorder
            .expect_send()
            .withf(|r| matches!(r, RecorderRequest::RecordingSettings(s) if s.file_format == "mp4"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| accepted());
        recorder
            .expect_send()
            .withf(|r| matches!(r, RecorderRequest::MiscSettings(s) if s.buzzer_on))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| accepted());
        let handler = RemoteControl::new(Arc::new(recorder));

        // Act / Assert
        handler.write(SETTINGS).await.unwrap();
    }

    #[tokio::test]
    async fn test_settings_document_still_pushes_misc_after_rejection() {
        let mut recorder = MockRecorder::new();
        recorder
            .expect_send()
            .withf(|r| matches!(r, RecorderRequest::RecordingSettings(_)))
            .times(1)
            .returning(|_| RecorderResponse { status: None });
        recorder
            .expect_send()
            .withf(|r| matches!(r, RecorderRequest::MiscSettings(_)))
            .times(1)
            .returning(|_| accepted());
        let handler = RemoteControl::new(Arc::new(recorder));

        let err = handler.write(SETTINGS).await.unwrap_err();

        match err {
            BridgeError::RemoteRequestFailure { endpoint, .. } => {
                assert_eq!(endpoint, "/recording/settings");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_settings_document_issues_nothing() {
        let mut recorder = MockRecorder::new();
        recorder.expect_send().never();
        let handler = RemoteControl::new(Arc::new(recorder));

        let err = handler.write(b"{\"recording\": 1}").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }
}
