//! HTTP client for the recorder service.
//!
//! The recorder runs on the same host and exposes a small JSON API under
//! `http://0.0.0.0:8000/api/v1/liteunit`.  Every request is a single POST
//! with a short timeout and no retries; the controller simply repeats the
//! command if nothing happens.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use thiserror::Error;
use tracing::{debug, warn};

use vps_core::protocol::recorder::{RecorderRequest, RecorderResponse};

use crate::application::ports::RecorderClient;

/// Default base URL of the recorder API.
pub const DEFAULT_BASE_URL: &str = "http://0.0.0.0:8000/api/v1/liteunit";

/// Default timeout of one recorder request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Error building the HTTP client.
#[derive(Debug, Error)]
pub enum RecorderClientError {
    #[error("recorder HTTP client init failed: {0}")]
    Init(#[from] reqwest::Error),
}

/// [`RecorderClient`] over HTTP.
pub struct HttpRecorderClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecorderClient {
    /// # Errors
    ///
    /// Returns [`RecorderClientError::Init`] if the TLS backend cannot be
    /// initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RecorderClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Full URL of `request`.
    pub fn url(&self, request: &RecorderRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }
}

#[async_trait]
impl RecorderClient for HttpRecorderClient {
    async fn send(&self, request: &RecorderRequest) -> RecorderResponse {
        let url = self.url(request);
        let mut builder = self.client.post(&url);
        if let Some(body) = request.body() {
            builder = builder.json(&body);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(%url, status, "recorder replied");
                RecorderResponse {
                    status: Some(status),
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "recorder request failed");
                RecorderResponse { status: None }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one connection, captures the raw request, answers `status`.
    async fn one_shot_server(status: u16) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            let reply = format!("HTTP/1.1 {status} X\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}/api/v1/liteunit"), task)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    #[tokio::test]
    async fn test_url_joins_base_and_path() {
        let client = HttpRecorderClient::new(DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(
            client.url(&RecorderRequest::StartEyeLive),
            "http://0.0.0.0:8000/api/v1/liteunit/live/eye/start"
        );
    }

    #[tokio::test]
    async fn test_start_posts_to_start_endpoint_and_accepts_200() {
        // Arrange
        let (base, server) = one_shot_server(200).await;
        let client = HttpRecorderClient::new(&base, DEFAULT_REQUEST_TIMEOUT).unwrap();

        // Act
        let accepted = client.start().await;
        let raw = server.await.unwrap();

        // Assert
        assert!(accepted);
        assert!(raw.starts_with("POST /api/v1/liteunit/recording/front/start HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("accept: application/json"));
    }

    #[tokio::test]
    async fn test_settings_are_posted_as_json() {
        // Arrange
        let (base, server) = one_shot_server(200).await;
        let client = HttpRecorderClient::new(&base, DEFAULT_REQUEST_TIMEOUT).unwrap();
        let settings = vps_core::protocol::recorder::MiscSettings {
            buzzer_on: true,
            glasses_led: Default::default(),
        };

        // Act
        let accepted = client.push_misc_settings(settings).await;
        let raw = server.await.unwrap();

        // Assert
        assert!(accepted);
        assert!(raw.contains("/miscellaneous/settings"));
        assert!(raw.contains(r#""buzzer_on":true"#));
        assert!(raw.contains(r#""glasses_led":"continuous-blinking""#));
    }

    #[tokio::test]
    async fn test_non_200_status_is_not_accepted() {
        let (base, server) = one_shot_server(503).await;
        let client = HttpRecorderClient::new(&base, DEFAULT_REQUEST_TIMEOUT).unwrap();

        let response = client.send(&RecorderRequest::StopRecording).await;
        server.await.unwrap();

        assert_eq!(response.status, Some(503));
        assert!(!response.accepted());
    }

    #[tokio::test]
    async fn test_unreachable_recorder_yields_no_status() {
        // Arrange: bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client =
            HttpRecorderClient::new(&format!("http://{addr}"), Duration::from_millis(500)).unwrap();

        // Act
        let response = client.send(&RecorderRequest::StartRecording).await;

        // Assert
        assert_eq!(response.status, None);
        assert!(!client.stop().await);
    }
}
