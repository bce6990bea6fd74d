//! HTTP client for the cloud backend.
//!
//! Three endpoints: a binary record upload, a JSON status post, and the
//! per-vehicle telemetry update. Delivery is best-effort: a failure is
//! reported to the caller once and never retried here.

use std::time::Duration;

use crate::telemetry::TelemetryPacket;

/// Binary record upload endpoint.
pub const UPLOAD_ENDPOINT: &str = "/api/upload";
/// JSON status endpoint.
pub const STATUS_ENDPOINT: &str = "/api/status";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A failed delivery attempt.
#[derive(Debug)]
pub enum NetError {
    /// The request never completed.
    Transport(reqwest::Error),
    /// The backend answered with a non-success status.
    Status(u16),
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transfer failed: {err}"),
            Self::Status(code) => write!(f, "backend returned HTTP {code}"),
        }
    }
}

impl std::error::Error for NetError {}

impl From<reqwest::Error> for NetError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

/// Blocking client bound to one backend base URL.
pub struct NetworkClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl NetworkClient {
    /// Client for `base_url`, e.g. `http://192.168.1.100:8080`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("HTTP client construction failed");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a binary record to the upload endpoint.
    ///
    /// # Errors
    ///
    /// Returns the failed attempt; the caller decides whether to report it.
    pub fn send_data(&self, data: &[u8]) -> Result<(), NetError> {
        let response = self
            .client
            .post(self.url(UPLOAD_ENDPOINT))
            .header("Content-Type", "application/octet-stream")
            .body(data.to_vec())
            .send()?;
        check_status(response.status().as_u16())
    }

    /// POST a JSON status document.
    ///
    /// # Errors
    ///
    /// See [`send_data`](Self::send_data).
    pub fn send_status(&self, status: &serde_json::Value) -> Result<(), NetError> {
        let response = self
            .client
            .post(self.url(STATUS_ENDPOINT))
            .json(status)
            .send()?;
        check_status(response.status().as_u16())
    }

    /// POST a telemetry packet to the per-vehicle update endpoint.
    ///
    /// # Errors
    ///
    /// See [`send_data`](Self::send_data).
    pub fn send_telemetry(&self, packet: &TelemetryPacket) -> Result<(), NetError> {
        let path = format!("/api/v1/telemetry/{}/update", packet.vehicle_id);
        let response = self.client.post(self.url(&path)).json(packet).send()?;
        check_status(response.status().as_u16())
    }
}

fn check_status(code: u16) -> Result<(), NetError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(NetError::Status(code))
    }
}
