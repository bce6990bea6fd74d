//! Cloud endpoint development server.
//!
//! Receives what the platform's Ethernet path and telemetry sender emit:
//! binary record uploads, JSON status documents, and per-vehicle telemetry
//! updates. Intended as the local stand-in for the production backend while
//! developing against the simulator.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::Mutex;

/// Shared server state.
struct AppState {
    stats: Mutex<BackendStats>,
}

#[derive(Default, Clone)]
struct BackendStats {
    uploads: u64,
    upload_bytes: u64,
    status_posts: u64,
    telemetry_posts: u64,
    last_vehicle: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    received_bytes: usize,
}

#[derive(Serialize)]
struct AckResponse {
    success: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    uploads: u64,
    upload_bytes: u64,
    status_posts: u64,
    telemetry_posts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_vehicle: Option<String>,
}

/// Build the backend router.
#[must_use]
pub fn router() -> Router {
    let state = Arc::new(AppState {
        stats: Mutex::new(BackendStats::default()),
    });
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/status", post(status))
        .route("/api/v1/telemetry/{vehicle}/update", post(telemetry))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn upload(State(state): State<Arc<AppState>>, body: Bytes) -> Json<UploadResponse> {
    let mut stats = state.stats.lock().await;
    stats.uploads += 1;
    stats.upload_bytes += body.len() as u64;
    Json(UploadResponse {
        success: true,
        received_bytes: body.len(),
    })
}

async fn status(
    State(state): State<Arc<AppState>>,
    Json(document): Json<serde_json::Value>,
) -> (StatusCode, Json<AckResponse>) {
    if !document.is_object() {
        return (StatusCode::BAD_REQUEST, Json(AckResponse { success: false }));
    }
    state.stats.lock().await.status_posts += 1;
    (StatusCode::OK, Json(AckResponse { success: true }))
}

async fn telemetry(
    State(state): State<Arc<AppState>>,
    Path(vehicle): Path<String>,
    Json(_packet): Json<serde_json::Value>,
) -> Json<AckResponse> {
    let mut stats = state.stats.lock().await;
    stats.telemetry_posts += 1;
    stats.last_vehicle = Some(vehicle);
    Json(AckResponse { success: true })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.stats.lock().await.clone();
    Json(HealthResponse {
        status: "ok".to_string(),
        uploads: stats.uploads,
        upload_bytes: stats.upload_bytes,
        status_posts: stats.status_posts,
        telemetry_posts: stats.telemetry_posts,
        last_vehicle: stats.last_vehicle,
    })
}

/// Bind and serve until shutdown.
///
/// # Errors
///
/// Returns an error when the listen socket cannot be bound or the server
/// loop fails.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    println!("cloud endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            stats: Mutex::new(BackendStats::default()),
        })
    }

    #[tokio::test]
    async fn test_upload_counts_bytes() {
        let state = test_state();
        let response = upload(State(Arc::clone(&state)), Bytes::from_static(b"record")).await;
        assert!(response.0.success);
        assert_eq!(response.0.received_bytes, 6);

        let stats = state.stats.lock().await;
        assert_eq!(stats.uploads, 1);
        assert_eq!(stats.upload_bytes, 6);
    }

    #[tokio::test]
    async fn test_status_rejects_non_objects() {
        let state = test_state();
        let (code, ack) = status(State(Arc::clone(&state)), Json(serde_json::json!(42))).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(!ack.0.success);
        assert_eq!(state.stats.lock().await.status_posts, 0);
    }

    #[tokio::test]
    async fn test_telemetry_tracks_last_vehicle() {
        let state = test_state();
        let _ = telemetry(
            State(Arc::clone(&state)),
            Path("BB-001".to_string()),
            Json(serde_json::json!({ "speed_kph": 42.0 })),
        )
        .await;

        let stats = state.stats.lock().await;
        assert_eq!(stats.telemetry_posts, 1);
        assert_eq!(stats.last_vehicle.as_deref(), Some("BB-001"));
    }

    #[tokio::test]
    async fn test_health_snapshot() {
        let state = test_state();
        let _ = upload(State(Arc::clone(&state)), Bytes::from_static(b"xy")).await;
        let health = health(State(state)).await;
        assert_eq!(health.0.status, "ok");
        assert_eq!(health.0.uploads, 1);
        assert_eq!(health.0.upload_bytes, 2);
    }
}
