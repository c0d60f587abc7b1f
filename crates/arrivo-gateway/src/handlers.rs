// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook ingress.
//!
//! Handles POST /webhooks/status and GET /health. Expected ingest no-ops
//! (unknown message, stale transition) are acknowledged with 200 so the
//! gateway does not retry them forever.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use arrivo_core::types::StatusEvent;
use arrivo_engine::StatusIngestor;

use crate::signature::{verify_signature, SIGNATURE_HEADER};

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    /// The ingestion handler behind the authenticated boundary.
    pub ingestor: Arc<StatusIngestor>,
    /// Shared secret for signature verification. `None` rejects everything
    /// (fail-closed).
    pub webhook_secret: Option<String>,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

impl std::fmt::Debug for WebhookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookState")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Response body for accepted/ignored webhook deliveries.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// "accepted" or "ignored".
    pub status: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// POST /webhooks/status
///
/// Verifies the body signature, parses the status event, and applies it via
/// the ingestion handler. The signature is checked over the raw bytes before
/// any parsing.
pub async fn post_status(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Fail-closed: without a configured secret nothing gets in.
    let Some(ref secret) = state.webhook_secret else {
        error!("webhook secret not configured -- rejecting delivery");
        return unauthorized();
    };

    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if verify_signature(secret, &body, header).is_err() {
        warn!("webhook delivery with missing or invalid signature rejected");
        return unauthorized();
    }

    let event: StatusEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "malformed webhook payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("malformed payload: {e}"),
                }),
            )
                .into_response();
        }
    };

    match state.ingestor.ingest(&event).await {
        Ok(()) => (
            StatusCode::OK,
            Json(WebhookResponse {
                status: "accepted".to_string(),
            }),
        )
            .into_response(),
        Err(e) if e.is_ingest_noop() => {
            // Logged no-op; acknowledge so the gateway stops retrying.
            info!(message_id = %event.message_id, reason = %e, "status event ignored");
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "ignored".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(message_id = %event.message_id, error = %e, "status ingestion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "ingestion failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "unauthorized".to_string(),
        }),
    )
        .into_response()
}

/// GET /health
///
/// Unauthenticated liveness endpoint for process supervisors.
pub async fn get_health(State(state): State<WebhookState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn webhook_state_debug_redacts_secret() {
        let db = arrivo_storage::Database::open_in_memory().await.unwrap();
        let state = WebhookState {
            ingestor: Arc::new(StatusIngestor::new(db)),
            webhook_secret: Some("supersecret".to_string()),
            start_time: std::time::Instant::now(),
        };
        let debug = format!("{state:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
    }
}
