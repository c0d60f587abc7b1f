// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingress HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Signature verification
//! happens inside the webhook handler (it needs the raw body bytes), so the
//! router itself stays thin.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use arrivo_core::ArrivoError;

use crate::handlers::{self, WebhookState};

/// Webhook server configuration (mirrors ServerConfig from arrivo-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the ingress router. Split out from [`start_server`] so tests can
/// drive it without binding a socket.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhooks/status", post(handlers::post_status))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the webhook ingress server. Runs until the process exits.
pub async fn start_server(config: &ServerConfig, state: WebhookState) -> Result<(), ArrivoError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ArrivoError::Internal(format!("failed to bind ingress to {addr}: {e}")))?;

    tracing::info!("webhook ingress listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| ArrivoError::Internal(format!("ingress server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8585,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("8585"));
    }
}
