// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the messaging gateway's send API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use arrivo_config::model::GatewayConfig;
use arrivo_core::ArrivoError;
use arrivo_core::traits::MessagingGateway;
use arrivo_core::types::{MessageId, OutboundMessage};

/// Request body for the gateway's send endpoint.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    body: &'a str,
    template: bool,
}

/// Response body from the gateway's send endpoint.
#[derive(Debug, Deserialize)]
struct SendResponse {
    message_id: String,
}

/// reqwest-backed implementation of [`MessagingGateway`].
pub struct HttpMessagingGateway {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpMessagingGateway {
    /// Build a client from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ArrivoError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.send_timeout_secs))
            .build()
            .map_err(|e| ArrivoError::Config(format!("gateway http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl MessagingGateway for HttpMessagingGateway {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ArrivoError> {
        let url = format!("{}/v1/messages", self.base_url);
        let mut request = self.http.post(&url).json(&SendRequest {
            to: &msg.phone,
            body: &msg.body,
            template: msg.template,
        });
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ArrivoError::Send {
            message: format!("gateway unreachable: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArrivoError::Send {
                message: format!("gateway returned {status}"),
                source: None,
            });
        }

        let parsed: SendResponse = response.json().await.map_err(|e| ArrivoError::Send {
            message: format!("gateway response decode: {e}"),
            source: Some(Box::new(e)),
        })?;

        debug!(message_id = %parsed.message_id, template = msg.template, "gateway send ok");
        Ok(MessageId(parsed.message_id))
    }
}
