// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingress and messaging-gateway client for Arrivo.
//!
//! The ingress authenticates gateway status callbacks with HMAC-SHA256 body
//! signatures and hands verified events to the ingestion handler. The client
//! side implements the [`arrivo_core::MessagingGateway`] trait over the
//! gateway's HTTP send API.

pub mod client;
pub mod handlers;
pub mod notify;
pub mod server;
pub mod signature;

pub use client::HttpMessagingGateway;
pub use handlers::WebhookState;
pub use notify::GatewayNotifier;
pub use server::{ServerConfig, router, start_server};
