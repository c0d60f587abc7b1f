// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging gateway trait for the service that actually delivers messages.

use async_trait::async_trait;

use crate::error::ArrivoError;
use crate::types::{MessageId, OutboundMessage};

/// The external messaging service (WhatsApp-class) that delivers outbound
/// messages and later reports their status via webhook callbacks.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a message to a customer. Returns the gateway-assigned message id
    /// that subsequent status callbacks will reference.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ArrivoError>;
}
