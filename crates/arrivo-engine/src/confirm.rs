// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmation send: the entry point of a tracking record's lifecycle.
//!
//! A record is created exactly once, when the confirmation message goes
//! out. If the gateway send fails there is nothing to track and the error
//! propagates to the caller.

use std::sync::Arc;

use tracing::info;

use arrivo_core::ArrivoError;
use arrivo_core::traits::MessagingGateway;
use arrivo_core::types::{
    Booking, Customer, MessageId, MessageStatus, MessageTrackingRecord, MessageType,
    OutboundMessage,
};
use arrivo_storage::Database;
use arrivo_storage::database::now_iso;
use arrivo_storage::queries::tracking;

/// Sends booking confirmations and creates their tracking records.
pub struct ConfirmationSender {
    db: Database,
    gateway: Arc<dyn MessagingGateway>,
}

impl ConfirmationSender {
    pub fn new(db: Database, gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { db, gateway }
    }

    /// Send the confirmation for `booking` and create its tracking record.
    ///
    /// Returns the gateway message id that later status callbacks will
    /// reference.
    pub async fn send_confirmation(
        &self,
        booking: &Booking,
        customer: &Customer,
    ) -> Result<MessageId, ArrivoError> {
        let service = booking.service_name.as_deref().unwrap_or("appointment");
        let body = format!(
            "Hi{}! This confirms your {service} on {}. Reply here if anything \
             changes.",
            customer
                .display_name
                .as_deref()
                .map(|n| format!(" {n}"))
                .unwrap_or_default(),
            booking.appointment_time
        );

        // Business-initiated first contact is always a template message.
        let message_id = self
            .gateway
            .send(OutboundMessage {
                phone: customer.phone.clone(),
                body,
                template: true,
            })
            .await?;

        let now = now_iso();
        let record = MessageTrackingRecord {
            message_id: message_id.0.clone(),
            conversation_id: booking.conversation_id.clone(),
            booking_id: booking.id.clone(),
            message_type: MessageType::Confirmation,
            status: MessageStatus::Sent,
            sent_at: now.clone(),
            delivered_at: None,
            read_at: None,
            follow_up_scheduled: false,
            follow_up_sent_count: 0,
            risk_score: 0,
            escalation_triggered: false,
            updated_at: now,
        };
        tracking::create_tracking(&self.db, &record).await?;

        info!(
            booking_id = %booking.id,
            message_id = %record.message_id,
            "confirmation sent and tracked"
        );
        Ok(message_id)
    }
}
