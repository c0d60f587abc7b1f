// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manager notification over the messaging gateway.
//!
//! Sends the escalation alert as a message to the configured manager phone.
//! Without a configured phone the alert is logged only — useful for
//! development and for deployments that wire a different channel.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use arrivo_core::ArrivoError;
use arrivo_core::traits::{ManagerNotifier, MessagingGateway};
use arrivo_core::types::{BookingRiskContext, OutboundMessage, RiskAssessment};

/// [`ManagerNotifier`] that messages the manager through the same gateway
/// used for customer traffic.
pub struct GatewayNotifier {
    gateway: Arc<dyn MessagingGateway>,
    manager_phone: Option<String>,
}

impl GatewayNotifier {
    pub fn new(gateway: Arc<dyn MessagingGateway>, manager_phone: Option<String>) -> Self {
        Self {
            gateway,
            manager_phone,
        }
    }
}

#[async_trait]
impl ManagerNotifier for GatewayNotifier {
    async fn notify_manager(
        &self,
        booking: &BookingRiskContext,
        assessment: &RiskAssessment,
    ) -> Result<(), ArrivoError> {
        let Some(ref phone) = self.manager_phone else {
            warn!(
                booking_id = %booking.booking_id,
                score = assessment.score,
                level = %assessment.level,
                "no manager phone configured; escalation alert logged only"
            );
            return Ok(());
        };

        let service = booking.service_name.as_deref().unwrap_or("appointment");
        let body = format!(
            "No-show alert: {service} at {} (booking {}) is at {} risk \
             (score {}). Customer {} has not confirmed.",
            booking.appointment_time.format("%Y-%m-%d %H:%M"),
            booking.booking_id,
            assessment.level,
            assessment.score,
            booking.phone,
        );

        self.gateway
            .send(OutboundMessage {
                phone: phone.clone(),
                body,
                template: true,
            })
            .await
            .map(|_| ())
            .map_err(|e| ArrivoError::Notify {
                message: e.to_string(),
            })
    }
}
