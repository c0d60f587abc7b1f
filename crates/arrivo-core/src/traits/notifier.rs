// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification channel trait for alerting a human manager.

use async_trait::async_trait;

use crate::error::ArrivoError;
use crate::types::{BookingRiskContext, RiskAssessment};

/// The channel used to hand a high-risk booking over to a human.
///
/// Best-effort: callers log failures and continue; a lost notification never
/// blocks or fails the escalation pipeline.
#[async_trait]
pub trait ManagerNotifier: Send + Sync {
    /// Alert the manager that `booking` needs human intervention.
    async fn notify_manager(
        &self,
        booking: &BookingRiskContext,
        assessment: &RiskAssessment,
    ) -> Result<(), ArrivoError>;
}
