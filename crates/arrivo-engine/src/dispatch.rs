// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Action dispatch: maps a risk assessment to one prevention action.
//!
//! Critical/high assessments hand the booking to a human (manager
//! notification, no customer message); medium/low send a reminder through
//! the gateway. Every dispatch consults the action log first, so re-fired
//! timers and sweep re-arms cannot double-act.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use arrivo_core::traits::{ManagerNotifier, MessagingGateway};
use arrivo_core::types::{
    BookingRiskContext, EscalationTier, MessageTrackingRecord, OutboundMessage, PreventionAction,
    PreventionActionLogEntry, RiskAssessment, RiskLevel,
};
use arrivo_core::ArrivoError;
use arrivo_storage::Database;
use arrivo_storage::database::now_iso;
use arrivo_storage::queries::{actions, tracking};

use crate::gate;

/// Result of a dispatch attempt.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// An action was taken and logged.
    Acted(PreventionActionLogEntry),
    /// The same action was already logged for this tier; no-op.
    AlreadyActed,
    /// The outbound send failed; nothing was recorded and the tier stays
    /// eligible for one retry on the next natural schedule check.
    SendFailed,
}

/// Maps risk level + tier to the single action this dispatch will take.
pub fn primary_action(level: RiskLevel, tier: EscalationTier) -> PreventionAction {
    match (level, tier) {
        (RiskLevel::Critical | RiskLevel::High, _) => PreventionAction::ManagerIntervention,
        (_, EscalationTier::Escalation) => PreventionAction::UrgentReminder,
        (RiskLevel::Medium, EscalationTier::Reminder) => PreventionAction::GentleReminder,
        (RiskLevel::Low, EscalationTier::Reminder) => PreventionAction::StandardReminder,
    }
}

/// Compose the customer-facing reminder text.
fn compose_reminder(
    context: &BookingRiskContext,
    action: PreventionAction,
    now: DateTime<Utc>,
) -> String {
    let service = context.service_name.as_deref().unwrap_or("appointment");
    let when = context.appointment_time.format("%A %H:%M");
    let hours = context.hours_until_appointment(now);

    match action {
        PreventionAction::UrgentReminder => format!(
            "Your {service} is coming up on {when} ({hours:.0}h from now). \
             Please reply to confirm you can make it, or let us know if you \
             need to reschedule."
        ),
        PreventionAction::GentleReminder => format!(
            "Just a friendly reminder about your {service} on {when}. \
             We look forward to seeing you!"
        ),
        _ => format!("Reminder: your {service} is scheduled for {when}."),
    }
}

/// Dispatches prevention actions for a fired escalation check.
pub struct ActionDispatcher {
    db: Database,
    gateway: Arc<dyn MessagingGateway>,
    notifier: Arc<dyn ManagerNotifier>,
    session_window: chrono::Duration,
}

impl ActionDispatcher {
    pub fn new(
        db: Database,
        gateway: Arc<dyn MessagingGateway>,
        notifier: Arc<dyn ManagerNotifier>,
        session_window: chrono::Duration,
    ) -> Self {
        Self {
            db,
            gateway,
            notifier,
            session_window,
        }
    }

    /// Take the prevention action implied by `assessment` for this tier.
    pub async fn dispatch(
        &self,
        context: &BookingRiskContext,
        record: &MessageTrackingRecord,
        assessment: &RiskAssessment,
        tier: EscalationTier,
    ) -> Result<DispatchOutcome, ArrivoError> {
        let action = primary_action(assessment.level, tier);

        if actions::action_exists(&self.db, &record.message_id, action, tier).await? {
            debug!(
                message_id = %record.message_id,
                %action,
                %tier,
                "action already logged for this tier; skipping"
            );
            return Ok(DispatchOutcome::AlreadyActed);
        }

        match action {
            PreventionAction::ManagerIntervention => {
                self.escalate(context, record, assessment, tier, None).await
            }
            _ => {
                self.send_reminder(context, record, assessment, tier, action)
                    .await
            }
        }
    }

    /// Escalate after the outbound send failed on a re-armed check too.
    /// Surfaces the booking to a human instead of retrying forever.
    pub async fn escalate_send_failure(
        &self,
        context: &BookingRiskContext,
        record: &MessageTrackingRecord,
        assessment: &RiskAssessment,
        tier: EscalationTier,
    ) -> Result<DispatchOutcome, ArrivoError> {
        if actions::action_exists(
            &self.db,
            &record.message_id,
            PreventionAction::ManagerIntervention,
            tier,
        )
        .await?
        {
            return Ok(DispatchOutcome::AlreadyActed);
        }
        self.escalate(
            context,
            record,
            assessment,
            tier,
            Some("reminder send failed after retry"),
        )
        .await
    }

    async fn escalate(
        &self,
        context: &BookingRiskContext,
        record: &MessageTrackingRecord,
        assessment: &RiskAssessment,
        tier: EscalationTier,
        reason: Option<&str>,
    ) -> Result<DispatchOutcome, ArrivoError> {
        // The latch is the idempotence anchor: exactly one dispatch wins it.
        let won = tracking::latch_escalation(&self.db, &record.message_id).await?;
        if !won {
            debug!(
                message_id = %record.message_id,
                "escalation already triggered; skipping"
            );
            return Ok(DispatchOutcome::AlreadyActed);
        }

        // Best-effort: a lost notification is logged, never propagated.
        if let Err(e) = self.notifier.notify_manager(context, assessment).await {
            warn!(
                booking_id = %context.booking_id,
                error = %e,
                "manager notification failed"
            );
        }

        let metadata = serde_json::json!({
            "level": assessment.level,
            "recommended_actions": assessment.recommended_actions,
            "reason": reason,
        })
        .to_string();
        let entry = self
            .append_entry(
                context,
                record,
                assessment,
                PreventionAction::ManagerIntervention,
                tier,
                Some(metadata),
            )
            .await?;

        info!(
            booking_id = %context.booking_id,
            message_id = %record.message_id,
            score = assessment.score,
            level = %assessment.level,
            "booking escalated to manager"
        );
        Ok(DispatchOutcome::Acted(entry))
    }

    async fn send_reminder(
        &self,
        context: &BookingRiskContext,
        record: &MessageTrackingRecord,
        assessment: &RiskAssessment,
        tier: EscalationTier,
        action: PreventionAction,
    ) -> Result<DispatchOutcome, ArrivoError> {
        let now = Utc::now();
        let body = compose_reminder(context, action, now);
        let template = !gate::session_window_open(context, self.session_window, now);

        // The send happens after all store reads; no store lock is held
        // across the gateway call.
        let message_id = match self
            .gateway
            .send(OutboundMessage {
                phone: context.phone.clone(),
                body,
                template,
            })
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    booking_id = %context.booking_id,
                    message_id = %record.message_id,
                    error = %e,
                    "reminder send failed; counters untouched"
                );
                return Ok(DispatchOutcome::SendFailed);
            }
        };

        tracking::increment_follow_up_sent(&self.db, &record.message_id).await?;
        let metadata = serde_json::json!({
            "gateway_message_id": message_id.0,
            "template": template,
        })
        .to_string();
        let entry = self
            .append_entry(context, record, assessment, action, tier, Some(metadata))
            .await?;

        info!(
            booking_id = %context.booking_id,
            message_id = %record.message_id,
            %action,
            %tier,
            template,
            "reminder sent"
        );
        Ok(DispatchOutcome::Acted(entry))
    }

    async fn append_entry(
        &self,
        context: &BookingRiskContext,
        record: &MessageTrackingRecord,
        assessment: &RiskAssessment,
        action: PreventionAction,
        tier: EscalationTier,
        metadata: Option<String>,
    ) -> Result<PreventionActionLogEntry, ArrivoError> {
        let entry = PreventionActionLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: context.booking_id.clone(),
            message_id: record.message_id.clone(),
            action,
            tier,
            risk_score_at_time: assessment.score,
            metadata,
            created_at: now_iso(),
        };
        actions::append_action(&self.db, &entry).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrivo_core::types::ClientProfile;

    #[test]
    fn critical_and_high_go_to_a_human() {
        for level in [RiskLevel::Critical, RiskLevel::High] {
            for tier in [EscalationTier::Reminder, EscalationTier::Escalation] {
                assert_eq!(
                    primary_action(level, tier),
                    PreventionAction::ManagerIntervention
                );
            }
        }
    }

    #[test]
    fn reminder_tier_maps_by_level() {
        assert_eq!(
            primary_action(RiskLevel::Medium, EscalationTier::Reminder),
            PreventionAction::GentleReminder
        );
        assert_eq!(
            primary_action(RiskLevel::Low, EscalationTier::Reminder),
            PreventionAction::StandardReminder
        );
    }

    #[test]
    fn escalation_tier_is_urgent_for_message_levels() {
        assert_eq!(
            primary_action(RiskLevel::Medium, EscalationTier::Escalation),
            PreventionAction::UrgentReminder
        );
        assert_eq!(
            primary_action(RiskLevel::Low, EscalationTier::Escalation),
            PreventionAction::UrgentReminder
        );
    }

    #[test]
    fn reminder_text_mentions_the_service() {
        let now = DateTime::parse_from_rfc3339("2026-03-04T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ctx = BookingRiskContext {
            booking_id: "b1".into(),
            customer_id: "c1".into(),
            phone: "+15550001111".into(),
            appointment_time: now + chrono::Duration::hours(6),
            service_name: Some("haircut".into()),
            service_value: 40.0,
            client: ClientProfile {
                visit_count: 1,
                no_show_count: 0,
                is_vip: false,
            },
            last_inbound_at: None,
            confirmation_read: false,
        };

        let gentle = compose_reminder(&ctx, PreventionAction::GentleReminder, now);
        assert!(gentle.contains("haircut"));
        assert!(gentle.contains("friendly"));

        let urgent = compose_reminder(&ctx, PreventionAction::UrgentReminder, now);
        assert!(urgent.contains("confirm"));
        assert!(urgent.contains("6h"));
    }
}
