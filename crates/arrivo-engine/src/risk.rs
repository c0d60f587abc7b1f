// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! No-show risk scoring.
//!
//! A deterministic weighted-sum model: each factor contributes a signed
//! point value, the sum is clamped to 0..=100, and the discrete level and
//! recommended actions derive from the clamped score. No clock reads beyond
//! the passed-in `now`, no randomness — same input, same output.

use chrono::{DateTime, Datelike, Utc, Weekday};

use arrivo_core::types::{
    BookingRiskContext, MessageTrackingRecord, PreventionAction, RiskAssessment, RiskFactor,
    RiskLevel,
};

const UNREAD_POINTS: i32 = 35;
const NEW_CUSTOMER_POINTS: i32 = 25;
const IMMINENT_POINTS: i32 = 15;
const WEEKEND_POINTS: i32 = 10;
const HIGH_VALUE_POINTS: i32 = -15;
const LOYAL_POINTS: i32 = -20;
const PRIOR_NO_SHOW_POINTS: i32 = 30;

const IMMINENT_HOURS: f64 = 24.0;
const HIGH_VALUE_SERVICE: f64 = 100.0;
const LOYAL_VISITS: i64 = 5;

/// Score a booking's no-show risk from its context and the confirmation
/// message's tracking record.
pub fn score(
    context: &BookingRiskContext,
    tracking: &MessageTrackingRecord,
    now: DateTime<Utc>,
) -> RiskAssessment {
    let mut factors = Vec::new();

    if tracking.read_at.is_none() {
        factors.push(RiskFactor {
            name: "message_unread",
            points: UNREAD_POINTS,
        });
    }
    if context.client.visit_count == 0 {
        factors.push(RiskFactor {
            name: "new_customer",
            points: NEW_CUSTOMER_POINTS,
        });
    }
    if context.hours_until_appointment(now) < IMMINENT_HOURS {
        factors.push(RiskFactor {
            name: "imminent_appointment",
            points: IMMINENT_POINTS,
        });
    }
    if is_weekend(context.appointment_time) {
        factors.push(RiskFactor {
            name: "weekend_appointment",
            points: WEEKEND_POINTS,
        });
    }
    if context.service_value > HIGH_VALUE_SERVICE {
        factors.push(RiskFactor {
            name: "high_value_service",
            points: HIGH_VALUE_POINTS,
        });
    }
    if context.client.visit_count > LOYAL_VISITS {
        factors.push(RiskFactor {
            name: "loyal_customer",
            points: LOYAL_POINTS,
        });
    }
    if context.client.no_show_count > 0 {
        factors.push(RiskFactor {
            name: "prior_no_show",
            points: PRIOR_NO_SHOW_POINTS,
        });
    }

    let raw: i32 = factors.iter().map(|f| f.points).sum();
    let score = raw.clamp(0, 100) as u8;
    let level = level_for(score);

    RiskAssessment {
        score,
        level,
        factors,
        recommended_actions: recommended_actions(level),
    }
}

fn is_weekend(at: DateTime<Utc>) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Map a clamped score to its discrete level.
pub fn level_for(score: u8) -> RiskLevel {
    match score {
        80..=100 => RiskLevel::Critical,
        60..=79 => RiskLevel::High,
        35..=59 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Recommended prevention actions are a pure function of the level.
pub fn recommended_actions(level: RiskLevel) -> Vec<PreventionAction> {
    match level {
        RiskLevel::Critical => vec![
            PreventionAction::ImmediateCall,
            PreventionAction::ManagerIntervention,
            PreventionAction::RescheduleIncentive,
        ],
        RiskLevel::High => vec![
            PreventionAction::UrgentReminder,
            PreventionAction::ConfirmAttendanceRequest,
        ],
        RiskLevel::Medium => vec![PreventionAction::GentleReminder],
        RiskLevel::Low => vec![PreventionAction::StandardReminder],
    }
}
