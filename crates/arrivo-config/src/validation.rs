// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic validation for loaded configuration.
//!
//! Figment + serde catch type and unknown-key errors; this module catches
//! values that parse fine but cannot work at runtime.

use arrivo_core::ArrivoError;

use crate::model::ArrivoConfig;

/// Validate semantic constraints on a loaded configuration.
///
/// Returns all problems found, not just the first, so an operator can fix a
/// config file in one pass.
pub fn validate(config: &ArrivoConfig) -> Result<(), Vec<ArrivoError>> {
    let mut errors = Vec::new();

    if config.escalation.reminder_delay_mins <= 0 {
        errors.push(ArrivoError::Config(
            "escalation.reminder_delay_mins must be positive".to_string(),
        ));
    }
    if config.escalation.escalation_delay_mins <= 0 {
        errors.push(ArrivoError::Config(
            "escalation.escalation_delay_mins must be positive".to_string(),
        ));
    }
    if config.escalation.session_window_hours <= 0 {
        errors.push(ArrivoError::Config(
            "escalation.session_window_hours must be positive".to_string(),
        ));
    }
    if config.escalation.high_value_threshold < 0.0 {
        errors.push(ArrivoError::Config(
            "escalation.high_value_threshold must not be negative".to_string(),
        ));
    }
    if config.worker.poll_interval_secs == 0 {
        errors.push(ArrivoError::Config(
            "worker.poll_interval_secs must be positive".to_string(),
        ));
    }
    if config.worker.sweep_interval_secs == 0 {
        errors.push(ArrivoError::Config(
            "worker.sweep_interval_secs must be positive".to_string(),
        ));
    }
    if config.storage.database_path.trim().is_empty() {
        errors.push(ArrivoError::Config(
            "storage.database_path must not be empty".to_string(),
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.service.log_level.as_str()) {
        errors.push(ArrivoError::Config(format!(
            "service.log_level must be one of {valid_levels:?}, got \"{}\"",
            config.service.log_level
        )));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
