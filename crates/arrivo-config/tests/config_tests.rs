// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading and layering.

use arrivo_config::{load_config_from_str, validate};

#[test]
fn empty_config_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.service.name, "arrivo");
    assert_eq!(config.server.port, 8585);
    assert_eq!(config.escalation.reminder_delay_mins, 120);
    assert_eq!(config.escalation.escalation_delay_mins, 240);
    assert_eq!(config.escalation.session_window_hours, 24);
    assert!((config.escalation.high_value_threshold - 100.0).abs() < f64::EPSILON);
    assert!(config.server.webhook_secret.is_none());
    assert!(config.storage.wal_mode);
}

#[test]
fn toml_overrides_defaults() {
    let config = load_config_from_str(
        r#"
        [server]
        host = "0.0.0.0"
        port = 9000
        webhook_secret = "shh"

        [escalation]
        reminder_delay_mins = 30
        "#,
    )
    .unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.webhook_secret.as_deref(), Some("shh"));
    assert_eq!(config.escalation.reminder_delay_mins, 30);
    // Untouched sections keep their defaults.
    assert_eq!(config.worker.poll_interval_secs, 5);
}

#[test]
fn unknown_keys_are_rejected() {
    let result = load_config_from_str(
        r#"
        [server]
        prot = 9000
        "#,
    );
    assert!(result.is_err(), "typo'd key should fail extraction");
}

#[test]
fn unknown_section_is_rejected() {
    let result = load_config_from_str(
        r#"
        [telemetry]
        enabled = true
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn loaded_config_passes_validation() {
    let config = load_config_from_str(
        r#"
        [escalation]
        reminder_delay_mins = 60
        escalation_delay_mins = 180
        "#,
    )
    .unwrap();
    assert!(validate(&config).is_ok());
}

#[test]
fn invalid_values_fail_validation() {
    let config = load_config_from_str(
        r#"
        [escalation]
        session_window_hours = -1
        "#,
    )
    .unwrap();
    assert!(validate(&config).is_err());
}
