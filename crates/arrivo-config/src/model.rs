// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Arrivo engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Arrivo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArrivoConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Webhook ingress HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound messaging gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Escalation timing and cost-gate settings.
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Manager notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "arrivo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Webhook ingress HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for webhook HMAC-SHA256 signatures.
    /// `None` rejects all webhook traffic (fail-closed).
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_secret: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8585
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("arrivo").join("arrivo.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("arrivo.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Outbound messaging gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Base URL of the messaging gateway HTTP API.
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,

    /// Bearer token for gateway API calls. `None` requires environment override.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Timeout for outbound send calls, in seconds.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_base_url(),
            api_token: None,
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_gateway_base_url() -> String {
    "http://127.0.0.1:9090".to_string()
}

fn default_send_timeout_secs() -> u64 {
    10
}

/// Escalation timing and cost-gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EscalationConfig {
    /// Delay before the reminder-tier read check fires, in minutes.
    #[serde(default = "default_reminder_delay_mins")]
    pub reminder_delay_mins: i64,

    /// Additional delay before the escalation tier fires, in minutes.
    #[serde(default = "default_escalation_delay_mins")]
    pub escalation_delay_mins: i64,

    /// Length of the free-form messaging session window, in hours.
    #[serde(default = "default_session_window_hours")]
    pub session_window_hours: i64,

    /// Service value above which paid template messages are allowed
    /// outside the session window.
    #[serde(default = "default_high_value_threshold")]
    pub high_value_threshold: f64,

    /// Maximum attempts against the external workflow scheduler before the
    /// intent row is left for the sweep.
    #[serde(default = "default_schedule_retry_max")]
    pub schedule_retry_max: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            reminder_delay_mins: default_reminder_delay_mins(),
            escalation_delay_mins: default_escalation_delay_mins(),
            session_window_hours: default_session_window_hours(),
            high_value_threshold: default_high_value_threshold(),
            schedule_retry_max: default_schedule_retry_max(),
        }
    }
}

fn default_reminder_delay_mins() -> i64 {
    120
}

fn default_escalation_delay_mins() -> i64 {
    240
}

fn default_session_window_hours() -> i64 {
    24
}

fn default_high_value_threshold() -> f64 {
    100.0
}

fn default_schedule_retry_max() -> u32 {
    3
}

/// Background worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Evaluation queue poll interval, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Scheduled-check outbox sweep interval, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Grace period past due time before the sweep re-arms a dispatched
    /// check, in minutes.
    #[serde(default = "default_sweep_grace_mins")]
    pub sweep_grace_mins: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_grace_mins: default_sweep_grace_mins(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_sweep_grace_mins() -> i64 {
    5
}

/// Manager notification configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Phone number of the manager to alert for critical/high-risk bookings.
    /// `None` logs the alert instead of delivering it.
    #[serde(default)]
    pub manager_phone: Option<String>,
}
