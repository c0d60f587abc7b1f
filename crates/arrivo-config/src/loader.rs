// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./arrivo.toml` > `~/.config/arrivo/arrivo.toml` > `/etc/arrivo/arrivo.toml`
//! with environment variable overrides via `ARRIVO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ArrivoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/arrivo/arrivo.toml` (system-wide)
/// 3. `~/.config/arrivo/arrivo.toml` (user XDG config)
/// 4. `./arrivo.toml` (local directory)
/// 5. `ARRIVO_*` environment variables
pub fn load_config() -> Result<ArrivoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArrivoConfig::default()))
        .merge(Toml::file("/etc/arrivo/arrivo.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("arrivo/arrivo.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("arrivo.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ArrivoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArrivoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ArrivoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArrivoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `ARRIVO_SERVER_WEBHOOK_SECRET`
/// must map to `server.webhook_secret`, not `server.webhook.secret`.
fn env_provider() -> Env {
    Env::prefixed("ARRIVO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: ARRIVO_SERVER_WEBHOOK_SECRET -> "server_webhook_secret"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("escalation_", "escalation.", 1)
            .replacen("worker_", "worker.", 1)
            .replacen("notify_", "notify.", 1);
        mapped.into()
    })
}
