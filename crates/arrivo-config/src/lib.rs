// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Arrivo engine.
//!
//! Layered TOML configuration (XDG hierarchy + `ARRIVO_` env overrides) via
//! Figment, with `deny_unknown_fields` models and semantic validation.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ArrivoConfig;
pub use validation::validate;

use arrivo_core::ArrivoError;

/// Load configuration from the standard hierarchy and validate it.
///
/// The single entry point used by the binary at startup.
#[allow(clippy::result_large_err)]
pub fn load_and_validate() -> Result<ArrivoConfig, Vec<ArrivoError>> {
    let config =
        load_config().map_err(|e| vec![ArrivoError::Config(e.to_string())])?;
    validate(&config)?;
    Ok(config)
}
