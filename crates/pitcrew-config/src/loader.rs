// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pitcrew.toml` > `~/.config/pitcrew/pitcrew.toml` > `/etc/pitcrew/pitcrew.toml`
//! with environment variable overrides via `PITCREW_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PitcrewConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pitcrew/pitcrew.toml` (system-wide)
/// 3. `~/.config/pitcrew/pitcrew.toml` (user XDG config)
/// 4. `./pitcrew.toml` (local directory)
/// 5. `PITCREW_*` environment variables
pub fn load_config() -> Result<PitcrewConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PitcrewConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PitcrewConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PitcrewConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PitcrewConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for
/// diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PitcrewConfig::default()))
        .merge(Toml::file("/etc/pitcrew/pitcrew.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("pitcrew/pitcrew.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("pitcrew.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `PITCREW_BOT_DISCORD_TOKEN` must map
/// to `bot.discord_token`, not `bot.discord.token`.
fn env_provider() -> Env {
    Env::prefixed("PITCREW_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("bot_", "bot.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("web_", "web.", 1)
            .replacen("cache_", "cache.", 1);
        mapped.into()
    })
}
