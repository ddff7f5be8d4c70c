// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Pitcrew work-order tracker.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Pitcrew configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PitcrewConfig {
    /// Discord bot settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Web dashboard API settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Subsystem autocomplete cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Discord bot token. `None` disables the Discord front-end.
    #[serde(default)]
    pub discord_token: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            discord_token: None,
        }
    }
}

fn default_bot_name() -> String {
    "pitcrew".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
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
        .map(|p| p.join("pitcrew").join("pitcrew.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("pitcrew.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Web dashboard API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    /// Enable the web API server.
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_web_port")]
    pub port: u16,

    /// Bearer token required on API requests. `None` rejects all requests
    /// (fail-closed).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            host: default_web_host(),
            port: default_web_port(),
            bearer_token: None,
        }
    }
}

fn default_web_enabled() -> bool {
    true
}

fn default_web_host() -> String {
    "127.0.0.1".to_string()
}

fn default_web_port() -> u16 {
    8320
}

/// Subsystem autocomplete cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a cached subsystem list stays fresh.
    #[serde(default = "default_subsystem_ttl_secs")]
    pub subsystem_ttl_secs: u64,

    /// Milliseconds to wait on a refresh fetch before serving stale data.
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            subsystem_ttl_secs: default_subsystem_ttl_secs(),
            refresh_timeout_ms: default_refresh_timeout_ms(),
        }
    }
}

fn default_subsystem_ttl_secs() -> u64 {
    60
}

fn default_refresh_timeout_ms() -> u64 {
    1500
}
