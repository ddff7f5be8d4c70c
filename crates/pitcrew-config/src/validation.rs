// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Errors are collected, not fail-fast.

use crate::diagnostic::ConfigError;
use crate::model::PitcrewConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &PitcrewConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.web.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "web.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("web.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.bot.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "bot.log_level must be one of {}, got `{}`",
                valid_levels.join(", "),
                config.bot.log_level
            ),
        });
    }

    if let Some(token) = &config.bot.discord_token {
        if token.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "bot.discord_token must not be empty when set".to_string(),
            });
        }
    }

    if config.cache.subsystem_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "cache.subsystem_ttl_secs must be at least 1".to_string(),
        });
    }

    if config.cache.refresh_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "cache.refresh_timeout_ms must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&PitcrewConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_is_rejected() {
        let mut config = PitcrewConfig::default();
        config.storage.database_path = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("database_path"));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = PitcrewConfig::default();
        config.bot.log_level = "loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("log_level"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = PitcrewConfig::default();
        config.storage.database_path = String::new();
        config.web.host = String::new();
        config.cache.subsystem_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn bad_host_is_rejected() {
        let mut config = PitcrewConfig::default();
        config.web.host = "not a host!".into();
        assert!(validate_config(&config).is_err());
    }
}
