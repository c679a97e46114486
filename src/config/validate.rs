//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.discord.token.is_empty() {
        errors.push("discord.token (or a readable discord.token_file) is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.command_prefix.trim().is_empty() {
        errors.push("discord.command_prefix must not be empty".to_string());
    }

    if config.bridge.outbound_queue_mode().is_none() {
        errors.push(format!(
            "bridge.outbound_mode '{}' is invalid (use: buffered, state_only)",
            config.bridge.outbound_mode
        ));
    }
    if config.bridge.idle_interval_ms == 0 {
        errors.push("bridge.idle_interval_ms must be non-zero".to_string());
    }
    if config.bridge.join_timeout_ms == 0 {
        errors.push("bridge.join_timeout_ms must be non-zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
