//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `Q2D_DISCORD_TOKEN` - Discord bot token
//! - `Q2D_CHANNEL_ID` - Target channel or thread id
//! - `Q2D_APPLICATION_ID` - Application id for slash commands
//! - `Q2D_RCON_USER_ID` - User allowed to run console commands
//! - `Q2D_RCON_ROLE_ID` - Role allowed to run console commands

use std::env;

use tracing::warn;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "Q2D";

/// Apply environment variable overrides to a config.
///
/// Lets the token live outside the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }

    if let Some(id) = id_var("CHANNEL_ID") {
        config.discord.channel_id = Some(id);
    }
    if let Some(id) = id_var("APPLICATION_ID") {
        config.discord.application_id = Some(id);
    }
    if let Some(id) = id_var("RCON_USER_ID") {
        config.rcon.user_id = Some(id);
    }
    if let Some(id) = id_var("RCON_ROLE_ID") {
        config.rcon.role_id = Some(id);
    }

    config
}

fn id_var(name: &str) -> Option<u64> {
    let var = format!("{}_{}", ENV_PREFIX, name);
    let value = env::var(&var).ok()?;
    match value.trim().parse() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", var, value, e);
            None
        }
    }
}

/// Get the config file path from environment or use default.
///
/// Checks `Q2D_CONFIG` environment variable, otherwise returns "q2discord.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "q2discord.conf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::load_config_str;

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "Q2D");
    }

    #[test]
    fn test_get_config_path_default() {
        env::remove_var("Q2D_CONFIG");
        assert_eq!(get_config_path(), "q2discord.conf");
    }

    #[test]
    fn test_apply_env_overrides() {
        env::remove_var("Q2D_DISCORD_TOKEN");
        env::set_var("Q2D_RCON_ROLE_ID", "99");
        env::set_var("Q2D_RCON_USER_ID", "not a number");

        let config = load_config_str(r#"discord { token = "original_token" }"#).unwrap();
        let result = apply_env_overrides(config);

        assert_eq!(result.discord.token, "original_token");
        assert_eq!(result.rcon.role_id, Some(99));
        assert_eq!(result.rcon.user_id, None);

        env::remove_var("Q2D_RCON_ROLE_ID");
        env::remove_var("Q2D_RCON_USER_ID");
    }
}
