//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

use std::path::Path;

use tracing::info;

use crate::common::error::ConfigError;

pub use parser::{load_config, load_config_str};
pub use types::*;
pub use validate::validate_config;

/// Load a config file, apply environment overrides, resolve the token file
/// and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config = env::apply_env_overrides(load_config(path)?);
    let config = resolve_token(config)?;
    validate_config(&config)?;
    Ok(config)
}

/// Fill an empty token from `discord.token_file`, if one is configured.
pub fn resolve_token(mut config: Config) -> Result<Config, ConfigError> {
    if config.discord.token.is_empty() {
        if let Some(path) = config.discord.token_file.clone() {
            if let Some(token) = parser::read_token_file(&path)? {
                info!("Using Discord token from {}", path);
                config.discord.token = token;
            }
        }
    }
    Ok(config)
}
