//! Configuration file parsing (HOCON format).

use std::io::ErrorKind;
use std::path::Path;

use hocon::HoconLoader;
use serde::Deserialize;
use tracing::debug;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[derive(Deserialize)]
struct TokenFile {
    discord: TokenSection,
}

#[derive(Deserialize)]
struct TokenSection {
    token: String,
}

/// Read the bot token from a JSON token file.
///
/// A missing file is not an error and yields `None`.
pub fn read_token_file(path: impl AsRef<Path>) -> Result<Option<String>, ConfigError> {
    let path = path.as_ref();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Token file {} not found", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::IoError {
                path: path.display().to_string(),
                source,
            })
        }
    };

    parse_token_json(&content)
        .map(|token| Some(token).filter(|t| !t.is_empty()))
        .map_err(|source| ConfigError::TokenFile {
            path: path.display().to_string(),
            source,
        })
}

fn parse_token_json(content: &str) -> Result<String, serde_json::Error> {
    let file: TokenFile = serde_json::from_str(content)?;
    Ok(file.discord.token)
}
