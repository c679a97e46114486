//! Error types for the bridge.

use thiserror::Error;

/// Top-level bridge error.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn chat thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Bridge queue errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Out of memory queueing a {len} byte command")]
    Exhausted { len: usize },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Failed to parse token file '{path}': {source}")]
    TokenFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Discord-related errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("No Discord credential configured")]
    MissingCredential,

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Channel {channel_id} cannot be used: {reason}")]
    ChannelUnusable { channel_id: u64, reason: String },

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Result type alias for Discord operations.
pub type DiscordResult<T> = std::result::Result<T, DiscordError>;
