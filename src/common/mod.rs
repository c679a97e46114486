//! Common utilities and types shared across the application.

pub mod error;
pub mod messages;

pub use error::{BridgeError, ConfigError, DiscordError, QueueError};
pub use messages::Severity;
