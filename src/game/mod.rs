//! The game server side of the bridge.
//!
//! This module contains:
//! - Text sanitizing and Discord formatting
//! - The host trait the bridge dispatches commands into

pub mod formatter;
pub mod host;

// Re-export commonly used types
pub use host::{GameHost, RecordingHost};
