//! Discord bot integration.
//!
//! This module provides the Discord side of the bridge: the gateway client
//! and chat runtime, command routing and target channel resolution.

pub mod channel;
pub mod client;
pub mod commands;
pub mod handler;

// Re-export main types for external use
pub use client::{DiscordRuntime, HttpSink};
pub use commands::{BotCommand, CommandOutcome, CommandRouter, RconPolicy};
