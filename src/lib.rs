//! Discord command bridge for Quake II game servers.
//!
//! The game thread mirrors server prints to a Discord channel and executes
//! commands typed in Discord, while a dedicated chat thread talks to the
//! gateway. The two sides only share a pair of [`bridge::BridgeQueue`]s.

pub mod bridge;
pub mod common;
pub mod config;
pub mod discord;
pub mod game;

pub use bridge::{Bridge, ShutdownReport};
pub use common::messages::Severity;
pub use config::Config;
pub use game::GameHost;
