//! Configuration type definitions.

use std::time::Duration;

use serde::Deserialize;

use crate::bridge::queue::QueueMode;
use crate::common::messages::Severity;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub rcon: RconConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Takes precedence over `token_file`.
    #[serde(default)]
    pub token: String,
    /// JSON file holding `{"discord": {"token": "..."}}`.
    pub token_file: Option<String>,
    /// Application id; slash commands are registered when set.
    pub application_id: Option<u64>,
    /// Target channel or thread for mirrored messages and commands.
    pub channel_id: Option<u64>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

/// Who may run remote console commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RconConfig {
    pub user_id: Option<u64>,
    pub role_id: Option<u64>,
}

/// Per-severity mirroring toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_true")]
    pub high: bool,
    #[serde(default = "default_true")]
    pub misc: bool,
    #[serde(default = "default_true")]
    pub chat: bool,
}

impl MirrorConfig {
    /// Whether prints of `severity` are relayed to Discord.
    pub fn allows(&self, severity: Severity) -> bool {
        match severity {
            Severity::High => self.high,
            Severity::Informational => self.misc,
            Severity::Chat => self.chat,
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            high: true,
            misc: true,
            chat: true,
        }
    }
}

/// Bridge tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// "buffered" or "state_only".
    #[serde(default = "default_outbound_mode")]
    pub outbound_mode: String,
    /// Maximum pending outbound messages; 0 means unbounded.
    #[serde(default)]
    pub outbound_capacity: usize,
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
    /// How long shutdown waits for pending outbound messages to drain.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// How long shutdown waits for the chat thread before abandoning it.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
    /// Queue open/close announcements.
    #[serde(default = "default_true")]
    pub announce: bool,
}

impl BridgeConfig {
    /// Outbound queue mode, or `None` if `outbound_mode` is not recognized.
    pub fn outbound_queue_mode(&self) -> Option<QueueMode> {
        match self.outbound_mode.to_lowercase().as_str() {
            "buffered" => Some(QueueMode::Buffered {
                capacity: (self.outbound_capacity > 0).then_some(self.outbound_capacity),
            }),
            "state_only" | "disabled" => Some(QueueMode::StateOnly),
            _ => None,
        }
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            outbound_mode: default_outbound_mode(),
            outbound_capacity: 0,
            idle_interval_ms: default_idle_interval_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            join_timeout_ms: default_join_timeout_ms(),
            announce: true,
        }
    }
}

impl Config {
    /// Configured target channel, treating 0 as unset.
    pub fn channel_id(&self) -> Option<u64> {
        self.discord.channel_id.filter(|id| *id != 0)
    }

    /// Configured application id, treating 0 as unset.
    pub fn application_id(&self) -> Option<u64> {
        self.discord.application_id.filter(|id| *id != 0)
    }
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_true() -> bool {
    true
}

fn default_outbound_mode() -> String {
    "buffered".to_string()
}

fn default_idle_interval_ms() -> u64 {
    100
}

fn default_shutdown_grace_ms() -> u64 {
    3_000
}

fn default_join_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_toggles() {
        let mirror = MirrorConfig {
            high: true,
            misc: false,
            chat: true,
        };
        assert!(mirror.allows(Severity::High));
        assert!(!mirror.allows(Severity::Informational));
        assert!(mirror.allows(Severity::Chat));
    }

    #[test]
    fn test_outbound_queue_mode() {
        let mut bridge = BridgeConfig::default();
        assert_eq!(bridge.outbound_queue_mode(), Some(QueueMode::UNBOUNDED));

        bridge.outbound_capacity = 64;
        assert_eq!(
            bridge.outbound_queue_mode(),
            Some(QueueMode::Buffered { capacity: Some(64) })
        );

        bridge.outbound_mode = "State_Only".to_string();
        assert_eq!(bridge.outbound_queue_mode(), Some(QueueMode::StateOnly));

        bridge.outbound_mode = "sometimes".to_string();
        assert_eq!(bridge.outbound_queue_mode(), None);
    }

    #[test]
    fn test_bridge_defaults() {
        let bridge = BridgeConfig::default();
        assert_eq!(bridge.idle_interval(), Duration::from_millis(100));
        assert_eq!(bridge.shutdown_grace(), Duration::from_secs(3));
        assert_eq!(bridge.join_timeout(), Duration::from_secs(5));
        assert!(bridge.announce);
    }
}
