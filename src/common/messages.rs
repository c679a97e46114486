//! Canonical message types for bridge communication.

use std::fmt;

/// Payload prefix marking an inbound command as chat to broadcast rather
/// than a console command to execute.
pub const CHAT_RELAY_PREFIX: &str = "say_discord ";

/// Tag prepended to relayed chat when it is broadcast in game.
pub const CHAT_RELAY_TAG: &str = "[Q2D]";

/// Announcement queued when the bridge starts.
pub const OPEN_ANNOUNCEMENT: &str = "**[Q2Admin] === Open For Business ===**";

/// Announcement queued when the bridge shuts down.
pub const CLOSE_ANNOUNCEMENT: &str = "**[Q2Admin] === Closing Time ===**";

/// Severity of a server print, controlling formatting and mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Medium prints: frags, joins, item pickups.
    Informational,
    /// High prints: server notices.
    High,
    /// Player chat.
    Chat,
}

impl Severity {
    /// Engine print level for low-priority messages, never mirrored.
    pub const PRINT_LOW: i32 = 0;
    pub const PRINT_MEDIUM: i32 = 1;
    pub const PRINT_HIGH: i32 = 2;
    pub const PRINT_CHAT: i32 = 3;

    /// Map an engine print level to a mirrorable severity.
    pub fn from_print_level(level: i32) -> Option<Severity> {
        match level {
            Self::PRINT_MEDIUM => Some(Severity::Informational),
            Self::PRINT_HIGH => Some(Severity::High),
            Self::PRINT_CHAT => Some(Severity::Chat),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Informational => "misc",
            Severity::High => "high",
            Severity::Chat => "chat",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_print_level() {
        assert_eq!(Severity::from_print_level(Severity::PRINT_LOW), None);
        assert_eq!(Severity::from_print_level(1), Some(Severity::Informational));
        assert_eq!(Severity::from_print_level(2), Some(Severity::High));
        assert_eq!(Severity::from_print_level(3), Some(Severity::Chat));
        assert_eq!(Severity::from_print_level(42), None);
    }
}
