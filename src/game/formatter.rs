//! Text shaping at the bridge boundary.
//!
//! Inbound text (Discord -> game) is reduced to printable ASCII so the
//! engine's command parser never sees control sequences. Outbound text
//! (game -> Discord) is wrapped in Discord markdown according to severity
//! and collapsed to a single line.

use crate::common::messages::{Severity, CHAT_RELAY_PREFIX};

/// Discord's limit on message content, in characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Longest chat relay forwarded to the game, in bytes.
pub const MAX_CHAT_RELAY_LEN: usize = 320;

/// Replacement for characters the game cannot take.
pub const PLACEHOLDER: char = '?';

/// Separator between speaker name and message in game chat.
const SPEAKER_DELIMITER: &str = ": ";

/// Replace everything outside printable ASCII (newline excepted) with `?`.
pub fn sanitize_inbound(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c == '\n' || (' '..='~').contains(&c) {
                c
            } else {
                PLACEHOLDER
            }
        })
        .collect()
}

/// Build a console command line for the game from Discord input.
pub fn game_command(text: &str) -> String {
    let mut command = sanitize_inbound(text);
    command.push('\n');
    command
}

/// Build a chat relay payload: `say_discord {speaker}: {text}`.
pub fn chat_relay(speaker: &str, text: &str) -> String {
    let relay = format!("{}{}: {}", CHAT_RELAY_PREFIX, speaker, text);
    game_command(truncate_bytes(&relay, MAX_CHAT_RELAY_LEN))
}

/// Format a server print for Discord.
///
/// - informational: `*text*`
/// - high: `**[SERVER]** text`
/// - chat: `**Name:** message`, or `*text*` without a speaker
///
/// Newlines are removed afterwards, so multi-line prints arrive as one line.
pub fn format_outbound(severity: Severity, text: &str) -> String {
    let mut formatted = match severity {
        Severity::Informational => format!("*{}*", text),
        Severity::High => format!("**[SERVER]** {}", text),
        Severity::Chat => match text.find(SPEAKER_DELIMITER) {
            Some(at) => {
                let (speaker, rest) = text.split_at(at + 1);
                format!("**{}**{}", speaker, rest)
            }
            None => format!("*{}*", text),
        },
    };

    strip_newlines(&mut formatted);
    truncate_chars(&mut formatted, DISCORD_MESSAGE_LIMIT);
    formatted
}

/// Remove every newline, concatenating the segments around it.
pub fn strip_newlines(text: &mut String) {
    text.retain(|c| c != '\n');
}

/// Longest prefix of `text` no longer than `max` bytes, cut on a char boundary.
pub fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn truncate_chars(text: &mut String, max: usize) {
    if let Some((end, _)) = text.char_indices().nth(max) {
        text.truncate(end);
    }
}
