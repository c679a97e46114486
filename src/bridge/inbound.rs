//! Inbound processor: Discord commands drained on the game thread.

use tracing::debug;

use crate::bridge::queue::{BridgeQueue, Command};
use crate::common::messages::{CHAT_RELAY_PREFIX, CHAT_RELAY_TAG};
use crate::game::formatter::{truncate_bytes, MAX_CHAT_RELAY_LEN};
use crate::game::host::GameHost;

/// Dispatch every command currently available to `host`.
///
/// Never waits on the queue lock: a command hidden by a stale empty hint or
/// a contended lock is picked up on the next frame. Returns how many
/// commands were dispatched.
pub fn drain_inbound<H: GameHost + ?Sized>(queue: &BridgeQueue, host: &mut H) -> usize {
    // bail out early so we don't touch the lock at all
    if queue.is_visibly_empty() {
        return 0;
    }

    let mut dispatched = 0;
    while let Some(command) = queue.try_pop() {
        dispatch(command, host);
        dispatched += 1;
    }
    dispatched
}

fn dispatch<H: GameHost + ?Sized>(command: Command, host: &mut H) {
    match command.as_str().strip_prefix(CHAT_RELAY_PREFIX) {
        Some(chat) => {
            let chat = truncate_bytes(chat.trim_end_matches('\n'), MAX_CHAT_RELAY_LEN);
            debug!("Discord -> game chat: {}", chat);
            host.broadcast_chat(&format!("{} {}\n", CHAT_RELAY_TAG, chat));
        }
        None => {
            debug!("Discord -> game command: {}", command.as_str().trim_end());
            host.execute_command(command.as_str());
        }
    }
}
