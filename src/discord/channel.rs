//! Target channel resolution.

use serenity::http::Http;
use serenity::model::channel::{Channel, ChannelType};
use serenity::model::id::ChannelId;
use tracing::{info, warn};

use crate::common::error::{DiscordError, DiscordResult};

/// Whether a channel of this kind and thread state can be posted to.
///
/// Returns the reason it cannot.
pub fn check_channel(kind: ChannelType, locked: bool, archived: bool) -> Result<(), &'static str> {
    match kind {
        ChannelType::Text => Ok(()),
        ChannelType::PublicThread | ChannelType::PrivateThread => {
            if locked {
                Err("thread is locked")
            } else if archived {
                Err("thread is archived")
            } else {
                Ok(())
            }
        }
        _ => Err("unsupported channel type"),
    }
}

/// Fetch the configured channel and make sure the bot can post to it,
/// joining the thread if needed.
pub async fn resolve_channel(http: &Http, channel_id: ChannelId) -> DiscordResult<ChannelId> {
    let unusable = |reason: &str| DiscordError::ChannelUnusable {
        channel_id: channel_id.get(),
        reason: reason.to_string(),
    };

    let channel = match http.get_channel(channel_id).await? {
        Channel::Guild(channel) => channel,
        _ => return Err(unusable("not a guild channel")),
    };

    let (locked, archived) = channel
        .thread_metadata
        .as_ref()
        .map(|meta| (meta.locked, meta.archived))
        .unwrap_or_default();
    check_channel(channel.kind, locked, archived).map_err(unusable)?;

    if channel.thread_metadata.is_some() && channel.member.is_none() {
        info!("Joining thread #{}", channel.name);
        channel.id.join_thread(http).await?;
    }

    info!("Mirroring to #{} ({})", channel.name, channel.id);
    Ok(channel.id)
}

/// Resolve `channel_id`, logging instead of failing.
pub async fn resolve_or_warn(http: &Http, channel_id: Option<u64>) -> Option<ChannelId> {
    let channel_id = ChannelId::new(channel_id?);
    match resolve_channel(http, channel_id).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Cannot use Discord channel {}: {}", channel_id, e);
            None
        }
    }
}
