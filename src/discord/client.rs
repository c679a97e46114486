//! Discord bot client.
//!
//! [`DiscordRuntime`] is the chat runtime the bridge runs by default: it owns
//! a tokio runtime on the chat thread, drives the serenity gateway and feeds
//! events and idle ticks into a single select loop.

use std::sync::Arc;
use std::time::Duration;

use serenity::all::{ActivityData, OnlineStatus};
use serenity::async_trait;
use serenity::http::{Http, HttpBuilder};
use serenity::model::application::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::{ApplicationId, ChannelId};
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::bridge::outbound::{MessageSink, Publisher, Tick};
use crate::bridge::state::LifecycleState;
use crate::bridge::supervisor::{ChatLink, ChatRuntime};
use crate::common::error::{DiscordError, DiscordResult};
use crate::discord::channel::resolve_or_warn;
use crate::discord::commands::{register_slash_commands, CommandRouter};
use crate::discord::handler::CommandHandler;

/// How long the gateway gets to close its shards.
const GATEWAY_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready { context: Context, ready: Ready },
    /// Message received.
    Message {
        context: Context,
        message: serenity::model::channel::Message,
    },
    /// Slash command or other interaction.
    Interaction {
        context: Context,
        interaction: Interaction,
    },
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }

    fn forward(&self, event: DiscordBotEvent) {
        if let Err(error) = self.discord_events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, context: Context, ready: Ready) {
        self.forward(DiscordBotEvent::Ready { context, ready });
    }

    async fn message(&self, context: Context, message: serenity::model::channel::Message) {
        self.forward(DiscordBotEvent::Message { context, message });
    }

    async fn interaction_create(&self, context: Context, interaction: Interaction) {
        self.forward(DiscordBotEvent::Interaction {
            context,
            interaction,
        });
    }
}

pub async fn build_client(
    token: &str,
    application_id: Option<u64>,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) -> DiscordResult<Client> {
    if token.is_empty() {
        return Err(DiscordError::MissingCredential);
    }

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let mut http = HttpBuilder::new(token).client(reqwest_client);
    if let Some(id) = application_id {
        http = http.application_id(ApplicationId::new(id));
    }

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http.build(), intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

/// Posts outbound notices through the REST API.
pub struct HttpSink {
    http: Arc<Http>,
}

impl HttpSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessageSink for HttpSink {
    async fn create_message(&self, channel_id: u64, content: &str) -> DiscordResult<()> {
        ChannelId::new(channel_id).say(&self.http, content).await?;
        Ok(())
    }
}

/// The Discord chat runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscordRuntime;

impl ChatRuntime for DiscordRuntime {
    fn run(self: Box<Self>, link: ChatLink) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("q2d-discord")
            .enable_all()
            .build()?;

        let result = runtime.block_on(run_bot(link));
        runtime.shutdown_timeout(Duration::from_secs(1));
        result
    }
}

async fn run_bot(link: ChatLink) -> anyhow::Result<()> {
    let config = Arc::clone(&link.config);
    let (discord_events_tx, mut discord_events_rx) = mpsc::unbounded_channel();

    let mut client = build_client(
        &config.discord.token,
        config.application_id(),
        discord_events_tx,
    )
    .await?;
    let shard_manager = client.shard_manager.clone();
    let http = Arc::clone(&client.http);

    if config.application_id().is_some() {
        if let Err(e) = register_slash_commands(&http).await {
            warn!("Failed to register slash commands: {}", e);
        }
    }

    let target = resolve_or_warn(&http, config.channel_id()).await;
    let handler = CommandHandler::new(
        CommandRouter::from_config(Arc::clone(&link.inbound), &config),
        config.discord.command_prefix.clone(),
    );
    let sink = HttpSink::new(Arc::clone(&http));
    let mut publisher: Option<Publisher> = None;

    let mut idle = tokio::time::interval(config.bridge.idle_interval());
    idle.set_missed_tick_behavior(MissedTickBehavior::Delay);

    {
        let connection = client.start();
        tokio::pin!(connection);

        info!("Connecting to Discord...");
        loop {
            tokio::select! {
                result = &mut connection => {
                    match result {
                        Ok(()) => info!("Discord client disconnected normally"),
                        Err(e) => error!("Discord client error: {}", e),
                    }
                    break;
                }

                Some(event) = discord_events_rx.recv() => match event {
                    DiscordBotEvent::Ready { context, ready } => {
                        info!("Discord bot connected as {}", ready.user.name);
                        context.set_presence(Some(ActivityData::playing("Quake II")), OnlineStatus::Idle);

                        if publisher.is_none() {
                            publisher = open_outbound(&link, target);
                        }
                    }
                    DiscordBotEvent::Message { context, message } => {
                        handler.handle_message(&context, &message).await;
                    }
                    DiscordBotEvent::Interaction { context, interaction } => {
                        handler.handle_interaction(&context, interaction).await;
                    }
                },

                _ = idle.tick() => {
                    let Some(publisher) = publisher.as_ref() else {
                        continue;
                    };
                    if publisher.tick(&sink).await == Tick::Terminate {
                        link.outbound.set_state(LifecycleState::Closed);
                        info!("Outbound queue drained, stopping Discord");
                        break;
                    }
                }

                _ = link.cancel.cancelled() => {
                    info!("Discord runtime cancelled");
                    break;
                }
            }
        }
    }

    info!("Initiating graceful Discord shutdown...");
    if tokio::time::timeout(GATEWAY_SHUTDOWN_TIMEOUT, shard_manager.shutdown_all())
        .await
        .is_err()
    {
        warn!("Discord gateway did not close within {:?}", GATEWAY_SHUTDOWN_TIMEOUT);
    }
    info!("Discord shutdown complete");
    Ok(())
}

/// Mark the outbound queue ready, or closed when there is nowhere to post.
fn open_outbound(link: &ChatLink, target: Option<ChannelId>) -> Option<Publisher> {
    let Some(channel_id) = target else {
        link.outbound
            .set_state_if(LifecycleState::Closed, LifecycleState::Uninitialized);
        debug!("No usable Discord channel, outbound mirroring disabled");
        return None;
    };

    link.outbound
        .set_state_if(LifecycleState::Ready, LifecycleState::Uninitialized);
    Some(Publisher::new(Arc::clone(&link.outbound), Some(channel_id.get())))
}
