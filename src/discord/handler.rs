//! Discord message and interaction handling.
//!
//! Turns prefix messages and slash interactions into [`BotCommand`]s, runs
//! them through the [`CommandRouter`] and posts the reply.

use serenity::builder::{CreateInteractionResponse, CreateInteractionResponseMessage};
use serenity::model::application::{CommandDataOptionValue, CommandInteraction, Interaction};
use serenity::model::channel::Message;
use serenity::model::user::User;
use serenity::prelude::*;
use tracing::{debug, warn};

use crate::discord::commands::{
    parse_prefix_command, BotCommand, CommandOutcome, CommandRouter, Requester, SlashCommand,
    SLASH_PING, SLASH_RCON, SLASH_SAY,
};

/// Name shown in game chat: guild nickname, else global name, else username.
pub fn display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    nick.or(global_name)
        .filter(|name| !name.is_empty())
        .unwrap_or(username)
        .to_string()
}

/// Map a slash command name and its options to a bot command.
///
/// `option` looks up a string option by name.
pub fn parse_slash_command<'a>(
    name: &str,
    option: impl Fn(&str) -> Option<&'a str>,
) -> Option<BotCommand<'a>> {
    let arg = |slash: &SlashCommand| {
        slash.option
            .and_then(|o| option(o.name))
            .filter(|value| !value.trim().is_empty())
    };

    if name == SLASH_SAY.name {
        arg(&SLASH_SAY).map(BotCommand::Say)
    } else if name == SLASH_RCON.name {
        arg(&SLASH_RCON).map(BotCommand::Rcon)
    } else if name == SLASH_PING.name {
        Some(BotCommand::Ping)
    } else {
        None
    }
}

/// Discord event handler.
pub struct CommandHandler {
    router: CommandRouter,
    prefix: String,
}

impl CommandHandler {
    pub fn new(router: CommandRouter, prefix: String) -> Self {
        Self { router, prefix }
    }

    pub async fn handle_message(&self, ctx: &Context, msg: &Message) {
        // Ignore our own messages
        if msg.author.id == ctx.cache.current_user().id {
            return;
        }

        let Some(command) = parse_prefix_command(&self.prefix, &msg.content) else {
            return;
        };

        let member = msg.member.as_deref();
        let requester = Requester {
            user_id: msg.author.id.get(),
            is_bot: msg.author.bot,
            channel_id: msg.channel_id.get(),
            display_name: display_name(
                member.and_then(|m| m.nick.as_deref()),
                msg.author.global_name.as_deref(),
                &msg.author.name,
            ),
            roles: member
                .map(|m| m.roles.iter().map(|r| r.get()).collect())
                .unwrap_or_default(),
        };

        let outcome = self.router.execute(&requester, command);
        debug!("{:?} from {} -> {:?}", command, requester.display_name, outcome);

        if let Some(reply) = outcome.reply() {
            if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
                warn!("Failed to reply in channel {}: {}", msg.channel_id, e);
            }
        }
    }

    pub async fn handle_interaction(&self, ctx: &Context, interaction: Interaction) {
        let Interaction::Command(interaction) = interaction else {
            return;
        };

        let Some(command) = parse_slash_command(&interaction.data.name, |name| {
            interaction
                .data
                .options
                .iter()
                .find(|o| o.name == name)
                .and_then(|o| match &o.value {
                    CommandDataOptionValue::String(value) => Some(value.as_str()),
                    _ => None,
                })
        }) else {
            debug!("Ignoring interaction {}", interaction.data.name);
            return;
        };

        let requester = interaction_requester(&interaction);
        let outcome = self.router.execute(&requester, command);
        debug!("/{} from {} -> {:?}", interaction.data.name, requester.display_name, outcome);

        let content = match (outcome, command) {
            (CommandOutcome::Relayed, BotCommand::Say(text)) => text.to_string(),
            _ => outcome.reply().unwrap_or_default().to_string(),
        };
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content(content),
        );
        if let Err(e) = interaction.create_response(&ctx.http, response).await {
            warn!("Failed to respond to /{}: {}", interaction.data.name, e);
        }
    }
}

fn interaction_requester(interaction: &CommandInteraction) -> Requester {
    let member = interaction.member.as_deref();
    let user: &User = member.map(|m| &m.user).unwrap_or(&interaction.user);

    Requester {
        user_id: user.id.get(),
        is_bot: user.bot,
        channel_id: interaction.channel_id.get(),
        display_name: display_name(
            member.and_then(|m| m.nick.as_deref()),
            user.global_name.as_deref(),
            &user.name,
        ),
        roles: member
            .map(|m| m.roles.iter().map(|r| r.get()).collect())
            .unwrap_or_default(),
    }
}
