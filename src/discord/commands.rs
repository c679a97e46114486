//! Discord bot commands (!say, !rcon, !ping and their slash variants).
//!
//! Parsing and authorization are kept free of serenity types so they can be
//! driven from both prefix messages and interactions.

use std::sync::Arc;

use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::http::Http;
use serenity::model::application::{Command, CommandOptionType};
use serenity::model::permissions::Permissions;
use tracing::{debug, info, warn};

use crate::bridge::queue::{BridgeQueue, Push};
use crate::common::error::DiscordResult;
use crate::config::types::Config;
use crate::game::formatter::{chat_relay, game_command};

pub const REPLY_REJECTED: &str = "**[Q2Admin]** Oops, All Berries";
pub const REPLY_UNAUTHORIZED: &str = "**[Q2Admin]** You are not authorized to run commands.";
pub const REPLY_QUEUED: &str = "**[Q2Admin]** Command Queued";
pub const REPLY_PONG: &str = "**[Q2Admin]** PONG. I await your commands.";
pub const REPLY_UNAVAILABLE: &str = "**[Q2Admin]** The server is not taking commands right now.";

/// Appended to every slash command description so stale registrations are
/// detected and edited.
const SLASH_VERSION: &str = " (v1.0)";

/// Who may use `rcon`. An unset or zero id never matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RconPolicy {
    pub user_id: Option<u64>,
    pub role_id: Option<u64>,
}

impl RconPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_id: config.rcon.user_id.filter(|id| *id != 0),
            role_id: config.rcon.role_id.filter(|id| *id != 0),
        }
    }

    pub fn is_authorized(&self, user_id: u64, roles: &[u64]) -> bool {
        if self.user_id == Some(user_id) {
            return true;
        }
        self.role_id.is_some_and(|role| roles.contains(&role))
    }
}

/// A parsed bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand<'a> {
    Say(&'a str),
    Rcon(&'a str),
    Ping,
}

/// Parse `{prefix}say text`, `{prefix}rcon command` or `{prefix}ping`.
///
/// Returns `None` for anything else, including `say`/`rcon` without text.
pub fn parse_prefix_command<'a>(prefix: &str, content: &'a str) -> Option<BotCommand<'a>> {
    let body = content.trim_start().strip_prefix(prefix)?;
    let (name, args) = match body.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (body, ""),
    };

    match name.to_lowercase().as_str() {
        "say" if !args.is_empty() => Some(BotCommand::Say(args)),
        "rcon" if !args.is_empty() => Some(BotCommand::Rcon(args)),
        "ping" => Some(BotCommand::Ping),
        _ => None,
    }
}

/// The author of a command, as far as routing cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: u64,
    pub is_bot: bool,
    pub channel_id: u64,
    pub display_name: String,
    pub roles: Vec<u64>,
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Wrong channel or bot author.
    Rejected,
    /// Chat text relayed to the game.
    Relayed,
    Unauthorized,
    /// Console command queued for the game.
    Queued,
    /// The inbound queue is not accepting commands.
    Unavailable,
    Pong,
}

impl CommandOutcome {
    /// Reply posted back to Discord, if any.
    pub fn reply(self) -> Option<&'static str> {
        match self {
            CommandOutcome::Rejected => Some(REPLY_REJECTED),
            CommandOutcome::Relayed => None,
            CommandOutcome::Unauthorized => Some(REPLY_UNAUTHORIZED),
            CommandOutcome::Queued => Some(REPLY_QUEUED),
            CommandOutcome::Unavailable => Some(REPLY_UNAVAILABLE),
            CommandOutcome::Pong => Some(REPLY_PONG),
        }
    }
}

/// Turns bot commands into inbound queue entries.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    inbound: Arc<BridgeQueue>,
    channel_id: Option<u64>,
    policy: RconPolicy,
}

impl CommandRouter {
    pub fn new(inbound: Arc<BridgeQueue>, channel_id: Option<u64>, policy: RconPolicy) -> Self {
        Self {
            inbound,
            channel_id,
            policy,
        }
    }

    pub fn from_config(inbound: Arc<BridgeQueue>, config: &Config) -> Self {
        Self::new(inbound, config.channel_id(), RconPolicy::from_config(config))
    }

    pub fn execute(&self, requester: &Requester, command: BotCommand<'_>) -> CommandOutcome {
        if requester.is_bot {
            return CommandOutcome::Rejected;
        }
        if self
            .channel_id
            .is_some_and(|expected| expected != requester.channel_id)
        {
            return CommandOutcome::Rejected;
        }

        match command {
            BotCommand::Say(text) => {
                info!("Discord -> Game: [{}] {}", requester.display_name, text);
                self.enqueue(&chat_relay(&requester.display_name, text), CommandOutcome::Relayed)
            }
            BotCommand::Rcon(text) => {
                if !self.policy.is_authorized(requester.user_id, &requester.roles) {
                    warn!(
                        "Unauthorized rcon from {} ({}): {}",
                        requester.display_name, requester.user_id, text
                    );
                    return CommandOutcome::Unauthorized;
                }
                info!("rcon from {}: {}", requester.display_name, text);
                self.enqueue(&game_command(text), CommandOutcome::Queued)
            }
            BotCommand::Ping => CommandOutcome::Pong,
        }
    }

    fn enqueue(&self, payload: &str, success: CommandOutcome) -> CommandOutcome {
        match self.inbound.push(payload) {
            Ok(Push::Queued) => success,
            Ok(outcome) => {
                debug!("Inbound command not queued: {:?}", outcome);
                CommandOutcome::Unavailable
            }
            Err(e) => {
                warn!("{}", e);
                CommandOutcome::Unavailable
            }
        }
    }
}

/// A required string option of a slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashOption {
    pub name: &'static str,
    pub description: &'static str,
}

/// A slash command as the bot wants it registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub option: Option<SlashOption>,
}

pub const SLASH_SAY: SlashCommand = SlashCommand {
    name: "q2say",
    description: "Broadcast message to game server.",
    option: Some(SlashOption {
        name: "message",
        description: "Message Content",
    }),
};

pub const SLASH_RCON: SlashCommand = SlashCommand {
    name: "q2rcon",
    description: "Send command to game server.",
    option: Some(SlashOption {
        name: "command",
        description: "Remote Command",
    }),
};

pub const SLASH_PING: SlashCommand = SlashCommand {
    name: "q2ping",
    description: "Check bot connectivity.",
    option: None,
};

pub const SLASH_COMMANDS: [SlashCommand; 3] = [SLASH_SAY, SLASH_RCON, SLASH_PING];

impl SlashCommand {
    pub fn full_description(&self) -> String {
        format!("{}{}", self.description, SLASH_VERSION)
    }

    /// Whether a registered command with this description and these
    /// `(name, description, required)` options is current.
    pub fn matches<'a, I>(&self, description: &str, options: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str, bool)>,
    {
        if description != self.full_description() {
            return false;
        }
        let registered: Vec<_> = options.into_iter().collect();
        match self.option {
            None => registered.is_empty(),
            Some(option) => registered == [(option.name, option.description, true)],
        }
    }

    fn is_current(&self, command: &Command) -> bool {
        self.matches(
            &command.description,
            command
                .options
                .iter()
                .map(|o| (o.name.as_str(), o.description.as_str(), o.required)),
        )
    }

    fn builder(&self) -> CreateCommand {
        let mut builder = CreateCommand::new(self.name)
            .description(self.full_description())
            .default_member_permissions(Permissions::SEND_MESSAGES)
            .dm_permission(false);
        if let Some(option) = self.option {
            builder = builder.add_option(
                CreateCommandOption::new(CommandOptionType::String, option.name, option.description)
                    .required(true),
            );
        }
        builder
    }
}

/// Register the slash commands globally, editing stale ones.
///
/// The HTTP client must carry the application id.
pub async fn register_slash_commands(http: &Http) -> DiscordResult<()> {
    let existing = Command::get_global_commands(http).await?;

    for slash in SLASH_COMMANDS {
        match existing.iter().find(|c| c.name == slash.name) {
            Some(command) if slash.is_current(command) => {
                debug!("Slash command {} is up to date", slash.name);
            }
            Some(command) => {
                warn!("Slash command {} out of date, updating", slash.name);
                Command::edit_global_command(http, command.id, slash.builder()).await?;
            }
            None => {
                info!("Registering slash command {}", slash.name);
                Command::create_global_command(http, slash.builder()).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::queue::QueueMode;
    use crate::bridge::state::LifecycleState;

    fn requester(user_id: u64, channel_id: u64) -> Requester {
        Requester {
            user_id,
            is_bot: false,
            channel_id,
            display_name: "Alice".to_string(),
            roles: vec![1, 2],
        }
    }

    fn router(channel_id: Option<u64>, policy: RconPolicy) -> (Arc<BridgeQueue>, CommandRouter) {
        let inbound = Arc::new(BridgeQueue::new("inbound", QueueMode::UNBOUNDED));
        inbound.set_state(LifecycleState::Ready);
        let router = CommandRouter::new(Arc::clone(&inbound), channel_id, policy);
        (inbound, router)
    }

    fn drain(queue: &BridgeQueue) -> Vec<String> {
        std::iter::from_fn(|| queue.try_pop())
            .map(|c| c.into_string())
            .collect()
    }

    #[test]
    fn test_rcon_policy_user_match() {
        let policy = RconPolicy {
            user_id: Some(42),
            role_id: None,
        };
        assert!(policy.is_authorized(42, &[]));
    }

    #[test]
    fn test_rcon_policy_role_mismatch() {
        let policy = RconPolicy {
            user_id: None,
            role_id: Some(99),
        };
        assert!(!policy.is_authorized(7, &[1, 2]));
        assert!(policy.is_authorized(7, &[1, 99]));
    }

    #[test]
    fn test_rcon_policy_unset_never_matches() {
        assert!(!RconPolicy::default().is_authorized(0, &[0]));
    }

    #[test]
    fn test_parse_prefix_commands() {
        assert_eq!(parse_prefix_command("!", "!say hello there"), Some(BotCommand::Say("hello there")));
        assert_eq!(parse_prefix_command("!", "!rcon map q2dm1"), Some(BotCommand::Rcon("map q2dm1")));
        assert_eq!(parse_prefix_command("!", "!PING"), Some(BotCommand::Ping));
        assert_eq!(parse_prefix_command("q2/", "q2/ping"), Some(BotCommand::Ping));
    }

    #[test]
    fn test_parse_prefix_ignores_other_messages() {
        assert_eq!(parse_prefix_command("!", "say hello"), None);
        assert_eq!(parse_prefix_command("!", "!sayhello"), None);
        assert_eq!(parse_prefix_command("!", "!say   "), None);
        assert_eq!(parse_prefix_command("!", "!who"), None);
    }

    #[test]
    fn test_say_relays_chat() {
        let (inbound, router) = router(Some(5), RconPolicy::default());
        let outcome = router.execute(&requester(1, 5), BotCommand::Say("gg"));

        assert_eq!(outcome, CommandOutcome::Relayed);
        assert_eq!(outcome.reply(), None);
        assert_eq!(drain(&inbound), vec!["say_discord Alice: gg\n"]);
    }

    #[test]
    fn test_wrong_channel_and_bots_are_rejected() {
        let (inbound, router) = router(Some(5), RconPolicy::default());

        let outcome = router.execute(&requester(1, 6), BotCommand::Ping);
        assert_eq!(outcome.reply(), Some(REPLY_REJECTED));

        let mut bot = requester(1, 5);
        bot.is_bot = true;
        assert_eq!(router.execute(&bot, BotCommand::Say("hi")), CommandOutcome::Rejected);
        assert!(inbound.is_empty());
    }

    #[test]
    fn test_any_channel_accepted_without_target() {
        let (_inbound, router) = router(None, RconPolicy::default());
        let outcome = router.execute(&requester(1, 123), BotCommand::Ping);
        assert_eq!(outcome.reply(), Some(REPLY_PONG));
    }

    #[test]
    fn test_rcon_authorization() {
        let policy = RconPolicy {
            user_id: Some(42),
            role_id: Some(99),
        };
        let (inbound, router) = router(None, policy);

        let denied = router.execute(&requester(7, 1), BotCommand::Rcon("quit"));
        assert_eq!(denied.reply(), Some(REPLY_UNAUTHORIZED));
        assert!(inbound.is_empty());

        let queued = router.execute(&requester(42, 1), BotCommand::Rcon("map\tq2dm1"));
        assert_eq!(queued.reply(), Some(REPLY_QUEUED));
        assert_eq!(drain(&inbound), vec!["map?q2dm1\n"]);
    }

    #[test]
    fn test_closed_inbound_is_unavailable() {
        let (inbound, router) = router(None, RconPolicy::default());
        inbound.set_state(LifecycleState::Closed);
        assert_eq!(
            router.execute(&requester(1, 1), BotCommand::Say("late")),
            CommandOutcome::Unavailable
        );
    }

    #[test]
    fn test_slash_command_matching() {
        assert!(SLASH_SAY.matches(
            "Broadcast message to game server. (v1.0)",
            [("message", "Message Content", true)]
        ));
        assert!(!SLASH_SAY.matches("Broadcast message to game server.", [("message", "Message Content", true)]));
        assert!(!SLASH_SAY.matches(
            "Broadcast message to game server. (v1.0)",
            [("message", "Message Content", false)]
        ));
        assert!(SLASH_PING.matches("Check bot connectivity. (v1.0)", []));
        assert!(!SLASH_PING.matches("Check bot connectivity. (v1.0)", [("extra", "x", true)]));
    }
}
