//! Event dispatcher - Routes chat events to the services

use std::sync::Arc;

use super::parser::MessageParser;
use crate::application::errors::{BotError, MentionError};
use crate::application::services::{
    BatchLimits, CommandService, MentionService, NoveltyService, RosterService, RosterStrategy,
};
use crate::domain::entities::{Chat, ChatEvent, Mention, Owner, Trigger, User};
use crate::domain::traits::{Bot, ParseMode, Store};

const GROUP_ONLY: &str = "⚠️ This command only works in groups!";

/// Settings the dispatcher needs from the configuration
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub bot_name: String,
    pub command_prefix: String,
    pub strategy: RosterStrategy,
    pub limits: BatchLimits,
    pub enumeration_timeout: std::time::Duration,
}

/// Event dispatcher - applies passive tracking and runs the triggered command
pub struct EventDispatcher<B: Bot, S: Store> {
    bot: Arc<B>,
    parser: MessageParser,
    roster: Arc<RosterService<B, S>>,
    mentions: MentionService<B, S>,
    novelty: NoveltyService<B, S>,
    commands: CommandService,
}

impl<B: Bot, S: Store> EventDispatcher<B, S> {
    pub fn new(bot: Arc<B>, store: Arc<S>, options: DispatcherOptions) -> Self {
        let info = bot.bot_info();
        let roster = Arc::new(RosterService::new(
            bot.clone(),
            store.clone(),
            options.strategy,
            options.enumeration_timeout,
        ));

        Self {
            parser: MessageParser::new(options.command_prefix, info.username),
            mentions: MentionService::new(bot.clone(), roster.clone(), options.limits),
            novelty: NoveltyService::new(roster.clone(), store),
            commands: CommandService::new(options.bot_name),
            roster,
            bot,
        }
    }

    pub fn commands(&self) -> &CommandService {
        &self.commands
    }

    /// Handle one inbound event.
    ///
    /// The reply is worked out against the roster as it was before the event,
    /// then the event is tracked, and only then is anything sent. A first
    /// `/all` in a chat nobody has spoken in reports an unknown roster, and
    /// slow sends never hold back tracking of the events queued behind them.
    pub async fn dispatch(&self, event: ChatEvent) -> Result<(), BotError> {
        let chat = event.chat();
        tracing::debug!("[{}] {} event", chat.id, event.kind_str());

        let outgoing = self.prepare(&event).await;

        if let Err(e) = self.roster.observe(&event).await {
            tracing::warn!("[{}] failed to track members: {}", chat.id, e);
        }

        match outgoing? {
            Some(Outgoing::Reply(text, mode)) => self.reply(chat, &text, mode).await,
            Some(Outgoing::Mentions(batches)) => {
                self.mentions.deliver(chat.id, &batches).await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn prepare(&self, event: &ChatEvent) -> Result<Option<Outgoing>, BotError> {
        let chat = event.chat();
        let ChatEvent::Message { sender, text, .. } = event else {
            return Ok(None);
        };
        if sender.is_bot {
            return Ok(None);
        }
        let Some(trigger) = self.parser.parse(text) else {
            return Ok(None);
        };

        if trigger.group_only() && !chat.kind.is_group() {
            return Ok(Some(Outgoing::Reply(GROUP_ONLY.to_string(), ParseMode::Plain)));
        }

        match self.run(chat, sender, trigger).await {
            Ok(outgoing) => Ok(Some(outgoing)),
            Err(BotError::Mention(e)) => {
                if let MentionError::Enumeration(reason) = &e {
                    tracing::warn!("[{}] member enumeration failed: {}", chat.id, reason);
                }
                Ok(Some(Outgoing::Reply(e.user_message(), ParseMode::Plain)))
            }
            Err(e) => {
                tracing::error!("[{}] request failed: {}", chat.id, e);
                Err(e)
            }
        }
    }

    async fn run(&self, chat: Chat, sender: &User, trigger: Trigger) -> Result<Outgoing, BotError> {
        let outgoing = match trigger {
            Trigger::Start => Outgoing::Reply(self.commands.start_text(), ParseMode::Plain),
            Trigger::Help => Outgoing::Reply(self.commands.help_text(), ParseMode::Html),
            Trigger::Version => Outgoing::Reply(self.commands.version_text(), ParseMode::Plain),
            Trigger::MentionAll => Outgoing::Mentions(self.mentions.plan(chat.id, Some(sender.id)).await?),
            Trigger::RandomPick => {
                let owner = self.novelty.random_owner(chat.id).await?;
                Outgoing::html(format!("🎲 {} is the new owner!", owner.mention))
            }
            Trigger::PickFromList(tokens) => {
                let owner = self.novelty.owner_from_tokens(chat.id, &tokens).await?;
                Outgoing::html(format!("🎯 {} is the new owner!", owner.mention))
            }
            Trigger::Claim => {
                let owner = self.novelty.claim(chat.id, Mention::for_user(sender)).await?;
                Outgoing::html(format!("👑 {} claimed ownership!", owner.mention))
            }
            Trigger::QueryOwner => match self.novelty.owner(chat.id).await? {
                Some(owner) => Outgoing::html(owner_text(&owner)),
                None => Outgoing::html("Nobody owns this chat yet. Use /claim or /random.".to_string()),
            },
        };
        Ok(outgoing)
    }

    async fn reply(&self, chat: Chat, text: &str, mode: ParseMode) -> Result<(), BotError> {
        self.bot.send_message(chat.id, text, mode).await?;
        Ok(())
    }
}

/// What a handled event sends back to its chat
enum Outgoing {
    Reply(String, ParseMode),
    Mentions(Vec<Vec<Mention>>),
}

impl Outgoing {
    fn html(text: String) -> Self {
        Outgoing::Reply(text, ParseMode::Html)
    }
}

fn owner_text(owner: &Owner) -> String {
    format!(
        "👑 Current owner: {} (since {} UTC)",
        owner.mention,
        owner.claimed_at.format("%Y-%m-%d %H:%M")
    )
}
