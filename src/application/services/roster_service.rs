//! Roster resolution - who is in a chat right now

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::{BotError, ConfigError, EnumerationError, MentionError};
use crate::domain::entities::{ChatEvent, ChatId, Mention, UserId};
use crate::domain::traits::{Bot, Store};

/// Where the member list for a fanout comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RosterStrategy {
    /// Ask the platform for the live member list on every request
    Active,
    /// Use members seen in chat events
    Passive,
    /// Active, falling back to the passive roster when enumeration fails
    #[default]
    Hybrid,
}

impl FromStr for RosterStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(RosterStrategy::Active),
            "passive" => Ok(RosterStrategy::Passive),
            "hybrid" => Ok(RosterStrategy::Hybrid),
            other => Err(ConfigError::InvalidValue(format!("unknown roster strategy: {}", other))),
        }
    }
}

/// Resolves chat rosters and keeps the passive roster up to date
pub struct RosterService<B: Bot, S: Store> {
    bot: Arc<B>,
    store: Arc<S>,
    strategy: RosterStrategy,
    enumeration_timeout: Duration,
}

impl<B: Bot, S: Store> RosterService<B, S> {
    pub fn new(bot: Arc<B>, store: Arc<S>, strategy: RosterStrategy, enumeration_timeout: Duration) -> Self {
        Self {
            bot,
            store,
            strategy,
            enumeration_timeout,
        }
    }

    /// Passive tracking. Runs for every strategy so the fallback stays warm.
    pub async fn observe(&self, event: &ChatEvent) -> Result<(), BotError> {
        let chat = event.chat();
        if !chat.kind.is_group() {
            return Ok(());
        }

        match event {
            ChatEvent::Message { sender, .. } => {
                self.store.upsert_member(chat.id, sender).await?;
            }
            ChatEvent::MembersJoined { users, .. } => {
                for user in users {
                    self.store.upsert_member(chat.id, user).await?;
                }
            }
            ChatEvent::MemberLeft { user, .. } => {
                self.store.remove_member(chat.id, user.id).await?;
                tracing::debug!("[{}] removed member {}", chat.id, user.id);
            }
        }
        Ok(())
    }

    /// Current members of a chat as `(user id, mention)` pairs
    pub async fn resolve(&self, chat_id: ChatId) -> Result<Vec<(UserId, Mention)>, BotError> {
        match self.strategy {
            RosterStrategy::Active => Ok(self.enumerate(chat_id).await.map_err(MentionError::from)?),
            RosterStrategy::Passive => self.passive(chat_id).await,
            RosterStrategy::Hybrid => match self.enumerate(chat_id).await {
                Ok(members) => Ok(members),
                Err(e) => match self.store.snapshot(chat_id).await? {
                    Some(members) => {
                        tracing::warn!("[{}] enumeration failed ({}), using observed roster", chat_id, e);
                        Ok(members)
                    }
                    None => Err(MentionError::Enumeration(e).into()),
                },
            },
        }
    }

    async fn passive(&self, chat_id: ChatId) -> Result<Vec<(UserId, Mention)>, BotError> {
        self.store
            .snapshot(chat_id)
            .await?
            .ok_or_else(|| MentionError::RosterUnknown.into())
    }

    async fn enumerate(&self, chat_id: ChatId) -> Result<Vec<(UserId, Mention)>, EnumerationError> {
        let users = tokio::time::timeout(self.enumeration_timeout, self.bot.enumerate_members(chat_id))
            .await
            .map_err(|_| EnumerationError::Timeout(self.enumeration_timeout.as_secs()))??;

        let members: Vec<(UserId, Mention)> = users
            .iter()
            .filter(|u| !u.is_bot)
            .map(|u| (u.id, Mention::for_user(u)))
            .collect();
        tracing::debug!("[{}] enumerated {} members", chat_id, members.len());
        Ok(members)
    }
}
