use std::sync::Arc;

use super::fanout::{build_batches, render_batch, BatchLimits};
use super::roster_service::RosterService;
use crate::application::errors::{BotError, MentionError};
use crate::domain::entities::{ChatId, Mention, UserId};
use crate::domain::traits::{Bot, ParseMode, Store};

/// Service for mentioning everyone in a chat
pub struct MentionService<B: Bot, S: Store> {
    bot: Arc<B>,
    roster: Arc<RosterService<B, S>>,
    limits: BatchLimits,
}

impl<B: Bot, S: Store> MentionService<B, S> {
    pub fn new(bot: Arc<B>, roster: Arc<RosterService<B, S>>, limits: BatchLimits) -> Self {
        Self { bot, roster, limits }
    }

    /// Resolve the roster and split it into batches, without the caller
    pub async fn plan(&self, chat_id: ChatId, caller: Option<UserId>) -> Result<Vec<Vec<Mention>>, BotError> {
        let members = self.roster.resolve(chat_id).await?;
        let batches = build_batches(&members, caller, self.limits);
        if batches.is_empty() {
            return Err(MentionError::NoEligibleMentions.into());
        }
        Ok(batches)
    }

    /// Send planned batches in order; returns how many were delivered.
    ///
    /// A batch that fails to send does not stop the others. The call fails
    /// only when nothing was delivered.
    pub async fn deliver(&self, chat_id: ChatId, batches: &[Vec<Mention>]) -> Result<usize, BotError> {
        tracing::info!("[{}] mentioning {} members in {} message(s)",
            chat_id, batches.iter().map(Vec::len).sum::<usize>(), batches.len());

        let mut delivered = 0;
        let mut first_error = None;
        for batch in batches {
            match self.bot.send_message(chat_id, &render_batch(batch), ParseMode::Html).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::error!("[{}] failed to send mention batch: {}", chat_id, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) if delivered == 0 => Err(e),
            _ => Ok(delivered),
        }
    }
}
