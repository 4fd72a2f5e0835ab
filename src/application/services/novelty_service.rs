//! Ownership token game

use std::sync::Arc;

use super::roster_service::RosterService;
use super::selection::{pick_from_tokens, pick_random};
use crate::application::errors::{BotError, MentionError};
use crate::domain::entities::mention::escape_html;
use crate::domain::entities::{ChatId, Mention, Owner};
use crate::domain::traits::{Bot, Store};

pub const PICK_USAGE: &str = "/pick @alice @bob carol";

pub struct NoveltyService<B: Bot, S: Store> {
    roster: Arc<RosterService<B, S>>,
    store: Arc<S>,
}

impl<B: Bot, S: Store> NoveltyService<B, S> {
    pub fn new(roster: Arc<RosterService<B, S>>, store: Arc<S>) -> Self {
        Self { roster, store }
    }

    /// A random roster member becomes the owner. The caller can win too.
    pub async fn random_owner(&self, chat_id: ChatId) -> Result<Owner, BotError> {
        let mentions: Vec<Mention> = self.roster
            .resolve(chat_id)
            .await?
            .into_iter()
            .map(|(_, mention)| mention)
            .collect();

        let winner = pick_random(&mentions, &mut rand::rng())
            .ok_or(MentionError::NoEligibleMentions)?;
        Ok(self.store.set_owner(chat_id, winner).await?)
    }

    /// One of the given tokens becomes the owner
    pub async fn owner_from_tokens(&self, chat_id: ChatId, tokens: &[String]) -> Result<Owner, BotError> {
        let winner = pick_from_tokens(tokens, &mut rand::rng())
            .ok_or_else(|| MentionError::MalformedInput(PICK_USAGE.to_string()))?;
        Ok(self.store.set_owner(chat_id, Mention::raw(escape_html(&winner))).await?)
    }

    /// The caller becomes the owner
    pub async fn claim(&self, chat_id: ChatId, caller: Mention) -> Result<Owner, BotError> {
        Ok(self.store.set_owner(chat_id, caller).await?)
    }

    pub async fn owner(&self, chat_id: ChatId) -> Result<Option<Owner>, BotError> {
        Ok(self.store.get_owner(chat_id).await?)
    }
}
