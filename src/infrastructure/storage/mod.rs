//! In-memory storage implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::domain::traits::Store;
use crate::domain::entities::{ChatId, Mention, Owner, User, UserId};
use crate::application::errors::StorageError;

/// Everything the bot remembers about one chat
#[derive(Debug, Default)]
struct ChatState {
    /// First-insertion order
    members: Vec<(UserId, Mention)>,
    owner: Option<Owner>,
}

impl ChatState {
    fn upsert(&mut self, user: &User) {
        let mention = Mention::for_user(user);
        match self.members.iter_mut().find(|(id, _)| *id == user.id) {
            Some(entry) => entry.1 = mention,
            None => self.members.push((user.id, mention)),
        }
    }

    fn remove(&mut self, user_id: UserId) {
        self.members.retain(|(id, _)| *id != user_id);
    }
}

/// Process-local store keyed by chat.
///
/// The outer map is only locked long enough to find or create a chat's cell;
/// reads and writes of the chat itself happen under that chat's own mutex.
#[derive(Default)]
pub struct MemoryStore {
    chats: RwLock<HashMap<ChatId, Arc<Mutex<ChatState>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, chat_id: ChatId) -> Result<Option<Arc<Mutex<ChatState>>>, StorageError> {
        let chats = self.chats.read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(chats.get(&chat_id).cloned())
    }

    fn cell(&self, chat_id: ChatId) -> Result<Arc<Mutex<ChatState>>, StorageError> {
        if let Some(cell) = self.existing(chat_id)? {
            return Ok(cell);
        }
        let mut chats = self.chats.write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(chats.entry(chat_id).or_default().clone())
    }

    /// Number of chats with any recorded state
    pub fn chat_count(&self) -> usize {
        self.chats.read().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_member(&self, chat_id: ChatId, user: &User) -> Result<(), StorageError> {
        if user.is_bot {
            return Ok(());
        }
        let cell = self.cell(chat_id)?;
        cell.lock().await.upsert(user);
        Ok(())
    }

    async fn remove_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), StorageError> {
        if let Some(cell) = self.existing(chat_id)? {
            cell.lock().await.remove(user_id);
        }
        Ok(())
    }

    async fn snapshot(&self, chat_id: ChatId) -> Result<Option<Vec<(UserId, Mention)>>, StorageError> {
        let Some(cell) = self.existing(chat_id)? else {
            return Ok(None);
        };
        let state = cell.lock().await;
        if state.members.is_empty() {
            return Ok(None);
        }
        Ok(Some(state.members.clone()))
    }

    async fn set_owner(&self, chat_id: ChatId, mention: Mention) -> Result<Owner, StorageError> {
        let cell = self.cell(chat_id)?;
        let owner = Owner::new(mention);
        cell.lock().await.owner = Some(owner.clone());
        Ok(owner)
    }

    async fn get_owner(&self, chat_id: ChatId) -> Result<Option<Owner>, StorageError> {
        match self.existing(chat_id)? {
            Some(cell) => Ok(cell.lock().await.owner.clone()),
            None => Ok(None),
        }
    }
}
