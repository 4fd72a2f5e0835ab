use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::{ChatId, Mention, Owner, User, UserId};

/// Store trait - per-chat roster and novelty state.
///
/// Implementations must serialize writers per chat; chats are independent.
#[async_trait]
pub trait Store: Send + Sync {
    // Roster operations
    async fn upsert_member(&self, chat_id: ChatId, user: &User) -> Result<(), StorageError>;
    async fn remove_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), StorageError>;
    /// `None` when nothing is known about the chat's members
    async fn snapshot(&self, chat_id: ChatId) -> Result<Option<Vec<(UserId, Mention)>>, StorageError>;

    // Owner operations
    async fn set_owner(&self, chat_id: ChatId, mention: Mention) -> Result<Owner, StorageError>;
    async fn get_owner(&self, chat_id: ChatId) -> Result<Option<Owner>, StorageError>;
}
