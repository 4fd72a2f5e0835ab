use async_trait::async_trait;
use crate::domain::entities::{ChatId, User};
use crate::application::errors::{BotError, EnumerationError};

/// Rich-text mode for outbound messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Html,
}

impl ParseMode {
    /// Value of Telegram's `parse_mode` field
    pub fn api_value(&self) -> Option<&'static str> {
        match self {
            ParseMode::Plain => None,
            ParseMode::Html => Some("HTML"),
        }
    }
}

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Start the bot
    async fn start(&self) -> Result<(), BotError>;

    /// Send a message to a chat, returning the platform message id
    async fn send_message(&self, chat_id: ChatId, text: &str, mode: ParseMode) -> Result<String, BotError>;

    /// List the current members of a chat.
    ///
    /// Must return the complete membership or an error, never a partial list.
    async fn enumerate_members(&self, chat_id: ChatId) -> Result<Vec<User>, EnumerationError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: i64,
    pub name: String,
    pub username: String,
}
