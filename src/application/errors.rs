//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Mention(#[from] MentionError),
}

/// Why the platform could not list a chat's members
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumerationError {
    #[error("permission denied: {0}")]
    Permission(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("platform listed only {listed} of {total} members")]
    Incomplete { listed: usize, total: usize },
}

/// Outcomes of a mention or novelty request that are reported to the chat
/// instead of being sent as mentions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MentionError {
    #[error("roster unknown for this chat")]
    RosterUnknown,

    #[error("no eligible mentions")]
    NoEligibleMentions,

    #[error("member enumeration failed: {0}")]
    Enumeration(#[from] EnumerationError),

    #[error("malformed command input: {0}")]
    MalformedInput(String),
}

impl MentionError {
    /// Reply shown in the chat for this outcome
    pub fn user_message(&self) -> String {
        match self {
            MentionError::RosterUnknown => {
                "😕 I don't know the members of this group yet.\n\
                 Wait until people write at least one message."
                    .to_string()
            }
            MentionError::NoEligibleMentions => {
                "🤷 Nobody to mention — you're the only known member!".to_string()
            }
            MentionError::Enumeration(_) => {
                "⚠️ Couldn't get the member list.\n\
                 Make sure the bot is an administrator of this group."
                    .to_string()
            }
            MentionError::MalformedInput(usage) => format!("Usage: {}", usage),
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
