//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{self, ChatEvent, ChatId, ChatKind, CommandRegistry};
use crate::domain::traits::{Bot, BotInfo, ParseMode};
use crate::application::errors::{BotError, EnumerationError};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub new_chat_members: Option<Vec<User>>,
    pub left_chat_member: Option<User>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMember {
    user: User,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

/// Failure of a single Bot API call
#[derive(Debug)]
enum CallError {
    Transport(String),
    Api { code: i64, description: String },
    Parse(String),
}

impl From<CallError> for BotError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(msg) => BotError::Network(msg),
            CallError::Api { code, description } => BotError::Api(format!("{}: {}", code, description)),
            CallError::Parse(msg) => BotError::Parse(msg),
        }
    }
}

impl From<CallError> for EnumerationError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Api { code: 403, description } => EnumerationError::Permission(description),
            CallError::Api { code: 400, description } if description.contains("rights") => {
                EnumerationError::Permission(description)
            }
            CallError::Api { code, description } => {
                EnumerationError::Network(format!("{}: {}", code, description))
            }
            CallError::Transport(msg) | CallError::Parse(msg) => EnumerationError::Network(msg),
        }
    }
}

impl From<User> for entities::User {
    fn from(u: User) -> Self {
        entities::User {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            is_bot: u.is_bot,
        }
    }
}

impl Update {
    /// Convert into a chat event; `None` for updates the bot ignores
    pub fn into_event(self) -> Option<ChatEvent> {
        let msg = self.message?;
        let chat = entities::Chat::new(msg.chat.id, ChatKind::parse(&msg.chat.kind));

        if let Some(users) = msg.new_chat_members {
            return Some(ChatEvent::MembersJoined {
                chat,
                users: users.into_iter().map(Into::into).collect(),
            });
        }
        if let Some(user) = msg.left_chat_member {
            return Some(ChatEvent::MemberLeft { chat, user: user.into() });
        }

        let sender = msg.from?;
        let text = msg.text.or(msg.caption).unwrap_or_default();
        Some(ChatEvent::message(chat, sender.into(), text))
    }

    /// Get the next update offset
    pub fn next_offset(updates: &[Update], current: i64) -> i64 {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, bot_name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: 0,
                name: bot_name.into(),
                username: String::new(),
            },
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    async fn call<Q, T>(&self, method: &str, request: &Q) -> Result<T, CallError>
    where
        Q: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(request)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| CallError::Parse(format!("{} ({})", e, status)))?;

        match (data.ok, data.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(CallError::Api {
                code: data.error_code.unwrap_or(i64::from(status.as_u16())),
                description: data.description.unwrap_or_else(|| status.to_string()),
            }),
        }
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        let me: User = self.call("getMe", &serde_json::json!({})).await?;
        self.info = BotInfo {
            id: me.id,
            name: me.first_name,
            username: me.username.unwrap_or_default(),
        };
        Ok(())
    }

    /// Long-poll for updates
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };
        Ok(self.call("getUpdates", &request).await?)
    }

    /// Send a message with specific parse mode
    pub async fn send_message_with_format(&self, chat_id: ChatId, text: &str, parse_mode: Option<&str>) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: ChatId,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
            disable_web_page_preview: bool,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };
        let result: MessageResult = self.call("sendMessage", &request).await?;
        Ok(result.message_id.to_string())
    }

    /// Register bot commands with Telegram
    pub async fn register_commands(&self, registry: &CommandRegistry) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command<'a> {
            command: &'a str,
            description: &'a str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest<'a> {
            commands: Vec<Command<'a>>,
        }

        let request = SetMyCommandsRequest {
            commands: registry
                .all()
                .map(|c| Command { command: &c.name, description: &c.description })
                .collect(),
        };
        let _: bool = self.call("setMyCommands", &request).await?;

        tracing::info!("Registered {} bot commands with Telegram", registry.all().count());
        Ok(())
    }

    async fn member_count(&self, chat_id: ChatId) -> Result<usize, CallError> {
        let count: i64 = self.call("getChatMemberCount", &serde_json::json!({ "chat_id": chat_id })).await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn administrators(&self, chat_id: ChatId) -> Result<Vec<User>, CallError> {
        let members: Vec<ChatMember> = self
            .call("getChatAdministrators", &serde_json::json!({ "chat_id": chat_id }))
            .await?;
        Ok(members.into_iter().map(|m| m.user).collect())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", &self.token[..8.min(self.token.len())]);
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str, mode: ParseMode) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        self.send_message_with_format(chat_id, text, mode.api_value()).await
    }

    /// The Bot API only lists administrators, so the result is complete only
    /// when every member is an administrator.
    async fn enumerate_members(&self, chat_id: ChatId) -> Result<Vec<entities::User>, EnumerationError> {
        let total = self.member_count(chat_id).await?;
        let admins = self.administrators(chat_id).await?;

        if admins.len() < total {
            return Err(EnumerationError::Incomplete { listed: admins.len(), total });
        }
        Ok(admins.into_iter().map(Into::into).collect())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
