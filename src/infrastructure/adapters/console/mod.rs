//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::domain::entities::{Chat, ChatEvent, ChatId, User};
use crate::domain::traits::{Bot, BotInfo, ParseMode};
use crate::application::errors::{BotError, EnumerationError};
use crate::infrastructure::config::ConsoleMember;

/// The single simulated group
pub const CONSOLE_CHAT_ID: ChatId = -1;

/// Console bot adapter for local development.
///
/// Every line typed on stdin is a message from the console user in one
/// simulated supergroup whose members come from the configuration.
pub struct ConsoleAdapter {
    info: BotInfo,
    me: User,
    members: Vec<User>,
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleAdapter {
    pub fn new(members: &[ConsoleMember]) -> Self {
        let me = User::new(1, "Console").with_username("console");
        let mut all = vec![me.clone()];
        all.extend(members.iter().map(|m| User {
            id: m.id,
            username: m.username.clone(),
            first_name: m.first_name.clone(),
            last_name: m.last_name.clone(),
            is_bot: m.is_bot,
        }));

        Self {
            info: BotInfo {
                id: 0,
                name: "tagall-bot".to_string(),
                username: "console".to_string(),
            },
            me,
            members: all,
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Next typed line as a chat event; `None` on end of input
    pub async fn next_event(&self) -> Option<ChatEvent> {
        let mut lines = self.lines.lock().await;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    return None;
                }
            };
            let line = line.trim();
            if !line.is_empty() {
                return Some(ChatEvent::message(
                    Chat::group(CONSOLE_CHAT_ID),
                    self.me.clone(),
                    line,
                ));
            }
        }
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode) with {} members", self.members.len());
        Ok(())
    }

    async fn send_message(&self, _chat_id: ChatId, text: &str, _mode: ParseMode) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok("console_msg".to_string())
    }

    async fn enumerate_members(&self, chat_id: ChatId) -> Result<Vec<User>, EnumerationError> {
        if chat_id != CONSOLE_CHAT_ID {
            return Err(EnumerationError::Permission(format!("unknown chat {}", chat_id)));
        }
        Ok(self.members.clone())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
