//! Message parser - Turns message text into a trigger for the bot

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::domain::entities::{CommandRegistry, Trigger};

/// `@all` as a whole word, or `@все` anywhere (covers `@всем`)
static INLINE_ALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@all(?:[^a-z0-9_]|$)|@все").expect("inline trigger pattern is valid")
});

/// Parses incoming message text into a [`Trigger`]
pub struct MessageParser {
    command_prefix: String,
    bot_username: String,
    registry: CommandRegistry,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>, bot_username: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            bot_username: bot_username.into().to_lowercase(),
            registry: CommandRegistry::with_defaults(),
        }
    }

    /// Parse a text message; `None` when the bot has nothing to do
    pub fn parse(&self, text: &str) -> Option<Trigger> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(cmd_text) = self.strip_prefix(text) {
            return self.parse_command(cmd_text);
        }

        if INLINE_ALL.is_match(&text.to_lowercase()) {
            return Some(Trigger::MentionAll);
        }
        None
    }

    fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix('/')
            .or_else(|| {
                if self.command_prefix.is_empty() {
                    None
                } else {
                    text.strip_prefix(self.command_prefix.as_str())
                }
            })
    }

    /// Parse a command message
    fn parse_command(&self, cmd_text: &str) -> Option<Trigger> {
        let mut parts = cmd_text.split_whitespace();
        let head = parts.next()?;

        // `/all@some_bot` is only for us when the suffix is our username
        let name = match head.split_once('@') {
            Some((name, target)) => {
                if !self.bot_username.is_empty() && target.to_lowercase() != self.bot_username {
                    return None;
                }
                name
            }
            None => head,
        };

        let command = self.registry.find(name)?;
        let trigger = match command.name.as_str() {
            "all" => Trigger::MentionAll,
            "random" => Trigger::RandomPick,
            "pick" => {
                // Permissive: any word that does not look like a command
                let tokens = parts
                    .filter(|t| !t.starts_with('/'))
                    .map(|t| t.to_string())
                    .collect();
                Trigger::PickFromList(tokens)
            }
            "claim" => Trigger::Claim,
            "owner" => Trigger::QueryOwner,
            "help" => Trigger::Help,
            "start" => Trigger::Start,
            "version" => Trigger::Version,
            _ => return None,
        };
        Some(trigger)
    }
}
