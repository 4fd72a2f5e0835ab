//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::application::messaging::DispatcherOptions;
use crate::application::services::fanout::{BatchLimits, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CHARS};
use crate::application::services::RosterStrategy;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

/// How rosters are resolved and how mentions are split
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RosterConfig {
    pub strategy: RosterStrategy,
    pub batch_size: usize,
    pub max_message_chars: usize,
    pub enumeration_timeout_seconds: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            strategy: RosterStrategy::Hybrid,
            batch_size: DEFAULT_BATCH_SIZE,
            max_message_chars: DEFAULT_MAX_CHARS,
            enumeration_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: i64,
}

fn default_poll_timeout() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Simulated group members for dev mode
    #[serde(default)]
    pub members: Vec<ConsoleMember>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleMember {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "tagall-bot".to_string(),
                prefix: "/".to_string(),
            },
            roster: RosterConfig::default(),
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                    poll_timeout_seconds: default_poll_timeout(),
                }),
                console: Some(ConsoleConfig {
                    enabled: true,
                    members: vec![
                        ConsoleMember {
                            id: 2,
                            first_name: "Alice".to_string(),
                            last_name: None,
                            username: Some("alice".to_string()),
                            is_bot: false,
                        },
                        ConsoleMember {
                            id: 3,
                            first_name: "Carol".to_string(),
                            last_name: Some("King".to_string()),
                            username: None,
                            is_bot: false,
                        },
                    ],
                }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.batch_size == 0 {
            return Err(ConfigError::InvalidValue("roster.batch-size must be at least 1".to_string()));
        }
        if self.roster.max_message_chars == 0 {
            return Err(ConfigError::InvalidValue("roster.max-message-chars must be at least 1".to_string()));
        }
        if self.roster.enumeration_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "roster.enumeration-timeout-seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables override file values
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            let tg = self.adapters.telegram.get_or_insert(TelegramConfig {
                enabled: true,
                token: None,
                poll_timeout_seconds: default_poll_timeout(),
            });
            tg.token = Some(token);
            tg.enabled = true;
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(strategy) = std::env::var("ROSTER_STRATEGY") {
            match strategy.parse() {
                Ok(strategy) => self.roster.strategy = strategy,
                Err(e) => tracing::warn!("Ignoring ROSTER_STRATEGY: {}", e),
            }
        }
    }

    /// Telegram token, if the adapter is enabled and configured
    pub fn telegram_token(&self) -> Option<String> {
        self.adapters.telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.clone())
    }

    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            bot_name: self.bot.name.clone(),
            command_prefix: self.bot.prefix.clone(),
            strategy: self.roster.strategy,
            limits: BatchLimits::new(self.roster.batch_size, self.roster.max_message_chars),
            enumeration_timeout: Duration::from_secs(self.roster.enumeration_timeout_seconds),
        }
    }
}
