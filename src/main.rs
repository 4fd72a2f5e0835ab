use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use tagall_bot::application::messaging::{ChatRouter, EventDispatcher};
use tagall_bot::domain::traits::Bot;
use tagall_bot::infrastructure::adapters::telegram::Update;
use tagall_bot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use tagall_bot::infrastructure::config::Config;
use tagall_bot::infrastructure::storage::MemoryStore;

#[derive(Parser)]
#[command(name = "tagall-bot")]
#[command(about = "Mention everyone in a group chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(&cli.config, cli.token);
        }
        Commands::Version => {
            println!("tagall-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if !std::path::Path::new(config_path).exists() {
        return Config::load_env();
    }
    match Config::load(config_path) {
        Ok(mut config) => {
            config.apply_env();
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        }
    }
}

fn run_bot(config_path: &str, token_override: Option<String>) {
    let config = load_config(config_path);
    tracing::info!(
        "Starting {} (roster strategy: {:?}, batch size: {})",
        config.bot.name, config.roster.strategy, config.roster.batch_size
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return;
        }
    };

    if let Some(token) = token_override.or_else(|| config.telegram_token()) {
        rt.block_on(run_telegram_bot(token, &config));
    } else {
        // Dev mode
        rt.block_on(run_console_bot(&config));
    }
}

async fn run_telegram_bot(token: String, config: &Config) {
    let mut bot = TelegramAdapter::new(token, &config.bot.name);

    if let Err(e) = bot.fetch_bot_info().await {
        tracing::error!("Failed to fetch bot info: {}", e);
        return;
    }
    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        return;
    }

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let bot = Arc::new(bot);
    let store = Arc::new(MemoryStore::new());
    let dispatcher = Arc::new(EventDispatcher::new(bot.clone(), store, config.dispatcher_options()));

    if let Err(e) = bot.register_commands(dispatcher.commands().registry()).await {
        tracing::warn!("Failed to register commands: {}", e);
    }

    let poll_timeout = config.adapters.telegram
        .as_ref()
        .map(|t| t.poll_timeout_seconds)
        .unwrap_or(30);
    let mut offset: i64 = 0;
    let router = ChatRouter::new(dispatcher);

    tracing::info!("Starting message loop...");

    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            result = bot.get_updates(offset, poll_timeout) => result,
        };

        match updates {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                }
                offset = Update::next_offset(&updates, offset);

                // Ordered within a chat, parallel across chats
                for update in updates {
                    if let Some(event) = update.into_event() {
                        router.route(event).await;
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }

    router.shutdown().await;
}

async fn run_console_bot(config: &Config) {
    let members = config.adapters.console
        .as_ref()
        .map(|c| c.members.clone())
        .unwrap_or_default();
    let bot = Arc::new(ConsoleAdapter::new(&members));

    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        return;
    }

    let store = Arc::new(MemoryStore::new());
    let dispatcher = EventDispatcher::new(bot.clone(), store, config.dispatcher_options());

    // Main loop (for console mode)
    while let Some(event) = bot.next_event().await {
        if let Err(e) = dispatcher.dispatch(event).await {
            tracing::error!("Failed to handle event: {}", e);
        }
    }
}

fn init_config() {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render default config: {}", e),
    }
}
