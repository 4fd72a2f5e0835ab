use crate::domain::entities::CommandRegistry;

/// Static texts for the informational commands
pub struct CommandService {
    registry: CommandRegistry,
    bot_name: String,
}

impl CommandService {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            registry: CommandRegistry::with_defaults(),
            bot_name: bot_name.into(),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn start_text(&self) -> String {
        "👋 Hi! I mention everyone in a group.\n\n\
         📝 Add me to a group and make me an administrator.\n\n\
         🔹 Use /all or write @all to mention everyone.\n\
         🔹 /help — show help"
            .to_string()
    }

    /// HTML-formatted help
    pub fn help_text(&self) -> String {
        let mut help = format!("📖 <b>{}</b>\n\n<b>Commands:</b>\n", self.bot_name);
        for cmd in self.registry.all() {
            help.push_str(&format!("• /{} — {}\n", cmd.name, cmd.description));
            if let Some(usage) = &cmd.usage {
                help.push_str(&format!("   <i>{}</i>\n", usage));
            }
        }
        help.push_str(
            "\n<b>Important:</b>\n\
             • You can also write @all anywhere in a message\n\
             • The bot should be an administrator of the group\n\
             • Members who never wrote in the chat may be missing \
             when the full member list is unavailable",
        );
        help
    }

    pub fn version_text(&self) -> String {
        format!("{} v{}", self.bot_name, env!("CARGO_PKG_VERSION"))
    }
}
