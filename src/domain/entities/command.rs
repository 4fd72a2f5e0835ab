/// What an inbound message asks the bot to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Help,
    Version,
    /// `/all` or an inline `@all` marker
    MentionAll,
    /// Pick a random roster member as the new owner
    RandomPick,
    /// Pick one of the caller-supplied tokens as the new owner
    PickFromList(Vec<String>),
    /// Caller becomes the owner
    Claim,
    QueryOwner,
}

impl Trigger {
    /// Triggers that need a group roster or group state
    pub fn group_only(&self) -> bool {
        matches!(
            self,
            Trigger::MentionAll
                | Trigger::RandomPick
                | Trigger::PickFromList(_)
                | Trigger::Claim
                | Trigger::QueryOwner
        )
    }
}

/// Represents a bot command as advertised to users
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            aliases: Vec::new(),
            usage: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.name == input_lower || self.aliases.iter().any(|a| *a == input_lower)
    }
}

/// Ordered list of the commands the bot understands
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Command::new("all", "Mention everyone in the group").with_aliases(&["everyone"]));
        registry.register(Command::new("random", "Pick a random member as the new owner"));
        registry.register(
            Command::new("pick", "Pick one of the given names as the new owner")
                .with_usage("/pick @alice @bob carol"),
        );
        registry.register(Command::new("claim", "Claim ownership for yourself"));
        registry.register(Command::new("owner", "Show the current owner"));
        registry.register(Command::new("help", "Show help message"));
        registry.register(Command::new("start", "Start the bot"));
        registry.register(Command::new("version", "Show bot version"));
        registry
    }

    pub fn register(&mut self, command: Command) {
        self.commands.retain(|c| c.name != command.name);
        self.commands.push(command);
    }

    pub fn find(&self, input: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matches(input))
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}
