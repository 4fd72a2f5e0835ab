use super::User;

/// Group conversation identifier
pub type ChatId = i64;

/// Kind of chat an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Private,
        }
    }

    /// Rosters and group commands only apply to these
    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// The chat an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub kind: ChatKind,
}

impl Chat {
    pub fn new(id: ChatId, kind: ChatKind) -> Self {
        Self { id, kind }
    }

    pub fn group(id: ChatId) -> Self {
        Self::new(id, ChatKind::Supergroup)
    }
}

/// Inbound event delivered by a platform adapter
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// Any message; `text` is empty for media without a caption
    Message { chat: Chat, sender: User, text: String },
    MembersJoined { chat: Chat, users: Vec<User> },
    MemberLeft { chat: Chat, user: User },
}

impl ChatEvent {
    pub fn message(chat: Chat, sender: User, text: impl Into<String>) -> Self {
        ChatEvent::Message {
            chat,
            sender,
            text: text.into(),
        }
    }

    pub fn chat(&self) -> Chat {
        match self {
            ChatEvent::Message { chat, .. }
            | ChatEvent::MembersJoined { chat, .. }
            | ChatEvent::MemberLeft { chat, .. } => *chat,
        }
    }

    pub fn kind_str(&self) -> &str {
        match self {
            ChatEvent::Message { .. } => "message",
            ChatEvent::MembersJoined { .. } => "members_joined",
            ChatEvent::MemberLeft { .. } => "member_left",
        }
    }
}
