//! Mentions - user references that render directly in an outbound message

use std::fmt;

use super::user::{User, UserId};

/// A formatted reference to a user.
///
/// Either `@handle` or an HTML name-link keyed by the numeric user id. Every
/// value is ready to be placed in an HTML-mode message as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mention(String);

impl Mention {
    /// Format a user into a mention, preferring the public handle.
    ///
    /// Bot accounts must be filtered out before this is called for fanout.
    pub fn for_user(user: &User) -> Self {
        match user.handle() {
            Some(handle) => Self(format!("@{}", handle)),
            None => Self::name_link(user.id, &user.full_name()),
        }
    }

    /// Clickable link to a user without a handle
    pub fn name_link(id: UserId, name: &str) -> Self {
        Self(format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            id,
            escape_html(name)
        ))
    }

    /// Wrap an already formatted mention (e.g. a handle typed by a user)
    pub fn raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in UTF-16 code units, the unit Telegram's message limit counts.
    ///
    /// Measured on the rendered markup, so it never undercounts the visible text.
    pub fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape the characters Telegram's HTML mode treats as markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}
