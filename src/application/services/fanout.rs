//! Mention fanout - turns a roster snapshot into deliverable message batches

use std::collections::HashSet;

use crate::domain::entities::{Mention, UserId};

/// Default number of mentions per message
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Telegram's message length ceiling
pub const DEFAULT_MAX_CHARS: usize = 4096;

/// Bounds for a single outbound batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_mentions: usize,
    pub max_chars: usize,
}

impl BatchLimits {
    pub fn new(max_mentions: usize, max_chars: usize) -> Self {
        Self {
            max_mentions: max_mentions.max(1),
            max_chars: max_chars.max(1),
        }
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self::new(batch_size, DEFAULT_MAX_CHARS)
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, DEFAULT_MAX_CHARS)
    }
}

/// Build the ordered batches for a fanout.
///
/// Drops `exclude`, keeps the first mention per user id and splits the rest
/// into contiguous batches. A batch closes when it holds `max_mentions`
/// entries or when the next mention would push its rendered text past
/// `max_chars`. No eligible mentions means no batches.
pub fn build_batches(
    mentions: &[(UserId, Mention)],
    exclude: Option<UserId>,
    limits: BatchLimits,
) -> Vec<Vec<Mention>> {
    let mut seen = HashSet::new();
    let mut batches: Vec<Vec<Mention>> = Vec::new();
    let mut current: Vec<Mention> = Vec::new();
    let mut current_chars = 0;

    for (user_id, mention) in mentions {
        if Some(*user_id) == exclude || !seen.insert(*user_id) {
            continue;
        }

        let added = if current.is_empty() { mention.utf16_len() } else { mention.utf16_len() + 1 };
        if !current.is_empty()
            && (current.len() >= limits.max_mentions || current_chars + added > limits.max_chars)
        {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        current_chars += if current.is_empty() { mention.utf16_len() } else { mention.utf16_len() + 1 };
        current.push(mention.clone());
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Text of one outbound message
pub fn render_batch(batch: &[Mention]) -> String {
    batch.iter().map(Mention::as_str).collect::<Vec<_>>().join(" ")
}
