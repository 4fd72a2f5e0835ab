use chrono::{DateTime, Utc};

use super::Mention;

/// Current holder of a chat's ownership token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub mention: Mention,
    pub claimed_at: DateTime<Utc>,
}

impl Owner {
    pub fn new(mention: Mention) -> Self {
        Self {
            mention,
            claimed_at: Utc::now(),
        }
    }
}
