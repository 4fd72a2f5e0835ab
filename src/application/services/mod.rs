//! Application services - Business logic orchestration

pub mod command_service;
pub mod fanout;
pub mod mention_service;
pub mod novelty_service;
pub mod roster_service;
pub mod selection;

pub use command_service::CommandService;
pub use fanout::{build_batches, render_batch, BatchLimits};
pub use mention_service::MentionService;
pub use novelty_service::NoveltyService;
pub use roster_service::{RosterService, RosterStrategy};
pub use selection::{pick_from_tokens, pick_random};
