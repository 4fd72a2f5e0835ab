//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod mention;
pub mod event;
pub mod owner;
pub mod command;

pub use user::{User, UserId};
pub use mention::Mention;
pub use event::{Chat, ChatEvent, ChatId, ChatKind};
pub use owner::Owner;
pub use command::{Command, CommandRegistry, Trigger};
