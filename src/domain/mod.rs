//! Domain layer - Core business objects and the seams to the outside world
//!
//! This layer contains:
//! - Entities: Users, mentions, chat events, owners, commands
//! - Traits: Abstractions for infrastructure (Bot, Store)

pub mod entities;
pub mod traits;
