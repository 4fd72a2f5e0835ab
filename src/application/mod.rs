//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Roster resolution, mention fanout, the ownership game
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing and event dispatching

pub mod errors;
pub mod services;
pub mod messaging;
