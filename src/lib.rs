//! Group-chat bot that mentions every member of a chat on command.
//!
//! Layout follows a layered design: `domain` holds entities and the
//! platform/storage seams, `application` the roster, fanout and novelty
//! services, `infrastructure` the configuration, storage and adapters.

pub mod domain;
pub mod application;
pub mod infrastructure;
