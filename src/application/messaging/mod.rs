//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod parser;
pub mod router;

pub use dispatcher::{DispatcherOptions, EventDispatcher};
pub use parser::MessageParser;
pub use router::ChatRouter;
