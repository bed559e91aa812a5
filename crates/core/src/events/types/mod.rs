//! Event type definitions

mod cache;
mod command;
mod system;

pub use cache::{CacheEvent, FetchOutcome};
pub use command::CommandEvent;
pub use system::SystemEvent;
