//! Lifecycle events for inter-crate communication
//!
//! Crates publish events on an [`EventBus`] without depending on whoever
//! listens. Publishing is fire-and-forget: it never blocks and never fails the
//! publisher, which is what lets the cache factory and the cache decorator
//! report on every operation without changing the operation's outcome.

pub mod emitter;
pub mod subscriber;
pub mod types;

pub use emitter::EventBus;
pub use subscriber::EnhancedEvent;
pub use types::{CacheEvent, CommandEvent, FetchOutcome, SystemEvent};
