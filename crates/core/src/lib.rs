//! Core domain types, errors, and lifecycle events for `stash`.
//!
//! Everything the other crates agree on lives here so that the cache, config
//! and CLI crates can talk to each other without depending on one another.
//!
//! ## Key Components
//!
//! - **`errors`**: the workspace-wide `Error` enum and `Result` alias.
//! - **`events`**: the `EventBus` used as a fire-and-forget lifecycle notifier,
//!   plus the event payloads published on it.
//! - **`keys`**: `RuleKey`, the validated digest that addresses an artifact.
//! - **`constants`**: environment variable names and shared defaults.

pub mod constants;
pub mod errors;
pub mod events;
pub mod keys;

pub use self::{
    constants::*,
    errors::{Error, Result},
    events::{CacheEvent, CommandEvent, EnhancedEvent, EventBus, FetchOutcome, SystemEvent},
    keys::RuleKey,
};
