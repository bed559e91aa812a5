//! Error handling for the cache system
//!
//! Every error carries a recovery hint so callers (and logs) can say what to
//! do next, not just what went wrong.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
