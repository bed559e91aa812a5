//! Error types for stash operations

mod builders;
mod conversions;
mod display;
mod types;

pub use types::{Error, Result};
