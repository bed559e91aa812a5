//! Cache-related events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache lifecycle and operation events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheEvent {
    /// The factory started building a live cache
    ConnectStarted,
    /// The factory finished building and decorating a live cache
    ConnectFinished { cache: String },
    /// Building the underlying cache failed
    ConnectFailed { error: String },
    /// A fetch was issued against a cache
    FetchStarted { cache: String, key: String },
    /// A fetch completed
    FetchFinished {
        cache: String,
        key: String,
        outcome: FetchOutcome,
        duration_ms: u64,
    },
    /// A store was issued against a cache
    StoreStarted { cache: String, key: String },
    /// A store completed
    StoreFinished {
        cache: String,
        key: String,
        success: bool,
        duration_ms: u64,
    },
    /// A cache is being closed
    CloseStarted { cache: String },
    /// A cache finished closing
    CloseFinished {
        cache: String,
        success: bool,
        duration_ms: u64,
    },
}

/// Result of a fetch as reported on the event bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    Hit,
    Miss,
    Skipped,
    Error(String),
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Hit => write!(f, "hit"),
            FetchOutcome::Miss => write!(f, "miss"),
            FetchOutcome::Skipped => write!(f, "skipped"),
            FetchOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEvent::ConnectStarted => write!(f, "cache connect started"),
            CacheEvent::ConnectFinished { cache } => {
                write!(f, "cache connect finished ({cache})")
            }
            CacheEvent::ConnectFailed { error } => write!(f, "cache connect failed: {error}"),
            CacheEvent::FetchStarted { cache, key } => write!(f, "[{cache}] fetch {key}"),
            CacheEvent::FetchFinished {
                cache,
                key,
                outcome,
                duration_ms,
            } => write!(f, "[{cache}] fetch {key}: {outcome} in {duration_ms}ms"),
            CacheEvent::StoreStarted { cache, key } => write!(f, "[{cache}] store {key}"),
            CacheEvent::StoreFinished {
                cache,
                key,
                success,
                duration_ms,
            } => {
                let status = if *success { "ok" } else { "failed" };
                write!(f, "[{cache}] store {key}: {status} in {duration_ms}ms")
            }
            CacheEvent::CloseStarted { cache } => write!(f, "[{cache}] closing"),
            CacheEvent::CloseFinished {
                cache,
                success,
                duration_ms,
            } => {
                let status = if *success { "closed" } else { "close failed" };
                write!(f, "[{cache}] {status} in {duration_ms}ms")
            }
        }
    }
}
