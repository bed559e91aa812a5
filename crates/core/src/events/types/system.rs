//! Main system event enum

use super::{CacheEvent, CommandEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main event enum that encompasses all event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemEvent {
    Cache(CacheEvent),
    Command(CommandEvent),
}

impl From<CacheEvent> for SystemEvent {
    fn from(event: CacheEvent) -> Self {
        SystemEvent::Cache(event)
    }
}

impl From<CommandEvent> for SystemEvent {
    fn from(event: CommandEvent) -> Self {
        SystemEvent::Command(event)
    }
}

impl fmt::Display for SystemEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemEvent::Cache(event) => fmt::Display::fmt(event, f),
            SystemEvent::Command(event) => fmt::Display::fmt(event, f),
        }
    }
}
