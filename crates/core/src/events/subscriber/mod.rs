//! Enhanced events as seen by subscribers

use crate::events::types::SystemEvent;
use std::collections::HashMap;
use std::time::SystemTime;

/// Enhanced event with metadata and correlation tracking
#[derive(Debug, Clone)]
pub struct EnhancedEvent {
    /// The actual event
    pub event: SystemEvent,
    /// Timestamp when the event occurred
    pub timestamp: SystemTime,
    /// Optional correlation ID for tracing related events
    pub correlation_id: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
}

impl EnhancedEvent {
    /// Returns the wrapped cache event, if this is one
    pub fn as_cache_event(&self) -> Option<&crate::events::CacheEvent> {
        match &self.event {
            SystemEvent::Cache(event) => Some(event),
            _ => None,
        }
    }
}
