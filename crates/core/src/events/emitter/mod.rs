//! Event bus for publishing lifecycle events

use crate::constants::DEFAULT_EVENT_CAPACITY;
use crate::events::subscriber::EnhancedEvent;
use crate::events::types::SystemEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, trace};

const CORRELATION_ID_KEY: &str = "correlation_id";

/// Fire-and-forget event bus backed by a broadcast channel.
///
/// `publish` is synchronous and never blocks: events sent while nobody is
/// subscribed are dropped, and slow subscribers lag rather than holding up the
/// publisher. There is no global instance: whoever orchestrates a
/// run builds one and hands it to the components that need it.
pub struct EventBus {
    /// Event channel sender
    sender: broadcast::Sender<EnhancedEvent>,
    /// Metadata merged into every published event
    correlation_context: RwLock<HashMap<String, String>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            correlation_context: RwLock::new(HashMap::new()),
        }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: impl Into<SystemEvent>) {
        self.publish_with_metadata(event, HashMap::new());
    }

    /// Publish an event with custom metadata
    pub fn publish_with_metadata(
        &self,
        event: impl Into<SystemEvent>,
        metadata: HashMap<String, String>,
    ) {
        let (correlation_id, mut combined_metadata) = {
            let context = self.correlation_context.read();
            (context.get(CORRELATION_ID_KEY).cloned(), context.clone())
        };
        combined_metadata.extend(metadata);

        let enhanced_event = EnhancedEvent {
            event: event.into(),
            timestamp: SystemTime::now(),
            correlation_id,
            metadata: combined_metadata,
        };

        trace!(event = ?enhanced_event.event, "publishing event");
        if let Err(e) = self.sender.send(enhanced_event) {
            debug!("No subscribers for event: {:?}", e.0.event);
        }
    }

    /// Create a receiver for all events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EnhancedEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Tag all subsequent events with the given correlation id
    pub fn set_correlation_id(&self, id: impl Into<String>) {
        self.correlation_context
            .write()
            .insert(CORRELATION_ID_KEY.to_string(), id.into());
    }

    /// Tag all subsequent events with a fresh random correlation id and return it
    pub fn new_correlation_id(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.set_correlation_id(id.clone());
        id
    }

    /// Add a metadata entry to all subsequent events
    pub fn set_context(&self, key: impl Into<String>, value: impl Into<String>) {
        self.correlation_context
            .write()
            .insert(key.into(), value.into());
    }

    /// Clear correlation context
    pub fn clear_correlation_context(&self) {
        self.correlation_context.write().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
