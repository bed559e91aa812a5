//! Ordered record of every live cache handed out during a run

use crate::traits::CacheHandle;
use parking_lot::Mutex;
use std::fmt;

/// Append-only list of cache handles awaiting shutdown.
///
/// There is no global instance: whoever orchestrates a run creates one,
/// shares it with the factory, and hands it to the shutdown coordinator at
/// the end. Handles are never removed.
#[derive(Default)]
pub struct CacheRegistry {
    handles: Mutex<Vec<CacheHandle>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a handle. Duplicates are kept.
    pub fn append(&self, handle: CacheHandle) {
        self.handles.lock().push(handle);
    }

    /// Current handles in the order they were appended
    pub fn snapshot(&self) -> Vec<CacheHandle> {
        self.handles.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

impl fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("len", &self.len())
            .finish()
    }
}
