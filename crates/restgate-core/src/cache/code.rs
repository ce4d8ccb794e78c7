//! Code-plane cache: compiled per-table handler bundles.
//!
//! The only process-local mutable state in the gateway. Readers vastly
//! outnumber writers, and entries are replaced wholesale (a reader sees
//! either the old bundle or the new one, never a partially built one), so
//! a sharded concurrent map with `Arc` values fits.

use std::sync::Arc;

use dashmap::DashMap;

/// Process-local map of table name to compiled bundle.
///
/// Generic over the bundle type so the engine crate does not depend on
/// the HTTP layer that defines it.
#[derive(Debug)]
pub struct CodePlane<B> {
    entries: DashMap<String, Arc<B>>,
}

impl<B> CodePlane<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fetch a table's bundle.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<Arc<B>> {
        self.entries.get(table).map(|entry| Arc::clone(entry.value()))
    }

    /// Insert or replace a table's bundle atomically.
    pub fn insert(&self, table: impl Into<String>, bundle: Arc<B>) {
        self.entries.insert(table.into(), bundle);
    }

    /// Purge a table's bundle. Purging an absent table is a no-op.
    pub fn remove(&self, table: &str) {
        self.entries.remove(table);
    }

    /// Number of cached bundles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B> Default for CodePlane<B> {
    fn default() -> Self {
        Self::new()
    }
}
