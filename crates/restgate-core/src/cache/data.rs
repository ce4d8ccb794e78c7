//! Data-plane response cache.
//!
//! Stores rendered JSON list bodies keyed by cache URL, with a short TTL
//! honoured through `max_age`. A returned body is an immutable snapshot
//! shared by `Arc`; modifying it after reading is forbidden, which the
//! type enforces.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Result;

/// One cached response body.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Rendered JSON body.
    pub body:         Arc<String>,
    /// TTL in seconds, as `Cache-Control: max-age` on the stored response.
    pub max_age_secs: u64,
}

impl CachedResponse {
    #[must_use]
    pub fn new(body: impl Into<String>, max_age_secs: u64) -> Self {
        Self {
            body: Arc::new(body.into()),
            max_age_secs,
        }
    }
}

/// Cache counters for monitoring, exposed by the health endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DataPlaneMetrics {
    /// Lookups answered from the cache.
    pub hits:   u64,
    /// Lookups that fell through to the database.
    pub misses: u64,
    /// Current number of stored entries.
    pub size:   usize,
}

impl DataPlaneMetrics {
    /// Fraction of lookups answered from the cache.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// External response cache interface.
#[async_trait]
pub trait DataPlane: Send + Sync {
    /// Look up a cached response. `None` on miss or expiry.
    async fn match_url(&self, url: &str) -> Result<Option<CachedResponse>>;

    /// Store a response under a URL, overwriting any previous entry.
    async fn put(&self, url: &str, response: CachedResponse) -> Result<()>;

    /// Cache counters. Backends without instrumentation report zeros.
    fn metrics(&self) -> DataPlaneMetrics {
        DataPlaneMetrics::default()
    }
}

struct StoredEntry {
    response:  CachedResponse,
    stored_at: Instant,
}

/// In-process data plane with LRU eviction and TTL expiry on access.
pub struct MemoryDataPlane {
    entries: Mutex<LruCache<String, StoredEntry>>,
    hits:    AtomicU64,
    misses:  AtomicU64,
}

impl MemoryDataPlane {
    /// Create a cache holding at most `max_entries` bodies.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits:    AtomicU64::new(0),
            misses:  AtomicU64::new(0),
        }
    }

    /// Current number of live entries (expired entries may still count
    /// until their next access).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for MemoryDataPlane {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl DataPlane for MemoryDataPlane {
    async fn match_url(&self, url: &str) -> Result<Option<CachedResponse>> {
        let mut entries = self.entries.lock();
        let expired = entries.get(url).is_some_and(|entry| {
            entry.stored_at.elapsed() >= Duration::from_secs(entry.response.max_age_secs)
        });
        if expired {
            entries.pop(url);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }
        let hit = entries.get(url).map(|entry| entry.response.clone());
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(hit)
    }

    async fn put(&self, url: &str, response: CachedResponse) -> Result<()> {
        self.entries.lock().put(
            url.to_string(),
            StoredEntry {
                response,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    fn metrics(&self) -> DataPlaneMetrics {
        DataPlaneMetrics {
            hits:   self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size:   self.entries.lock().len(),
        }
    }
}
