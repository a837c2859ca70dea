//! TTL memoizer for derived data.
//!
//! Expensive computations over synced entities (streak summaries, journal
//! context assembled for text generation) are memoized by string key. An
//! entry is served until its TTL elapses; after that the caller's compute
//! closure runs again and replaces it. Invalidation is manual: callers
//! invalidate the affected key after a write. The cache is in-memory only
//! and holds its clock by injection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::clock::Clock;

/// Default TTL for derived values.
pub const DEFAULT_TTL_MINUTES: i64 = 5;

/// TTL for assembled generation context, which tolerates more staleness.
pub const CONTEXT_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
struct CachedValue<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

pub struct TtlCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CachedValue<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>) -> Self {
        Self::new(Duration::minutes(DEFAULT_TTL_MINUTES), clock)
    }

    /// Return the cached value for `key`, or run `compute` and cache its
    /// result. A compute error is returned as-is and nothing is cached, so
    /// the next call retries.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get_fresh(key) {
            return Ok(value);
        }

        let value = compute().await?;
        let mut entries = self.entries.lock();
        entries.insert(
            key.to_string(),
            CachedValue {
                value: value.clone(),
                cached_at: self.clock.now(),
            },
        );
        Ok(value)
    }

    /// Peek without computing. Expired entries read as absent.
    pub fn get_fresh(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let cached = entries.get(key)?;
        if now - cached.cached_at < self.ttl {
            Some(cached.value.clone())
        } else {
            None
        }
    }

    /// Drop one key so the next read recomputes.
    pub fn invalidate(&self, key: &str) {
        if self.entries.lock().remove(key).is_some() {
            debug!(key, "Cache entry invalidated");
        }
    }

    /// Drop every key with the given prefix. Useful after a write that
    /// touches all of a user's derived values ("stats:u1:*").
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(prefix, removed, "Cache entries invalidated by prefix");
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
