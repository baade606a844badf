//! In-memory TTL cache for provider responses.
//!
//! Entries expire lazily: an expired entry is evicted by the `get` that
//! notices it. There is no background sweep and no size bound.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};

/// How long a cached response stays valid
pub const CACHE_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Key/value cache with a fixed time-to-live.
///
/// Keys are plain strings; callers sharing one instance are expected to
/// namespace them (e.g. `weather-{lat}-{lon}` vs `air-{lat}-{lon}`).
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::minutes(CACHE_TTL_MINUTES),
            clock,
        }
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Fetch a live entry. An expired entry is removed and `None` returned.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;

        if self.clock.now() - entry.stored_at > self.ttl {
            tracing::debug!("Cache entry expired: {}", key);
            entries.remove(key);
            return None;
        }

        Some(entry.value.clone())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.lock().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
