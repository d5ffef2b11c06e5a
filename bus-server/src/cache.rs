//! Generic TTL result cache.
//!
//! One string-keyed expiring cache shared by several callers, each composing
//! its own key namespace ("route_…", "stop_…", a route id). Staleness is
//! checked at read time only; nothing sweeps in the background, so memory is
//! bounded by the number of distinct keys queried rather than by uptime.

use std::time::Duration;

use moka::sync::Cache as MokaCache;

/// Default entry lifetime: thirty minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Cap on distinct keys, far above anything the query surface produces.
const MAX_CAPACITY: u64 = 10_000;

/// String-keyed cache whose entries expire a fixed duration after insertion.
pub struct TtlCache<V> {
    inner: MokaCache<String, V>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries live for `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        let inner = MokaCache::builder()
            .time_to_live(ttl)
            .max_capacity(MAX_CAPACITY)
            .build();
        TtlCache { inner }
    }

    /// The cached value for `key`, if one was inserted within the TTL window.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key)
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.inner.insert(key.into(), value);
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
