//! Memoized next-character lookups for the route keypad.
//!
//! Every keystroke on the search keypad asks "which characters may follow
//! this prefix?". The answer only changes when the snapshot does, so results
//! are memoized per prefix in a small bounded map: once the cap is reached
//! the oldest entry is evicted first. The whole map is cleared on snapshot
//! replacement and on memory-pressure signals.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Default number of memoized prefixes.
const DEFAULT_CAPACITY: usize = 100;

struct CacheInner {
    map: HashMap<String, Arc<BTreeSet<char>>>,
    order: VecDeque<String>,
}

/// Bounded prefix → next-characters memo map.
///
/// The lock guards only map reads and the insert/evict step; computing a
/// missing value happens outside it, so two racing callers may both compute.
/// Both arrive at the same answer, and whichever inserts second wins.
pub struct NextCharCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl Default for NextCharCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NextCharCache {
    pub fn with_capacity(capacity: usize) -> Self {
        NextCharCache {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Look up the memoized answer for `prefix`, running `compute` on a miss.
    pub fn get_or_compute(
        &self,
        prefix: &str,
        compute: impl FnOnce() -> BTreeSet<char>,
    ) -> Arc<BTreeSet<char>> {
        let key = prefix.trim().to_ascii_uppercase();

        {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = inner.map.get(&key) {
                return hit.clone();
            }
        }

        let value = Arc::new(compute());

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.map.insert(key.clone(), value.clone()).is_none() {
            inner.order.push_back(key);
        }
        while inner.map.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.map.remove(&oldest);
                }
                None => break,
            }
        }
        value
    }

    /// Drop every memoized prefix.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.map.clear();
        inner.order.clear();
    }

    /// Number of memoized prefixes.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
