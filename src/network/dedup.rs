//! Seen-message cache: the anti-storm half of flood broadcast.
//!
//! `check_and_mark` is the only entry point; the presence test and the insert happen under
//! one lock, so no two callers can both be told an id is new.

use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::num::NonZeroUsize;

enum SeenStore {
    /// every id ever seen, kept for the life of the process
    Unbounded(HashSet<String>),
    /// at most `cap` ids, least recently seen evicted first
    Bounded(LruCache<String, ()>),
}

pub struct SeenCache {
    inner: Mutex<SeenStore>,
}

impl SeenCache {
    /// Unbounded cache: never forgets an id.
    pub fn new() -> Self {
        Self { inner: Mutex::new(SeenStore::Unbounded(HashSet::new())) }
    }

    /// Bounded cache holding the `capacity` most recently seen ids.
    /// An evicted id that arrives again is treated as new.
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self { inner: Mutex::new(SeenStore::Bounded(LruCache::new(capacity))) }
    }

    /// `Some(n)` -> bounded, `None` -> unbounded. Zero is treated as unbounded.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity.and_then(NonZeroUsize::new) {
            Some(cap) => Self::bounded(cap),
            None => Self::new(),
        }
    }

    /// Returns `true` if `id` was already recorded, `false` on first sighting (and records it).
    pub fn check_and_mark(&self, id: &str) -> bool {
        let mut store = self.inner.lock();
        match &mut *store {
            SeenStore::Unbounded(set) => !set.insert(id.to_string()),
            SeenStore::Bounded(lru) => {
                if lru.get(id).is_some() {
                    true
                } else {
                    lru.put(id.to_string(), ());
                    false
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match &*self.inner.lock() {
            SeenStore::Unbounded(set) => set.len(),
            SeenStore::Bounded(lru) => lru.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenCache {
    fn default() -> Self {
        Self::new()
    }
}
