//! Base identifiers already handled in this watch session.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;

/// Remembers which deliveries were already handled.
///
/// The unbounded variant grows for the life of the process, which is fine
/// when the watcher is restarted periodically. The bounded variant forgets
/// the oldest identifiers once full.
#[derive(Debug)]
pub enum SeenSet {
    Unbounded(HashSet<String>),
    Bounded(LruCache<String, ()>),
}

impl SeenSet {
    /// Unbounded when `capacity` is `None`.
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        match capacity {
            Some(cap) => Self::Bounded(LruCache::new(cap)),
            None => Self::Unbounded(HashSet::new()),
        }
    }

    /// Record `base`. Returns `true` if it was not seen before.
    pub fn insert(&mut self, base: &str) -> bool {
        match self {
            Self::Unbounded(set) => {
                if set.contains(base) {
                    false
                } else {
                    set.insert(base.to_string())
                }
            }
            Self::Bounded(cache) => {
                if cache.contains(base) {
                    false
                } else {
                    cache.put(base.to_string(), ());
                    true
                }
            }
        }
    }

    pub fn contains(&self, base: &str) -> bool {
        match self {
            Self::Unbounded(set) => set.contains(base),
            Self::Bounded(cache) => cache.contains(base),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Unbounded(set) => set.len(),
            Self::Bounded(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenSet {
    fn default() -> Self {
        Self::new(None)
    }
}
