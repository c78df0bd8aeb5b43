//! Position memo
//!
//! Entries never expire on their own; callers invalidate keys when the
//! underlying buffer changes, or clear the whole cache when the terminal or
//! window region changes. A bounded cache additionally evicts the least
//! recently used entry.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use super::{PositionKey, ScreenPosition};

/// Statistics about cache use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Current number of entries
    pub size: usize,
    /// `None` for an unbounded cache
    pub capacity: Option<usize>,
}

struct Inner<K: Hash + Eq> {
    entries: LruCache<K, ScreenPosition>,
    bounded: bool,
    hits: u64,
    misses: u64,
}

/// Thread-safe key → position memo.
///
/// All methods take `&self`; a mutex serialises access so a pair is always
/// written and read as a unit.
pub struct PositionCache<K: Hash + Eq = PositionKey> {
    inner: Mutex<Inner<K>>,
}

impl<K: Hash + Eq> Default for PositionCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq> PositionCache<K> {
    /// Unbounded cache
    pub fn new() -> Self {
        Self::from_lru(LruCache::unbounded(), false)
    }

    /// Cache holding at most `capacity` entries (minimum 1)
    pub fn bounded(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self::from_lru(LruCache::new(capacity), true)
    }

    /// Unbounded for `None`, otherwise bounded
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        capacity.map_or_else(Self::new, Self::bounded)
    }

    fn from_lru(entries: LruCache<K, ScreenPosition>, bounded: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries,
                bounded,
                hits: 0,
                misses: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a position, replacing any previous one for `key`
    pub fn set(&self, key: impl Into<K>, row: u32, column: u32) {
        self.lock().entries.put(key.into(), ScreenPosition::new(row, column));
    }

    /// Stored position for `key`, if any
    pub fn get<Q>(&self, key: &Q) -> Option<ScreenPosition>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.lock();
        let found = inner.entries.get(key).copied();
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Lookup without touching recency or statistics
    pub fn peek<Q>(&self, key: &Q) -> Option<ScreenPosition>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().entries.peek(key).copied()
    }

    /// Remove `key`; absent keys are ignored
    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().entries.pop(key);
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            size: inner.entries.len(),
            capacity: inner.bounded.then(|| inner.entries.cap().get()),
        }
    }
}

impl<K: Hash + Eq + Clone> PositionCache<K> {
    /// Remove every entry whose key matches `stale`
    pub fn invalidate_where(&self, mut stale: impl FnMut(&K) -> bool) {
        let mut inner = self.lock();
        let doomed: Vec<K> = inner
            .entries
            .iter()
            .filter(|(key, _)| stale(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            inner.entries.pop(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Bookmark;
    use std::sync::Arc;
    use std::thread;

    fn string_cache() -> PositionCache<String> {
        PositionCache::new()
    }

    #[test]
    fn test_set_get() {
        let cache = string_cache();
        cache.set("test_key", 10, 5);
        assert_eq!(cache.get("test_key"), Some(ScreenPosition::new(10, 5)));
    }

    #[test]
    fn test_overwrite_existing_entry() {
        let cache = string_cache();
        cache.set("k", 10, 20);
        cache.set("k", 30, 40);
        assert_eq!(cache.get("k"), Some(ScreenPosition::new(30, 40)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = string_cache();
        cache.set("k", 1, 2);
        cache.clear();
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.get("never-set"), None);

        // clearing an empty cache is fine
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache = string_cache();
        cache.set("a", 1, 1);
        cache.set("b", 2, 2);
        cache.invalidate("a");
        cache.invalidate("nonexistent");

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(ScreenPosition::new(2, 2)));
    }

    #[test]
    fn test_invalidate_where() {
        let cache: PositionCache = PositionCache::new();
        cache.set(Bookmark::new(1, 0), 1, 1);
        cache.set(Bookmark::new(1, 5), 1, 6);
        cache.set(Bookmark::new(2, 5), 1, 6);

        cache.invalidate_where(|key| key.buffer == 1);

        assert_eq!(cache.len(), 1);
        assert!(cache.peek(&Bookmark::new(2, 5)).is_some());
    }

    #[test]
    fn test_bounded_evicts_least_recent() {
        let cache: PositionCache<String> = PositionCache::bounded(2);
        cache.set("a", 1, 1);
        cache.set("b", 2, 2);
        // touch "a" so "b" becomes least recent
        assert!(cache.get("a").is_some());
        cache.set("c", 3, 3);

        assert_eq!(cache.get("b"), None);
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().capacity, Some(2));
    }

    #[test]
    fn test_unbounded_has_no_capacity() {
        let cache = string_cache();
        for i in 0..1000u32 {
            cache.set(i.to_string(), i, i);
        }
        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.stats().capacity, None);
    }

    #[test]
    fn test_stats() {
        let cache = string_cache();
        cache.set("k", 1, 1);
        cache.get("k");
        cache.get("missing");
        cache.peek("k");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_concurrent_writes_keep_pairs_whole() {
        let cache = Arc::new(string_cache());
        let handles: Vec<_> = (0..8u32)
            .map(|n| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..200 {
                        cache.set("shared", n, n * 10);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let pos = cache.get("shared").unwrap();
        assert_eq!(pos.column, pos.row * 10);
    }
}
