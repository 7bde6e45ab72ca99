//! # Least Recently Used (LRU) cache
//!
//! A bounded cache layered on [`LinkedMap`]: the map's oldest end is the
//! eviction candidate and any touch bumps an entry to the newest end.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                     LruCache<K, V>                       │
//!   │                                                          │
//!   │   ┌────────────────────────────────────────────────────┐ │
//!   │   │        parking_lot::Mutex<LinkedMap<K, Arc<V>>>    │ │
//!   │   └────────────────────────────────────────────────────┘ │
//!   │                                                          │
//!   │   head ──► [oldest] ◄──► ... ◄──► [newest] ◄── tail      │
//!   │            (evict)                 (bump)                │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! | Component        | Description                                       |
//! |------------------|---------------------------------------------------|
//! | `LruCache<K, V>` | Thread-safe cache over a typed `LinkedMap`        |
//! | `AnyLruCache`    | Same policy over `AnyLinkedMap` (runtime-typed)   |
//! | `DEFAULT_CACHE_MAX` | Capacity used when `new(0)` is requested       |
//!
//! ## Operations Flow
//!
//! ```text
//!   add(k, v), cache full, k absent:
//!     1. pop_front() evicts the oldest entry  → returns evicted = true
//!     2. insert_refresh(k, v) appends k at the newest end
//!
//!   get(k):  lookup + bump to newest end (a hit always refreshes recency)
//!   peek(k): lookup only, order untouched
//! ```
//!
//! Eviction consults the pre-insert count and removes at most one entry per
//! `add` call; [`trim`](LruCache::trim) is the multi-eviction loop.
//!
//! ## Concurrency Model
//!
//! One `parking_lot::Mutex` covers the whole public surface; each operation
//! locks, works against the underlying map, and unlocks before returning on
//! every exit path, including error returns from the runtime-typed variant.
//! The lock is never held across a callback into caller code: external
//! iteration goes through the [`keys`](LruCache::keys) snapshot instead of
//! the map's iterator.
//!
//! Values are stored as `Arc<V>` and handed out by clone, so hits can be used
//! after the lock is released and survive a later eviction.
//!
//! ## Example Usage
//!
//! ```
//! use linkmap::policy::lru::LruCache;
//!
//! let cache: LruCache<&str, i32> = LruCache::new(2);
//! assert!(!cache.add("a", 1));
//! assert!(!cache.add("b", 2));
//!
//! // Touching "a" protects it from the next eviction.
//! cache.get(&"a");
//! assert!(cache.add("c", 3)); // evicts "b"
//!
//! assert_eq!(cache.keys(), ["a", "c"]);
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TypeMismatchError;
use crate::map::{AnyLinkedMap, AnyValue, LinkedMap, MapKey};

/// Capacity used when a cache is created with `max == 0`.
pub const DEFAULT_CACHE_MAX: usize = 100;

/// Thread-safe LRU cache with a single key type fixed at compile time.
///
/// The lock and the map live in one struct, so they cannot be separated or
/// duplicated independently; share the cache itself behind an `Arc` when
/// multiple owners are needed.
pub struct LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    map: Mutex<LinkedMap<K, Arc<V>>>,
    max: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `max` entries.
    ///
    /// `max == 0` is coerced to [`DEFAULT_CACHE_MAX`].
    pub fn new(max: usize) -> Self {
        let max = if max == 0 { DEFAULT_CACHE_MAX } else { max };
        Self {
            map: Mutex::new(LinkedMap::new()),
            max,
        }
    }

    /// Adds a key-value pair, evicting the oldest entry if the cache is full.
    ///
    /// Returns `true` exactly when a pre-existing distinct entry was removed
    /// to make room. The added (or updated) entry always becomes the newest.
    ///
    /// # Example
    ///
    /// ```
    /// use linkmap::policy::lru::LruCache;
    ///
    /// let cache: LruCache<u32, &str> = LruCache::new(1);
    /// assert!(!cache.add(1, "one"));
    /// assert!(cache.add(2, "two"));      // evicts key 1
    /// assert!(!cache.add(2, "again"));   // update, nothing evicted
    /// ```
    pub fn add(&self, key: K, value: V) -> bool {
        self.add_arc(key, Arc::new(value))
    }

    /// Like [`add`](Self::add) for a value that is already `Arc`-wrapped.
    pub fn add_arc(&self, key: K, value: Arc<V>) -> bool {
        let mut map = self.map.lock();

        let exists = map.contains_key(&key);
        let mut evicted = false;
        if !exists && map.len() >= self.max {
            map.pop_front();
            evicted = true;
        }

        map.insert_refresh(key, value);
        evicted
    }

    /// Reads a value; a hit always refreshes the key's recency.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.map.lock().get_refresh(key).cloned()
    }

    /// Reads a value without affecting eviction order.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.map.lock().get(key).cloned()
    }

    /// Returns `true` if `key` is cached. Order untouched.
    pub fn contains(&self, key: &K) -> bool {
        self.map.lock().contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }

    /// The configured maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Removes an entry by key and returns its value.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.map.lock().remove(key)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&self) -> Option<(K, Arc<V>)> {
        self.map.lock().pop_front()
    }

    /// Evicts oldest entries until at most `max` remain.
    ///
    /// Affects only the current occupancy; the configured capacity is
    /// unchanged.
    pub fn trim(&self, max: usize) {
        let mut map = self.map.lock();
        while map.len() > max {
            map.pop_front();
        }
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.map.lock().clear();
    }

    /// Snapshot of the keys ordered by increasing recency (oldest first).
    ///
    /// The snapshot is built under the lock and safe to use after it is
    /// released.
    ///
    /// # Example
    ///
    /// ```
    /// use linkmap::policy::lru::LruCache;
    ///
    /// let cache: LruCache<&str, i32> = LruCache::new(10);
    /// cache.add("a", 1);
    /// cache.add("b", 2);
    /// cache.get(&"a");
    ///
    /// assert_eq!(cache.keys(), ["b", "a"]);
    /// ```
    pub fn keys(&self) -> Vec<K> {
        self.map.lock().keys().cloned().collect()
    }
}

impl<K, V> Default for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache with the default capacity of [`DEFAULT_CACHE_MAX`].
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_MAX)
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Thread-safe LRU cache with a runtime-typed key, one concrete type per
/// instance.
///
/// The underlying [`AnyLinkedMap`] records the key type on the first `add`;
/// later operations with a different key type fail with
/// [`TypeMismatchError`]. Errors propagate through the lock-guarded call
/// after the guard is released, so a misuse failure never deadlocks the
/// cache.
pub struct AnyLruCache {
    map: Mutex<AnyLinkedMap>,
    max: usize,
}

impl AnyLruCache {
    /// Creates a cache holding at most `max` entries.
    ///
    /// `max == 0` is coerced to [`DEFAULT_CACHE_MAX`].
    pub fn new(max: usize) -> Self {
        let max = if max == 0 { DEFAULT_CACHE_MAX } else { max };
        Self {
            map: Mutex::new(AnyLinkedMap::new()),
            max,
        }
    }

    /// Adds a key-value pair, evicting the oldest entry if the cache is full.
    ///
    /// Returns `Ok(true)` exactly when a pre-existing distinct entry was
    /// evicted. The type check runs before any eviction, so a mismatched key
    /// leaves the cache contents untouched.
    pub fn add<K, V>(&self, key: K, value: V) -> Result<bool, TypeMismatchError>
    where
        K: MapKey + Clone,
        V: Any + Send + Sync,
    {
        let mut map = self.map.lock();

        let exists = map.get(&key, false)?.is_some();
        let mut evicted = false;
        if !exists && map.len() >= self.max {
            map.pop_front();
            evicted = true;
        }

        map.set(key, value, true)?;
        Ok(evicted)
    }

    /// Reads a value; a hit always refreshes the key's recency.
    pub fn get<K>(&self, key: &K) -> Result<Option<AnyValue>, TypeMismatchError>
    where
        K: MapKey + Clone,
    {
        self.map.lock().get(key, true)
    }

    /// Reads a value without affecting eviction order.
    pub fn peek<K>(&self, key: &K) -> Result<Option<AnyValue>, TypeMismatchError>
    where
        K: MapKey + Clone,
    {
        self.map.lock().get(key, false)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }

    /// The configured maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Evicts oldest entries until at most `max` remain.
    pub fn trim(&self, max: usize) {
        let mut map = self.map.lock();
        while map.len() > max {
            map.pop_front();
        }
    }

    /// Snapshot of the keys ordered by increasing recency, downcast to `K`.
    ///
    /// Returns an empty vector when the cache never recorded a key type; errs
    /// when `K` disagrees with the recorded type.
    pub fn keys<K>(&self) -> Result<Vec<K>, TypeMismatchError>
    where
        K: MapKey + Clone,
    {
        let map = self.map.lock();
        match map.key_type() {
            None => Ok(Vec::new()),
            Some(id) if id == TypeId::of::<K>() => Ok(map
                .iter()
                .filter_map(|(k, _)| k.downcast_ref::<K>().cloned())
                .collect()),
            Some(_) => Err(TypeMismatchError::new(
                map.key_type_name().unwrap_or("<unset>"),
                type_name::<K>(),
            )),
        }
    }
}

impl fmt::Debug for AnyLruCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.map.lock();
        f.debug_struct("AnyLruCache")
            .field("len", &map.len())
            .field("capacity", &self.max)
            .field("key_type", &map.key_type_name())
            .finish_non_exhaustive()
    }
}
