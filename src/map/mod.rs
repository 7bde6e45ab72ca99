//! # Insertion-ordered map
//!
//! This module provides [`LinkedMap`], a hash map that also maintains a
//! doubly linked traversal order, and [`AnyLinkedMap`], a runtime-typed
//! variant that accepts any hashable key type but enforces a single recorded
//! type per instance.
//!
//! ## Architecture
//!
//! ```text
//!   index (FxHashMap<K, SlotId>)        arena (SlotArena<Entry<K, V>>)
//!   ┌─────────┬──────────┐              ┌────────┬───────────────────────────────────┐
//!   │   Key   │  SlotId  │              │ SlotId │ Entry { key, value, prev, next }  │
//!   ├─────────┼──────────┤              ├────────┼───────────────────────────────────┤
//!   │  "a"    │  id_1 ───┼────────────► │ id_1   │ { "a", 1, prev: None, next: id_2 }│
//!   │  "b"    │  id_2 ───┼────────────► │ id_2   │ { "b", 2, prev: id_1, next: id_3 }│
//!   │  "c"    │  id_3 ───┼────────────► │ id_3   │ { "c", 3, prev: id_2, next: None }│
//!   └─────────┴──────────┘              └────────┴───────────────────────────────────┘
//!
//!   head ──► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── tail
//!          (oldest)                 (newest)
//! ```
//!
//! Entries live in a [`SlotArena`] and link to their neighbors by `SlotId`.
//! Links are bounds-checked indices rather than pointers, so dangling
//! references are impossible and a structural cycle can only come from a bug
//! in this module's own relinking, never from caller input.
//!
//! ## Key Components
//!
//! | Component        | Description                                          |
//! |------------------|------------------------------------------------------|
//! | `LinkedMap<K, V>`| Hash index + recency list, single key type `K`       |
//! | `Entry<K, V>`    | Arena node: key, value, prev/next `SlotId` links     |
//! | `Iter` / `Keys` / `Values` | Ordered iterators, oldest to newest        |
//! | `AnyLinkedMap`   | Type-erased keys with a recorded runtime key type    |
//!
//! ## Ordering Rules
//!
//! - A new key is appended at the tail (newest end).
//! - [`insert`](LinkedMap::insert) on an existing key overwrites the value
//!   in place and leaves the order untouched.
//! - [`insert_refresh`](LinkedMap::insert_refresh),
//!   [`get_refresh`](LinkedMap::get_refresh) and [`touch`](LinkedMap::touch)
//!   additionally move the entry to the tail, as if it were removed and
//!   re-added. No other entry's relative order changes.
//!
//! ## Mutation During Iteration
//!
//! Iterators borrow the map shared (`&self`) while every structural mutation
//! requires `&mut self`, so mutating the map mid-iteration is rejected at
//! compile time rather than detected at runtime.
//!
//! ## Integrity Checking
//!
//! Traversal carries a tortoise/hare pointer pair: the iterator's fast
//! pointer advances two links per visited entry and a meeting of the
//! pointers panics instead of looping forever. The standalone
//! diagnostics are [`has_cycle`](LinkedMap::has_cycle) and
//! [`check_invariants`](LinkedMap::check_invariants).
//!
//! ## Thread Safety
//!
//! `LinkedMap` is **not** thread-safe and relies on its owner for exclusion.
//! The thread-safe surface of this crate is [`LruCache`](crate::policy::lru::LruCache),
//! which guards one `LinkedMap` with a mutex.

pub mod any;

pub use any::{AnyLinkedMap, AnyValue, KeyBox, MapKey};

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Hash map that preserves insertion order and supports O(1) recency bumps.
///
/// The key is stored both in the index and in its list entry, so `K` must be
/// `Clone` (keys are expected to be cheap: integers, short strings, ids).
///
/// # Example
///
/// ```
/// use linkmap::map::LinkedMap;
///
/// let mut map = LinkedMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
/// map.insert("c", 3);
///
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, ["a", "b", "c"]);
///
/// // Overwriting with a bump moves the key to the newest end.
/// map.insert_refresh("b", 20);
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, ["a", "c", "b"]);
/// ```
pub struct LinkedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    index: FxHashMap<K, SlotId>,
    arena: SlotArena<Entry<K, V>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<K, V> LinkedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty map.
    #[inline]
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty map with reserved capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of live entries. O(1).
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is present. Never affects order.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Looks up `key` without affecting its position in the order.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.arena.get(id).map(|entry| &entry.value)
    }

    /// Mutable lookup without affecting the order.
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = *self.index.get(key)?;
        self.arena.get_mut(id).map(|entry| &mut entry.value)
    }

    /// Looks up `key` and, if found, moves it to the tail (newest end).
    ///
    /// The move is an atomic detach-then-append; the relative order of all
    /// other entries is unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use linkmap::map::LinkedMap;
    ///
    /// let mut map = LinkedMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// assert_eq!(map.get_refresh(&1), Some(&"one"));
    /// assert_eq!(map.back(), Some((&1, &"one")));
    /// ```
    pub fn get_refresh(&mut self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.detach(id);
        self.attach_back(id);
        self.arena.get(id).map(|entry| &entry.value)
    }

    /// Moves `key` to the tail without returning its value.
    ///
    /// Returns `true` if the key was present.
    pub fn touch(&mut self, key: &K) -> bool {
        if let Some(&id) = self.index.get(key) {
            self.detach(id);
            self.attach_back(id);
            true
        } else {
            false
        }
    }

    /// Inserts or overwrites `key` without reordering an existing entry.
    ///
    /// A new key is appended at the tail; an existing key keeps its position
    /// and only its value is replaced. Returns the previous value, if any.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_inner(key, value, false)
    }

    /// Inserts or overwrites `key`, bumping an existing entry to the tail.
    ///
    /// Behaves like [`insert`](Self::insert) for new keys; an existing key is
    /// additionally moved to the newest end.
    ///
    /// # Example
    ///
    /// ```
    /// use linkmap::map::LinkedMap;
    ///
    /// let mut map = LinkedMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    ///
    /// assert_eq!(map.insert_refresh("a", 10), Some(1));
    /// let keys: Vec<_> = map.keys().copied().collect();
    /// assert_eq!(keys, ["b", "a"]);
    /// ```
    #[inline]
    pub fn insert_refresh(&mut self, key: K, value: V) -> Option<V> {
        self.insert_inner(key, value, true)
    }

    fn insert_inner(&mut self, key: K, value: V, bump_on_exist: bool) -> Option<V> {
        if let Some(&id) = self.index.get(&key) {
            let previous = match self.arena.get_mut(id) {
                Some(entry) => std::mem::replace(&mut entry.value, value),
                None => unreachable!("index points at a vacant slot"),
            };
            if bump_on_exist {
                self.detach(id);
                self.attach_back(id);
            }
            return Some(previous);
        }

        let id = self.arena.insert(Entry {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.index.insert(key, id);
        self.attach_back(id);
        None
    }

    /// Removes `key` from both the index and the list.
    ///
    /// Returns the removed value, or `None` if the key was absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.detach(id);
        self.arena.remove(id).map(|entry| entry.value)
    }

    /// Returns the oldest entry without removing it.
    #[inline]
    pub fn front(&self) -> Option<(&K, &V)> {
        let id = self.head?;
        self.arena.get(id).map(|entry| (&entry.key, &entry.value))
    }

    /// Returns the newest entry without removing it.
    #[inline]
    pub fn back(&self) -> Option<(&K, &V)> {
        let id = self.tail?;
        self.arena.get(id).map(|entry| (&entry.key, &entry.value))
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let id = self.head?;
        self.detach(id);
        let entry = self.arena.remove(id)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    /// Removes and returns the newest entry.
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let id = self.tail?;
        self.detach(id);
        let entry = self.arena.remove(id)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    /// Visits every entry in order, oldest to newest.
    ///
    /// The iterator carries the tortoise/hare cycle guard: if the list were
    /// ever corrupted into a cycle, iteration panics instead of spinning.
    ///
    /// # Example
    ///
    /// ```
    /// use linkmap::map::LinkedMap;
    ///
    /// let mut map = LinkedMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    ///
    /// let pairs: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
    /// assert_eq!(pairs, [("a", 1), ("b", 2)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            current: self.head,
            hare: self.head.and_then(|id| self.next_of(id)),
        }
    }

    /// Iterates keys in order, oldest to newest.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Iterates values in order, oldest to newest.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Removes all entries. The arena and index storage are released.
    pub fn clear(&mut self) {
        self.index.clear();
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Reports whether the linked list contains a cycle.
    ///
    /// Fast/slow pointer walk: the fast pointer advances two links per step,
    /// the slow one advances one; a meeting means a cycle. A cycle is an
    /// internal-consistency failure, never the result of valid calls.
    pub fn has_cycle(&self) -> bool {
        let mut tortoise = self.head;
        let mut hare = self.head;

        while let (Some(t), Some(h)) = (tortoise, hare) {
            let Some(h_next) = self.next_of(h) else {
                return false;
            };
            hare = self.next_of(h_next);
            tortoise = self.next_of(t);
            if tortoise.is_some() && tortoise == hare {
                return true;
            }
        }
        false
    }

    /// Verifies the map's structural invariants.
    ///
    /// Walks the list once and confirms that the traversal terminates at the
    /// tail in exactly `len()` steps, that every back-link mirrors its
    /// forward link, and that the hash index and the list agree entry for
    /// entry. Intended for tests and debugging; O(n).
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.arena.len() {
            return Err(InvariantError::new(format!(
                "index has {} entries but arena has {}",
                self.index.len(),
                self.arena.len()
            )));
        }

        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() {
                return Err(InvariantError::new("only one of head/tail is set"));
            }
            if !self.index.is_empty() {
                return Err(InvariantError::new("empty list but non-empty index"));
            }
            return Ok(());
        }

        let mut steps = 0usize;
        let mut prev: Option<SlotId> = None;
        let mut current = self.head;

        while let Some(id) = current {
            steps += 1;
            if steps > self.len() {
                return Err(InvariantError::new(
                    "cycle: traversal exceeded the number of live entries",
                ));
            }

            let entry = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new("list references a vacant slot"))?;
            if entry.prev != prev {
                return Err(InvariantError::new("back-link does not mirror forward link"));
            }
            if self.index.get(&entry.key) != Some(&id) {
                return Err(InvariantError::new("index disagrees with list entry"));
            }

            prev = Some(id);
            current = entry.next;
        }

        if prev != self.tail {
            return Err(InvariantError::new("traversal did not terminate at tail"));
        }
        if steps != self.len() {
            return Err(InvariantError::new(format!(
                "traversed {} entries, len is {}",
                steps,
                self.len()
            )));
        }
        Ok(())
    }

    #[inline]
    fn next_of(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|entry| entry.next)
    }

    /// Unlink an entry from the list without touching the index or arena.
    fn detach(&mut self, id: SlotId) {
        let (prev, next) = match self.arena.get(id) {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(entry) = self.arena.get_mut(p) {
                    entry.next = next;
                }
            },
            None => self.head = next,
        }

        match next {
            Some(n) => {
                if let Some(entry) = self.arena.get_mut(n) {
                    entry.prev = prev;
                }
            },
            None => self.tail = prev,
        }

        if let Some(entry) = self.arena.get_mut(id) {
            entry.prev = None;
            entry.next = None;
        }
    }

    /// Link a detached entry at the tail (newest position).
    fn attach_back(&mut self, id: SlotId) {
        let old_tail = self.tail;
        if Some(id) == old_tail {
            return;
        }
        match self.arena.get_mut(id) {
            Some(entry) => {
                entry.prev = old_tail;
                entry.next = None;
            },
            None => return,
        }
        match old_tail {
            Some(t) => {
                if let Some(entry) = self.arena.get_mut(t) {
                    entry.next = Some(id);
                }
            },
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }
}

impl<K, V> Default for LinkedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for LinkedMap<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Extend<(K, V)> for LinkedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for LinkedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a LinkedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ordered iterator over `(&K, &V)`, oldest to newest.
///
/// # Panics
///
/// Panics if the list structure contains a cycle. This is a fatal integrity
/// failure of the map itself, detected by a fast/slow pointer pair so the
/// panic fires within one full walk instead of looping forever.
pub struct Iter<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    map: &'a LinkedMap<K, V>,
    current: Option<SlotId>,
    hare: Option<SlotId>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        if self.hare == Some(id) {
            // Bug in the map's own relinking, not in the caller.
            panic!("cycle detected in linked map, iteration would not terminate");
        }

        let entry = self.map.arena.get(id)?;
        self.current = entry.next;
        self.hare = self
            .hare
            .and_then(|h| self.map.next_of(h))
            .and_then(|h| self.map.next_of(h));
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.map.len()))
    }
}

/// Ordered iterator over keys, oldest to newest.
pub struct Keys<'a, K, V>(Iter<'a, K, V>)
where
    K: Eq + Hash + Clone;

impl<'a, K, V> Iterator for Keys<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

/// Ordered iterator over values, oldest to newest.
pub struct Values<'a, K, V>(Iter<'a, K, V>)
where
    K: Eq + Hash + Clone;

impl<'a, K, V> Iterator for Values<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
