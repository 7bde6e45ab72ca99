//! Runtime-typed keys for the ordered map.
//!
//! [`AnyLinkedMap`] accepts any hashable key type but enforces one concrete
//! type per map instance: the first `set` records the key's [`TypeId`], and
//! every later operation with a different key type fails with
//! [`TypeMismatchError`]. The recorded type persists even after the map is
//! emptied. Values are [`AnyValue`] (`Arc<dyn Any + Send + Sync>`) and may be
//! heterogeneous across entries.
//!
//! ## Key Components
//!
//! | Component      | Description                                            |
//! |----------------|--------------------------------------------------------|
//! | `MapKey`       | Object-safe key trait: `Any` + dynamic eq/hash         |
//! | `KeyBox`       | `Arc<dyn MapKey>` with `Eq`/`Hash` forwarded dynamically |
//! | `AnyValue`     | `Arc<dyn Any + Send + Sync>`, heterogeneous values     |
//! | `AnyLinkedMap` | `LinkedMap<KeyBox, AnyValue>` + the recorded key type  |
//!
//! All structure maintenance (ordering, bumping, integrity checks) delegates
//! to [`LinkedMap`]; this module adds only the tagged-type check and the
//! dynamic key plumbing.
//!
//! A key type must implement `Eq + Hash` to qualify as a [`MapKey`], so an
//! unhashable key is unrepresentable here: a map key of, say, `f64` is
//! rejected at compile time rather than at insert time.
//!
//! ## Example Usage
//!
//! ```
//! use linkmap::map::AnyLinkedMap;
//!
//! let mut map = AnyLinkedMap::new();
//! map.set("id", 42_u64, false).unwrap();
//! map.set("name", "deep thought", false).unwrap();
//!
//! // Heterogeneous values, one key type.
//! let v = map.get(&"id", false).unwrap().unwrap();
//! assert_eq!(v.downcast_ref::<u64>(), Some(&42));
//!
//! // A second key type is an error, not a second key space.
//! assert!(map.set(7_i32, "seven", false).is_err());
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::TypeMismatchError;
use crate::map::{Iter, LinkedMap};

/// Type-erased value slot: heterogeneous across entries, cheap to clone.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Object-safe trait for runtime-typed map keys.
///
/// Implemented automatically for every `T: Any + Eq + Hash + Send + Sync`;
/// never implement it by hand.
pub trait MapKey: Any + Send + Sync {
    /// Equality against another dynamically typed key.
    ///
    /// Keys of different concrete types are never equal.
    fn eq_dyn(&self, other: &dyn MapKey) -> bool;

    /// Feeds this key to a hasher through the trait object.
    fn hash_dyn(&self, state: &mut dyn Hasher);

    /// Upcast used by [`eq_dyn`](Self::eq_dyn) and downcasting.
    fn as_any(&self) -> &dyn Any;

    /// The key's concrete type name, for diagnostics.
    fn type_name_dyn(&self) -> &'static str;
}

impl<T> MapKey for T
where
    T: Any + Eq + Hash + Send + Sync,
{
    fn eq_dyn(&self, other: &dyn MapKey) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn hash_dyn(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name_dyn(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Shared, type-erased key with `Eq`/`Hash` forwarded to the concrete type.
#[derive(Clone)]
pub struct KeyBox(Arc<dyn MapKey>);

impl KeyBox {
    /// Boxes a concrete key.
    pub fn new<K: MapKey>(key: K) -> Self {
        Self(Arc::new(key))
    }

    /// Borrows the key as its concrete type, if it is a `K`.
    pub fn downcast_ref<K: Any>(&self) -> Option<&K> {
        self.0.as_any().downcast_ref::<K>()
    }

    /// The boxed key's concrete type name.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name_dyn()
    }
}

impl PartialEq for KeyBox {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

impl Eq for KeyBox {}

impl Hash for KeyBox {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_dyn(state);
    }
}

impl fmt::Debug for KeyBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyBox").field(&self.type_name()).finish()
    }
}

#[derive(Debug, Clone, Copy)]
struct RecordedType {
    id: TypeId,
    name: &'static str,
}

/// Insertion-ordered map with runtime-typed keys and heterogeneous values.
///
/// The concrete key type is fixed by the first [`set`](Self::set) and
/// enforced on every later operation; it is retained for the lifetime of the
/// map, even across emptying. Like [`LinkedMap`], this type is not safe for
/// concurrent use.
pub struct AnyLinkedMap {
    inner: LinkedMap<KeyBox, AnyValue>,
    key_type: Option<RecordedType>,
}

impl AnyLinkedMap {
    /// Creates an empty map with no recorded key type.
    pub fn new() -> Self {
        Self {
            inner: LinkedMap::new(),
            key_type: None,
        }
    }

    /// The recorded key type, or `None` if no key was ever inserted.
    pub fn key_type(&self) -> Option<TypeId> {
        self.key_type.map(|rt| rt.id)
    }

    /// Name of the recorded key type, for diagnostics.
    pub fn key_type_name(&self) -> Option<&'static str> {
        self.key_type.map(|rt| rt.name)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inserts or overwrites a key.
    ///
    /// The first call records `K` as the map's key type; later calls must use
    /// the same type or the map is left untouched and a
    /// [`TypeMismatchError`] is returned. A new key is appended at the newest
    /// end; an existing key has its value replaced and, if `bump_on_exist` is
    /// set, is moved to the newest end.
    pub fn set<K, V>(&mut self, key: K, value: V, bump_on_exist: bool) -> Result<(), TypeMismatchError>
    where
        K: MapKey,
        V: Any + Send + Sync,
    {
        match self.key_type {
            Some(rt) => {
                if rt.id != TypeId::of::<K>() {
                    return Err(TypeMismatchError::new(rt.name, type_name::<K>()));
                }
            },
            None => {
                self.key_type = Some(RecordedType {
                    id: TypeId::of::<K>(),
                    name: type_name::<K>(),
                });
            },
        }

        let key = KeyBox::new(key);
        let value: AnyValue = Arc::new(value);
        if bump_on_exist {
            self.inner.insert_refresh(key, value);
        } else {
            self.inner.insert(key, value);
        }
        Ok(())
    }

    /// Looks up a key; with `bump` set, a hit is moved to the newest end.
    ///
    /// Returns `Ok(None)` if no key type was ever recorded or the key is
    /// absent; errs if `K` disagrees with the recorded type.
    pub fn get<K>(&mut self, key: &K, bump: bool) -> Result<Option<AnyValue>, TypeMismatchError>
    where
        K: MapKey + Clone,
    {
        let Some(rt) = self.key_type else {
            return Ok(None);
        };
        if rt.id != TypeId::of::<K>() {
            return Err(TypeMismatchError::new(rt.name, type_name::<K>()));
        }

        let probe = KeyBox::new(key.clone());
        let value = if bump {
            self.inner.get_refresh(&probe).cloned()
        } else {
            self.inner.get(&probe).cloned()
        };
        Ok(value)
    }

    /// Removes a key from both the index and the list.
    ///
    /// Returns whether the key was present; errs on a key-type mismatch.
    pub fn remove<K>(&mut self, key: &K) -> Result<bool, TypeMismatchError>
    where
        K: MapKey + Clone,
    {
        let Some(rt) = self.key_type else {
            return Ok(false);
        };
        if rt.id != TypeId::of::<K>() {
            return Err(TypeMismatchError::new(rt.name, type_name::<K>()));
        }

        let probe = KeyBox::new(key.clone());
        Ok(self.inner.remove(&probe).is_some())
    }

    /// Returns the oldest entry without removing it.
    pub fn front(&self) -> Option<(&KeyBox, &AnyValue)> {
        self.inner.front()
    }

    /// Returns the newest entry without removing it.
    pub fn back(&self) -> Option<(&KeyBox, &AnyValue)> {
        self.inner.back()
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<(KeyBox, AnyValue)> {
        self.inner.pop_front()
    }

    /// Removes and returns the newest entry.
    pub fn pop_back(&mut self) -> Option<(KeyBox, AnyValue)> {
        self.inner.pop_back()
    }

    /// Visits every entry in order, oldest to newest.
    pub fn iter(&self) -> Iter<'_, KeyBox, AnyValue> {
        self.inner.iter()
    }

    /// Removes all entries. The recorded key type is retained.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Delegates to [`LinkedMap::check_invariants`].
    pub fn check_invariants(&self) -> Result<(), crate::error::InvariantError> {
        self.inner.check_invariants()
    }
}

impl Default for AnyLinkedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnyLinkedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyLinkedMap")
            .field("len", &self.len())
            .field("key_type", &self.key_type_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod recorded_type {
        use super::*;

        #[test]
        fn unset_until_first_insert() {
            let map = AnyLinkedMap::new();
            assert_eq!(map.key_type(), None);
            assert_eq!(map.key_type_name(), None);
        }

        #[test]
        fn first_set_fixes_the_key_type() {
            let mut map = AnyLinkedMap::new();
            map.set(1_i64, "one", false).unwrap();
            assert_eq!(map.key_type(), Some(TypeId::of::<i64>()));
            assert_eq!(map.key_type_name(), Some("i64"));
        }

        #[test]
        fn mismatched_set_fails_without_mutating() {
            let mut map = AnyLinkedMap::new();
            map.set(1_i64, "one", false).unwrap();

            let err = map.set("two", 2, false).unwrap_err();
            assert_eq!(err.expected(), "i64");
            assert_eq!(err.found(), "&str");
            assert_eq!(map.len(), 1);
        }

        #[test]
        fn mismatched_get_and_remove_fail() {
            let mut map = AnyLinkedMap::new();
            map.set(1_i64, "one", false).unwrap();

            assert!(map.get(&"one", false).is_err());
            assert!(map.remove(&"one").is_err());
            assert_eq!(map.len(), 1);
        }

        #[test]
        fn type_persists_after_emptying() {
            let mut map = AnyLinkedMap::new();
            map.set(1_i64, "one", false).unwrap();
            assert!(map.remove(&1_i64).unwrap());
            assert!(map.is_empty());

            // Still only i64 keys are accepted.
            assert!(map.set("k", 0, false).is_err());
            map.set(2_i64, "two", false).unwrap();
            assert_eq!(map.len(), 1);
        }

        #[test]
        fn type_persists_after_clear() {
            let mut map = AnyLinkedMap::new();
            map.set("a", 1, false).unwrap();
            map.clear();
            assert!(map.is_empty());
            assert_eq!(map.key_type(), Some(TypeId::of::<&str>()));
            assert!(map.set(1_u8, 1, false).is_err());
        }

        #[test]
        fn get_on_untyped_map_is_a_miss_for_any_key() {
            let mut map = AnyLinkedMap::new();
            assert!(map.get(&"anything", true).unwrap().is_none());
            assert!(map.get(&42_u32, false).unwrap().is_none());
            assert!(!map.remove(&42_u32).unwrap());
            // Still no type recorded.
            assert_eq!(map.key_type(), None);
        }
    }

    mod behavior {
        use super::*;

        fn keys_as<K: Any + Clone>(map: &AnyLinkedMap) -> Vec<K> {
            map.iter()
                .filter_map(|(k, _)| k.downcast_ref::<K>().cloned())
                .collect()
        }

        #[test]
        fn heterogeneous_values_round_trip() {
            let mut map = AnyLinkedMap::new();
            map.set("count", 3_u64, false).unwrap();
            map.set("label", String::from("blue"), false).unwrap();

            let count = map.get(&"count", false).unwrap().unwrap();
            assert_eq!(count.downcast_ref::<u64>(), Some(&3));

            let label = map.get(&"label", false).unwrap().unwrap();
            assert_eq!(label.downcast_ref::<String>().map(String::as_str), Some("blue"));
        }

        #[test]
        fn set_overwrite_and_bump_semantics() {
            let mut map = AnyLinkedMap::new();
            map.set("a", 1, false).unwrap();
            map.set("b", 2, false).unwrap();
            map.set("c", 3, false).unwrap();

            // Overwrite in place keeps order.
            map.set("b", 20, false).unwrap();
            assert_eq!(keys_as::<&str>(&map), ["a", "b", "c"]);

            // Overwrite with bump moves to the newest end.
            map.set("b", 200, true).unwrap();
            assert_eq!(keys_as::<&str>(&map), ["a", "c", "b"]);
            assert_eq!(map.len(), 3);
        }

        #[test]
        fn get_with_bump_reorders() {
            let mut map = AnyLinkedMap::new();
            map.set("a", 1, false).unwrap();
            map.set("b", 2, false).unwrap();

            map.get(&"a", true).unwrap();
            assert_eq!(keys_as::<&str>(&map), ["b", "a"]);

            map.get(&"b", false).unwrap();
            assert_eq!(keys_as::<&str>(&map), ["b", "a"]);
        }

        #[test]
        fn front_back_and_pops() {
            let mut map = AnyLinkedMap::new();
            map.set(1_u32, "one", false).unwrap();
            map.set(2_u32, "two", false).unwrap();

            assert_eq!(map.front().unwrap().0.downcast_ref::<u32>(), Some(&1));
            assert_eq!(map.back().unwrap().0.downcast_ref::<u32>(), Some(&2));

            let (k, v) = map.pop_front().unwrap();
            assert_eq!(k.downcast_ref::<u32>(), Some(&1));
            assert_eq!(v.downcast_ref::<&str>(), Some(&"one"));
            assert_eq!(map.len(), 1);

            map.check_invariants().unwrap();
        }

        #[test]
        fn equal_keys_of_different_types_never_collide() {
            // Same bit pattern, different concrete types.
            let a = KeyBox::new(1_u32);
            let b = KeyBox::new(1_u64);
            assert_ne!(a, b);
            assert_eq!(a, KeyBox::new(1_u32));
        }

        #[test]
        fn keybox_downcast_and_name() {
            let k = KeyBox::new(String::from("x"));
            assert_eq!(k.downcast_ref::<String>().map(String::as_str), Some("x"));
            assert_eq!(k.downcast_ref::<i32>(), None);
            assert!(k.type_name().contains("String"));
        }
    }
}
