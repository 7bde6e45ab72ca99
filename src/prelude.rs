pub use crate::ds::{SlotArena, SlotId};
pub use crate::error::{InvariantError, TypeMismatchError};
pub use crate::map::{AnyLinkedMap, AnyValue, KeyBox, LinkedMap, MapKey};
pub use crate::policy::lru::{AnyLruCache, LruCache, DEFAULT_CACHE_MAX};
