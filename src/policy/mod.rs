pub mod lru;

pub use lru::{AnyLruCache, LruCache, DEFAULT_CACHE_MAX};
