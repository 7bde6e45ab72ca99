//! Error types for the linkmap library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`LinkedMap::check_invariants`).
//! - [`TypeMismatchError`]: Returned by the runtime-typed map and cache when a
//!   key's concrete type disagrees with the type recorded by the first insert.
//!
//! Both kinds signal programming errors, not recoverable data states: callers
//! are expected to abort the current operation and fix the call site.
//!
//! ## Example Usage
//!
//! ```
//! use linkmap::map::AnyLinkedMap;
//!
//! let mut map = AnyLinkedMap::new();
//! map.set(1_i64, "one", false).unwrap();
//!
//! // A second key type is rejected without mutating the map.
//! let err = map.set("two", 2, false).unwrap_err();
//! assert_eq!(err.expected(), "i64");
//! assert_eq!(map.len(), 1);
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal map invariants are violated.
///
/// Produced by [`LinkedMap::check_invariants`](crate::map::LinkedMap::check_invariants).
/// Carries a human-readable description of which invariant failed. An
/// invariant violation means the map's own maintenance is buggy; it is never
/// caused by valid external input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// TypeMismatchError
// ---------------------------------------------------------------------------

/// Error returned when a key's runtime type disagrees with the recorded one.
///
/// An [`AnyLinkedMap`](crate::map::AnyLinkedMap) fixes its key type on the
/// first insert and holds it for the instance's whole lifetime, even after
/// the map empties. Every later `set`/`get`/`remove` with a different key
/// type produces this error and leaves the map untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatchError {
    expected: &'static str,
    found: &'static str,
}

impl TypeMismatchError {
    /// Creates a new `TypeMismatchError` from the two type names.
    #[inline]
    pub fn new(expected: &'static str, found: &'static str) -> Self {
        Self { expected, found }
    }

    /// Name of the type recorded by the first insert.
    #[inline]
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    /// Name of the offending key's type.
    #[inline]
    pub fn found(&self) -> &'static str {
        self.found
    }
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incompatible key types: map key={}, incoming={}",
            self.expected, self.found
        )
    }
}

impl std::error::Error for TypeMismatchError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("list/index length mismatch");
        assert_eq!(err.to_string(), "list/index length mismatch");
    }

    #[test]
    fn invariant_message_accessor() {
        let err = InvariantError::new("dangling head");
        assert_eq!(err.message(), "dangling head");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn invariant_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }

    // -- TypeMismatchError ------------------------------------------------

    #[test]
    fn mismatch_display_names_both_types() {
        let err = TypeMismatchError::new("i64", "&str");
        assert_eq!(
            err.to_string(),
            "incompatible key types: map key=i64, incoming=&str"
        );
    }

    #[test]
    fn mismatch_accessors() {
        let err = TypeMismatchError::new("u32", "String");
        assert_eq!(err.expected(), "u32");
        assert_eq!(err.found(), "String");
    }

    #[test]
    fn mismatch_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<TypeMismatchError>();
    }
}
