//! linkmap: insertion-ordered maps and an LRU cache built on them.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod ds;
pub mod error;
pub mod map;
pub mod policy;

pub mod prelude;
