//! In-memory cache of the last full fetch.
//!
//! The whole record set is replaced on every fetch and is considered valid
//! for 30 seconds by default. Nothing is written to disk.

pub mod memory;

pub use memory::{Cache, DEFAULT_CACHE_TTL_SECS};
