//! Persistent storage for powchain.
//!
//! A thin sled wrapper with JSON payloads plus a block store:
//! - `Storage`: the embedded key-value database, serialization helpers,
//!   prefixed key construction
//! - `BlockStore`: blocks indexed by hash (primary, immutable) and by
//!   height (pointer), with chain head tracking and genesis init
//!
//! Failures surface unchanged to the caller; there is no internal retry.

pub mod blocks;
pub mod db;

// Re-export commonly used types
pub use blocks::BlockStore;
pub use db::{Result, Storage, StorageError};
