//! Chain orchestration for powchain.
//!
//! Brings the pieces together: storage-backed block persistence,
//! checkpoint-aware verification, and the `add_block` entry point that
//! accepts finalized blocks. Chain selection and fork choice are out of
//! scope; this layer only extends a single head.

pub mod blockchain;

// Re-export commonly used types
pub use blockchain::{Blockchain, BlockchainError};
