//! Consensus-side rules for powchain blocks.
//!
//! Two concerns live here:
//! - the checkpoint table: hard-coded trust anchors mapping block heights
//!   to known-good hashes, used to fast-reject forged history
//! - the validation rules a block must pass before the chain accepts it
//!   (structure, proof-of-work, parent linkage, cryptographic checks)

pub mod checkpoint;
pub mod validator;

// Re-export commonly used types
pub use checkpoint::{CheckpointError, CheckpointSet, CheckpointVerifier};
pub use validator::{BlockValidator, ValidationError};
