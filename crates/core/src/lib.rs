//! Core block-layer primitives for powchain.
//!
//! This crate provides the building blocks of the chain:
//! - Content hashing (hex-encoded Blake3 digests)
//! - Signing keys and signatures
//! - Merkle commitments over transaction sequences
//! - Cancellable proof-of-work nonce search
//! - The `Block` type: assembly, signing, mining, verification
//! - The structured block record (JSON) and block files

pub mod block;
pub mod crypto;
pub mod hash;
pub mod merkle;
pub mod pow;
pub mod record;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, BlockError, MAX_BLOCK_SIZE, MAX_TIMESTAMP_OFFSET};
pub use crypto::{CryptoError, Keypair, PublicKey, Signature};
pub use hash::{hash, hash_concat, Hash};
pub use merkle::{merkle_root, verify_merkle_root, MerkleTree};
pub use pow::{CancelToken, PowError, PowSolution};
pub use record::{BlockRecord, RecordError};
pub use transaction::Transaction;
