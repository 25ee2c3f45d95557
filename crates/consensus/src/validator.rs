//! Block validation rules.
//!
//! The chain runs these in cost order: cheap structural checks first,
//! then the PoW predicate, parent linkage, and finally the cryptographic
//! checks. Each rule reports a specific [`ValidationError`] so callers
//! can log why a block was rejected.

use powchain_core::pow::meets_difficulty;
use powchain_core::{Block, Hash, PublicKey, MAX_BLOCK_SIZE, MAX_TIMESTAMP_OFFSET};
use thiserror::Error;

/// Why a block was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("block exceeds the transaction cap of {MAX_BLOCK_SIZE}")]
    TooManyTransactions,

    #[error("block timestamp is more than {MAX_TIMESTAMP_OFFSET}s in the future")]
    TimestampTooFuture,

    #[error("block hash does not satisfy its recorded difficulty {0}")]
    InsufficientPow(u32),

    #[error("block height mismatch (expected {expected}, got {got})")]
    InvalidHeight { expected: u64, got: u64 },

    #[error("block previous hash does not match the chain head")]
    InvalidPreviousHash,

    #[error("merkle root does not match the transactions")]
    InvalidMerkleRoot,

    #[error("block signature verification failed")]
    InvalidSignature,

    #[error("block hash does not match the checkpoint at height {height}")]
    CheckpointMismatch { height: u64 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Stateless block validation rules.
pub struct BlockValidator;

impl BlockValidator {
    /// Structural pre-filter: size cap and timestamp bound. Mirrors
    /// [`Block::is_valid`] but names the violated rule.
    pub fn check_structure(block: &Block) -> Result<()> {
        if block.tx_count() > MAX_BLOCK_SIZE {
            return Err(ValidationError::TooManyTransactions);
        }
        if block.timestamp() > Block::current_timestamp() + MAX_TIMESTAMP_OFFSET {
            return Err(ValidationError::TimestampTooFuture);
        }
        Ok(())
    }

    /// Re-check the proof-of-work against the recorded difficulty.
    ///
    /// Difficulty 0 means the block was produced outside a PoW context
    /// and passes.
    pub fn check_pow(block: &Block) -> Result<()> {
        let difficulty = block.difficulty();
        if difficulty > 0 && !meets_difficulty(&block.calculate_hash(), difficulty) {
            return Err(ValidationError::InsufficientPow(difficulty));
        }
        Ok(())
    }

    /// Check the block extends the given chain head.
    pub fn check_extends_parent(block: &Block, head_hash: &Hash, head_height: u64) -> Result<()> {
        if block.height() != head_height + 1 {
            return Err(ValidationError::InvalidHeight {
                expected: head_height + 1,
                got: block.height(),
            });
        }
        if block.previous_hash() != head_hash {
            return Err(ValidationError::InvalidPreviousHash);
        }
        Ok(())
    }

    /// Cryptographic checks: Merkle root, then signature.
    pub fn check_crypto(block: &Block, public_key: &PublicKey) -> Result<()> {
        if !block.verify_merkle_root() {
            return Err(ValidationError::InvalidMerkleRoot);
        }
        if !block.verify_signature(public_key) {
            return Err(ValidationError::InvalidSignature);
        }
        Ok(())
    }

    /// All standalone rules (everything except parent linkage), honoring
    /// checkpoints: at a checkpointed height the hash comparison decides
    /// and the cryptographic checks are skipped.
    pub fn check_block(
        block: &Block,
        public_key: &PublicKey,
        checkpoints: &crate::CheckpointSet,
    ) -> Result<()> {
        Self::check_structure(block)?;
        Self::check_pow(block)?;
        if let Some(expected) = checkpoints.expected_hash(block.height()) {
            if block.calculate_hash() != *expected {
                return Err(ValidationError::CheckpointMismatch {
                    height: block.height(),
                });
            }
            return Ok(());
        }
        Self::check_crypto(block, public_key)
    }
}
