//! The blockchain: verified append over a block store.

use powchain_consensus::{BlockValidator, CheckpointSet, ValidationError};
use powchain_core::{Block, Hash, PublicKey};
use powchain_storage::{BlockStore, Storage};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from chain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("storage error: {0}")]
    Storage(#[from] powchain_storage::StorageError),

    #[error("block rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("chain is not initialized")]
    MissingGenesis,
}

pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Single-head chain over persistent storage.
///
/// The checkpoint table is an immutable snapshot injected at
/// construction and shared with whoever else holds it; blocks never
/// store a reference into it.
pub struct Blockchain<'a> {
    store: BlockStore<'a>,
    checkpoints: Arc<CheckpointSet>,
}

impl<'a> Blockchain<'a> {
    /// Create a chain over the given storage and checkpoint snapshot.
    pub fn new(storage: &'a Storage, checkpoints: Arc<CheckpointSet>) -> Self {
        Self {
            store: BlockStore::new(storage),
            checkpoints,
        }
    }

    /// Initialize with a genesis block. No verification beyond the
    /// height-0 requirement: the genesis is trusted input.
    pub fn init_genesis(&self, genesis: &Block) -> Result<Hash> {
        let hash = self.store.init_genesis(genesis)?;
        info!(hash = %hash, "chain initialized");
        Ok(hash)
    }

    /// The current chain height.
    pub fn height(&self) -> Result<u64> {
        Ok(self.store.height()?)
    }

    /// Whether a genesis block exists.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.store.is_initialized()?)
    }

    /// The block at the chain head.
    pub fn latest_block(&self) -> Result<Block> {
        self.store
            .latest_block()?
            .ok_or(BlockchainError::MissingGenesis)
    }

    /// Look up a block by hash.
    pub fn get_block(&self, hash: &Hash) -> Result<Option<Block>> {
        Ok(self.store.get_block_by_hash(hash)?)
    }

    /// Look up a block by height.
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        Ok(self.store.get_block_by_height(height)?)
    }

    /// Blocks in the inclusive height range.
    pub fn blocks_in_range(&self, from_height: u64, to_height: u64) -> Result<Vec<Block>> {
        Ok(self.store.blocks_in_range(from_height, to_height)?)
    }

    /// Accept a finalized block onto the chain.
    ///
    /// Runs the cheap rules (parent linkage, structure, the PoW
    /// predicate) before checkpoint-aware cryptographic verification, and
    /// persists the block on success, returning its hash.
    pub fn add_block(&self, block: &Block, public_key: &PublicKey) -> Result<Hash> {
        let head_hash = self.store.head()?.ok_or(BlockchainError::MissingGenesis)?;
        let head_height = self.store.height()?;

        let checks = BlockValidator::check_extends_parent(block, &head_hash, head_height)
            .and_then(|_| BlockValidator::check_block(block, public_key, &self.checkpoints));
        if let Err(reason) = checks {
            warn!(height = block.height(), %reason, "rejecting block");
            return Err(reason.into());
        }

        let hash = self.store.append_block(block)?;
        info!(
            height = block.height(),
            hash = %hash,
            tx_count = block.tx_count(),
            "block appended"
        );
        debug!(difficulty = block.difficulty(), nonce = block.nonce(), "block detail");
        Ok(hash)
    }
}
