//! Block storage and chain head tracking.

use crate::db::{Result, Storage, StorageError};
use powchain_core::{Block, BlockRecord, Hash};

/// Keys for chain metadata.
const CHAIN_HEAD_KEY: &str = "chain:head";
const CHAIN_HEIGHT_KEY: &str = "chain:height";

/// Manages block persistence and the chain head.
///
/// Two index entries per block:
/// - Primary: `block:hash:{hash}` → the structured block record (immutable)
/// - Secondary: `block:height:{height}` → hash (pointer)
pub struct BlockStore<'a> {
    storage: &'a Storage,
}

impl<'a> BlockStore<'a> {
    /// Create a block store over the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // =========================================================================
    // Block round-trip
    // =========================================================================

    /// Store a block under its hash, plus the height pointer.
    ///
    /// Returns the hash used as the primary key.
    pub fn put_block(&self, block: &Block) -> Result<Hash> {
        let hash = block.calculate_hash();

        let hash_key = Storage::block_hash_key(&hash);
        self.storage.put(&hash_key, &block.to_record())?;

        let height_key = Storage::block_height_key(block.height());
        self.storage.put(&height_key, &hash)?;

        Ok(hash)
    }

    /// Load a block by its hash.
    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Option<Block>> {
        let key = Storage::block_hash_key(hash);
        match self.storage.get::<_, BlockRecord>(&key)? {
            Some(record) => Ok(Some(Block::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Load a block by its height (height → hash → record).
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        let height_key = Storage::block_height_key(height);
        match self.storage.get::<_, Hash>(&height_key)? {
            Some(hash) => self.get_block_by_hash(&hash),
            None => Ok(None),
        }
    }

    /// Check if a block exists by hash.
    pub fn has_block(&self, hash: &Hash) -> Result<bool> {
        self.storage.contains(Storage::block_hash_key(hash))
    }

    // =========================================================================
    // Chain head
    // =========================================================================

    /// The current chain head hash, if initialized.
    pub fn head(&self) -> Result<Option<Hash>> {
        self.storage.get(CHAIN_HEAD_KEY)
    }

    /// The current chain height (0 when uninitialized).
    pub fn height(&self) -> Result<u64> {
        Ok(self.storage.get::<_, u64>(CHAIN_HEIGHT_KEY)?.unwrap_or(0))
    }

    /// Update the chain head after appending a block.
    pub fn set_head(&self, hash: &Hash, height: u64) -> Result<()> {
        self.storage.put(CHAIN_HEAD_KEY, hash)?;
        self.storage.put(CHAIN_HEIGHT_KEY, &height)?;
        Ok(())
    }

    /// The block at the chain head.
    pub fn latest_block(&self) -> Result<Option<Block>> {
        match self.head()? {
            Some(hash) => self.get_block_by_hash(&hash),
            None => Ok(None),
        }
    }

    /// Whether the chain has a genesis block.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.head()?.is_some())
    }

    // =========================================================================
    // Chain operations
    // =========================================================================

    /// Initialize the chain with a genesis block (height 0, exactly once).
    pub fn init_genesis(&self, genesis: &Block) -> Result<Hash> {
        if genesis.height() != 0 {
            return Err(StorageError::InvalidGenesis(
                "genesis block must have height 0".into(),
            ));
        }
        if self.is_initialized()? {
            return Err(StorageError::InvalidGenesis(
                "chain already initialized".into(),
            ));
        }

        let hash = self.put_block(genesis)?;
        self.set_head(&hash, 0)?;
        Ok(hash)
    }

    /// Append a block that extends the current head.
    ///
    /// Enforces height = head height + 1 and `previous_hash` = head hash.
    /// Verification (signature, Merkle, PoW, checkpoints) belongs to the
    /// chain layer and must run before this call.
    pub fn append_block(&self, block: &Block) -> Result<Hash> {
        let head_height = self.height()?;
        let head_hash = self
            .head()?
            .ok_or_else(|| StorageError::InvalidGenesis("chain not initialized".into()))?;

        if block.height() != head_height + 1 {
            return Err(StorageError::BrokenChain(format!(
                "expected height {}, got {}",
                head_height + 1,
                block.height()
            )));
        }
        if *block.previous_hash() != head_hash {
            return Err(StorageError::BrokenChain(format!(
                "previous hash {} does not match head {}",
                block.previous_hash(),
                head_hash
            )));
        }

        let hash = self.put_block(block)?;
        self.set_head(&hash, block.height())?;
        Ok(hash)
    }

    /// Blocks in the inclusive height range, stopping at the first gap.
    pub fn blocks_in_range(&self, from_height: u64, to_height: u64) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        for height in from_height..=to_height {
            match self.get_block_by_height(height)? {
                Some(block) => blocks.push(block),
                None => break,
            }
        }
        Ok(blocks)
    }
}
