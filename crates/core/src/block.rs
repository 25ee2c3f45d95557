//! The block: header fields, transaction list, commitments, mining.
//!
//! A block is assembled by a single writer in a fixed order: add
//! transactions, commit the Merkle root, sign, mine. After mining it is
//! frozen and either persisted or handed to the chain. Blocks loaded
//! from a record skip assembly but pass through the same verification.
//!
//! Canonical message definition (fixed, also pinned by tests):
//! - the block hash covers `(previous_hash, merkle_root, timestamp,
//!   nonce, transactions)` in that order, integers as decimal text, and
//!   excludes the signature;
//! - the signed message is the committed Merkle root's hex bytes, so the
//!   signature stays valid across mining (which only moves the nonce).

use crate::crypto::{Keypair, PublicKey, Signature};
use crate::hash::{hash, Hash};
use crate::merkle;
use crate::pow::{self, CancelToken, PowError};
use crate::transaction::Transaction;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Maximum number of transactions in one block.
pub const MAX_BLOCK_SIZE: usize = 1000;

/// Maximum allowed seconds a block timestamp may sit in the future.
pub const MAX_TIMESTAMP_OFFSET: u64 = 600;

/// Errors from block assembly and mining.
///
/// Verification failures are not errors: untrusted blocks are expected,
/// so the `verify_*` methods return booleans.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// Appending would exceed [`MAX_BLOCK_SIZE`]; split across blocks.
    #[error("block is full ({MAX_BLOCK_SIZE} transactions max)")]
    CapacityExceeded,

    /// Operation attempted out of the assembly order.
    #[error("block not ready: {0}")]
    NotReady(&'static str),

    /// Mining stopped before satisfying the difficulty target.
    #[error("mining cancelled before a valid nonce was found")]
    MiningCancelled,
}

impl From<PowError> for BlockError {
    fn from(err: PowError) -> Self {
        match err {
            PowError::Cancelled => BlockError::MiningCancelled,
        }
    }
}

/// A block of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Hash of the prior block; empty only for genesis.
    pub(crate) previous_hash: Hash,
    /// Committed Merkle root; empty until committed (or for zero
    /// transactions, where the empty sentinel is the committed root).
    pub(crate) merkle_root: Hash,
    /// Signature over the committed Merkle root; set once, before mining.
    pub(crate) signature: Option<Signature>,
    /// Position in the chain, set by the appending authority.
    pub(crate) height: u64,
    /// Creation time, seconds since the Unix epoch.
    pub(crate) timestamp: u64,
    /// Mining counter; only `mine` moves it.
    pub(crate) nonce: u64,
    /// Leading-zero target this block was mined at; 0 means unmined.
    pub(crate) difficulty: u32,
    /// Ordered opaque transaction records.
    pub(crate) transactions: Vec<Transaction>,
}

impl Block {
    /// Create an empty block chaining onto `previous_hash`.
    pub fn new(previous_hash: Hash) -> Self {
        Self {
            previous_hash,
            merkle_root: Hash::empty(),
            signature: None,
            height: 0,
            timestamp: Self::current_timestamp(),
            nonce: 0,
            difficulty: 0,
            transactions: Vec::new(),
        }
    }

    /// Create a genesis block (empty previous hash).
    pub fn genesis() -> Self {
        Self::new(Hash::empty())
    }

    /// Current Unix timestamp in seconds.
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_secs()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn merkle_root(&self) -> &Hash {
        &self.merkle_root
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.previous_hash.is_empty()
    }

    /// Set the chain position. Called by the appending authority, never
    /// self-assigned.
    pub fn set_height(&mut self, height: u64) {
        self.height = height;
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Append a transaction, preserving insertion order.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), BlockError> {
        if self.transactions.len() >= MAX_BLOCK_SIZE {
            return Err(BlockError::CapacityExceeded);
        }
        self.transactions.push(tx);
        Ok(())
    }

    /// Replace the transaction list wholesale.
    ///
    /// Any previously committed root or signature is left untouched and
    /// becomes stale; the caller must re-commit and re-sign.
    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) -> Result<(), BlockError> {
        if transactions.len() > MAX_BLOCK_SIZE {
            return Err(BlockError::CapacityExceeded);
        }
        self.transactions = transactions;
        Ok(())
    }

    /// Compute the Merkle root of the current transactions.
    ///
    /// Pure: does not store the result. Use
    /// [`commit_merkle_root`](Self::commit_merkle_root) to commit.
    pub fn compute_merkle_root(&self) -> Hash {
        merkle::merkle_root(&self.transactions)
    }

    /// Commit the Merkle root of the current transactions.
    pub fn commit_merkle_root(&mut self) {
        self.merkle_root = self.compute_merkle_root();
    }

    /// Whether the committed root matches the current transactions.
    fn root_is_committed(&self) -> bool {
        self.merkle_root == self.compute_merkle_root()
    }

    /// Sign the committed Merkle root.
    ///
    /// Fails with [`BlockError::NotReady`] if the committed root does not
    /// match the current transactions.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<(), BlockError> {
        if !self.root_is_committed() {
            return Err(BlockError::NotReady(
                "merkle root must be committed before signing",
            ));
        }
        self.signature = Some(keypair.sign(self.merkle_root.as_ref()));
        Ok(())
    }

    // =========================================================================
    // Hashing & mining
    // =========================================================================

    /// Canonical header bytes for a given nonce.
    ///
    /// Fixed field order, integers as decimal text, transactions in
    /// insertion order, signature excluded.
    fn canonical_bytes(&self, nonce: u64) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(self.previous_hash.as_ref());
        bytes.extend_from_slice(self.merkle_root.as_ref());
        bytes.extend_from_slice(self.timestamp.to_string().as_bytes());
        bytes.extend_from_slice(nonce.to_string().as_bytes());
        for tx in &self.transactions {
            bytes.extend_from_slice(tx.as_bytes());
        }
        bytes
    }

    /// The block hash: a pure function of `(previous_hash, merkle_root,
    /// timestamp, nonce, transactions)`. Idempotent, no side effects.
    pub fn calculate_hash(&self) -> Hash {
        hash(&self.canonical_bytes(self.nonce))
    }

    /// Mine the block at the given difficulty.
    ///
    /// Requires a committed root and a signature: mining commits to a
    /// fully authored block. Only the nonce varies across attempts; the
    /// timestamp and transactions stay fixed. On success the found nonce
    /// and the difficulty are stored and the mined hash returned. A
    /// fired token yields [`BlockError::MiningCancelled`] with the block
    /// unchanged.
    pub fn mine(&mut self, difficulty: u32, cancel: &CancelToken) -> Result<Hash, BlockError> {
        if !self.root_is_committed() {
            return Err(BlockError::NotReady(
                "merkle root must be committed before mining",
            ));
        }
        if self.signature.is_none() {
            return Err(BlockError::NotReady("block must be signed before mining"));
        }

        let solution = pow::mine(
            |nonce| hash(&self.canonical_bytes(nonce)),
            difficulty,
            self.nonce,
            cancel,
        )?;

        self.nonce = solution.nonce;
        self.difficulty = difficulty;
        Ok(solution.hash)
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Verify the stored signature over the committed Merkle root.
    ///
    /// Returns false (never an error) on a missing signature or any
    /// mismatch.
    pub fn verify_signature(&self, public_key: &PublicKey) -> bool {
        match &self.signature {
            Some(signature) => public_key
                .verify(self.merkle_root.as_ref(), signature)
                .is_ok(),
            None => false,
        }
    }

    /// Verify the committed Merkle root against the transactions.
    pub fn verify_merkle_root(&self) -> bool {
        merkle::verify_merkle_root(&self.merkle_root, &self.transactions)
    }

    /// Signature and Merkle root together; short-circuits on the first
    /// failure.
    pub fn verify_block(&self, public_key: &PublicKey) -> bool {
        self.verify_signature(public_key) && self.verify_merkle_root()
    }

    /// Cheap structural check run before cryptographic verification:
    /// transaction count within [`MAX_BLOCK_SIZE`] and timestamp no more
    /// than [`MAX_TIMESTAMP_OFFSET`] seconds in the future.
    pub fn is_valid(&self) -> bool {
        self.transactions.len() <= MAX_BLOCK_SIZE
            && self.timestamp <= Self::current_timestamp() + MAX_TIMESTAMP_OFFSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::meets_difficulty;
    use crate::record::BlockRecord;

    fn assembled_block(payloads: &[&str]) -> Block {
        let mut block = Block::new(Hash::from_hex("genesis"));
        for p in payloads {
            block.add_transaction(Transaction::from(*p)).unwrap();
        }
        block.commit_merkle_root();
        block
    }

    #[test]
    fn fresh_block_defaults() {
        let block = Block::new(Hash::from_hex("prev"));
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.difficulty(), 0);
        assert_eq!(block.height(), 0);
        assert!(block.merkle_root().is_empty());
        assert!(block.signature().is_none());
        assert_eq!(block.tx_count(), 0);
    }

    #[test]
    fn genesis_has_empty_previous_hash() {
        let genesis = Block::genesis();
        assert!(genesis.is_genesis());
        assert!(genesis.previous_hash().is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut block = Block::genesis();
        for i in 0..MAX_BLOCK_SIZE {
            block
                .add_transaction(Transaction::new(format!("tx{}", i)))
                .unwrap();
        }
        assert_eq!(
            block.add_transaction(Transaction::from("overflow")),
            Err(BlockError::CapacityExceeded)
        );
        assert_eq!(block.tx_count(), MAX_BLOCK_SIZE);
    }

    #[test]
    fn set_transactions_enforces_capacity() {
        let mut block = Block::genesis();
        let too_many: Vec<Transaction> = (0..=MAX_BLOCK_SIZE)
            .map(|i| Transaction::new(format!("tx{}", i)))
            .collect();
        assert_eq!(
            block.set_transactions(too_many),
            Err(BlockError::CapacityExceeded)
        );
    }

    #[test]
    fn calculate_hash_is_idempotent() {
        let block = assembled_block(&["tx1", "tx2"]);
        assert_eq!(block.calculate_hash(), block.calculate_hash());
    }

    #[test]
    fn hash_covers_the_header_fields() {
        let block = assembled_block(&["tx1", "tx2"]);
        let baseline = block.calculate_hash();

        let mut other = block.clone();
        other.nonce = 1;
        assert_ne!(other.calculate_hash(), baseline);

        let mut other = block.clone();
        other.timestamp += 1;
        assert_ne!(other.calculate_hash(), baseline);

        let mut other = block.clone();
        other.previous_hash = Hash::from_hex("elsewhere");
        assert_ne!(other.calculate_hash(), baseline);

        let mut other = block.clone();
        other.transactions[0] = Transaction::from("tampered");
        assert_ne!(other.calculate_hash(), baseline);

        // The signature is excluded from the canonical message.
        let mut other = block.clone();
        other.signature = Some(Signature::from_bytes([7u8; 64]));
        assert_eq!(other.calculate_hash(), baseline);
    }

    #[test]
    fn compute_merkle_root_does_not_commit() {
        let mut block = Block::genesis();
        block.add_transaction(Transaction::from("tx1")).unwrap();
        let computed = block.compute_merkle_root();
        assert!(block.merkle_root().is_empty());
        block.commit_merkle_root();
        assert_eq!(*block.merkle_root(), computed);
    }

    #[test]
    fn sign_before_commit_is_not_ready() {
        let mut block = Block::genesis();
        block.add_transaction(Transaction::from("tx1")).unwrap();
        let keypair = Keypair::generate();
        assert!(matches!(
            block.sign(&keypair),
            Err(BlockError::NotReady(_))
        ));
    }

    #[test]
    fn zero_transaction_block_signs_against_empty_root() {
        let mut block = Block::genesis();
        let keypair = Keypair::generate();
        // Root of zero transactions is the empty sentinel, already committed.
        block.sign(&keypair).unwrap();
        assert!(block.verify_signature(&keypair.public_key));
    }

    #[test]
    fn mine_before_sign_is_not_ready() {
        let mut block = assembled_block(&["tx1"]);
        let token = CancelToken::new();
        assert!(matches!(
            block.mine(1, &token),
            Err(BlockError::NotReady(_))
        ));
    }

    #[test]
    fn mine_cancelled_leaves_block_unchanged() {
        let mut block = assembled_block(&["tx1"]);
        let keypair = Keypair::generate();
        block.sign(&keypair).unwrap();
        let before = block.clone();

        let token = CancelToken::new();
        token.cancel();
        assert_eq!(block.mine(64, &token), Err(BlockError::MiningCancelled));
        assert_eq!(block, before);
    }

    #[test]
    fn end_to_end_assemble_sign_mine_verify() {
        let keypair = Keypair::generate();
        let mut block = Block::new(Hash::from_hex("genesis"));
        for p in ["tx1", "tx2", "tx3"] {
            block.add_transaction(Transaction::from(p)).unwrap();
        }
        block.commit_merkle_root();
        block.sign(&keypair).unwrap();

        let token = CancelToken::new();
        let mined = block.mine(2, &token).unwrap();

        assert!(mined.as_str().starts_with("00"));
        assert_eq!(mined, block.calculate_hash());
        assert!(meets_difficulty(&block.calculate_hash(), 2));
        assert_eq!(block.difficulty(), 2);
        assert!(block.verify_block(&keypair.public_key));
        assert!(block.is_valid());
    }

    #[test]
    fn mining_is_deterministic_from_nonce_zero() {
        let keypair = Keypair::generate();
        let mut a = assembled_block(&["tx1", "tx2", "tx3"]);
        a.sign(&keypair).unwrap();
        let mut b = a.clone();

        let token = CancelToken::new();
        let hash_a = a.mine(2, &token).unwrap();
        let hash_b = b.mine(2, &token).unwrap();
        assert_eq!(a.nonce(), b.nonce());
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn tampering_after_signature_breaks_verification() {
        let keypair = Keypair::generate();
        let mut block = assembled_block(&["tx1", "tx2", "tx3"]);
        block.sign(&keypair).unwrap();
        assert!(block.verify_block(&keypair.public_key));

        // Swap one transaction without re-signing: the committed root no
        // longer matches the transactions.
        block
            .set_transactions(vec![
                Transaction::from("tx1"),
                Transaction::from("evil"),
                Transaction::from("tx3"),
            ])
            .unwrap();
        assert!(!block.verify_merkle_root());
        assert!(!block.verify_block(&keypair.public_key));

        // Re-committing the root exposes the stale signature instead.
        block.commit_merkle_root();
        assert!(block.verify_merkle_root());
        assert!(!block.verify_signature(&keypair.public_key));
    }

    #[test]
    fn wrong_key_fails_signature_verification() {
        let keypair = Keypair::generate();
        let other = Keypair::generate();
        let mut block = assembled_block(&["tx1"]);
        block.sign(&keypair).unwrap();
        assert!(block.verify_signature(&keypair.public_key));
        assert!(!block.verify_signature(&other.public_key));
    }

    #[test]
    fn unsigned_block_fails_signature_verification() {
        let block = assembled_block(&["tx1"]);
        let keypair = Keypair::generate();
        assert!(!block.verify_signature(&keypair.public_key));
    }

    #[test]
    fn is_valid_rejects_future_timestamps() {
        let mut block = Block::genesis();
        assert!(block.is_valid());
        block.timestamp = Block::current_timestamp() + MAX_TIMESTAMP_OFFSET + 1;
        assert!(!block.is_valid());
    }

    #[test]
    fn is_valid_rejects_over_capacity_loads() {
        // Assembly enforces the cap, but a loaded record bypasses it.
        let record = BlockRecord {
            previous_hash: String::new(),
            merkle_root: String::new(),
            signature: String::new(),
            block_height: 0,
            timestamp: Block::current_timestamp(),
            nonce: 0,
            difficulty: 0,
            transactions: (0..=MAX_BLOCK_SIZE).map(|i| format!("tx{}", i)).collect(),
        };
        let block = Block::from_record(record).unwrap();
        assert_eq!(block.tx_count(), MAX_BLOCK_SIZE + 1);
        assert!(!block.is_valid());
    }

    #[test]
    fn is_valid_accepts_max_offset() {
        let mut block = Block::genesis();
        block.timestamp = Block::current_timestamp() + MAX_TIMESTAMP_OFFSET - 1;
        assert!(block.is_valid());
    }
}
