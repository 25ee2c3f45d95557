//! Checkpoint trust anchors.
//!
//! A checkpoint pins the expected block hash at a specific height. The
//! table is loaded once at process start (from configuration or a JSON
//! file), never mutated afterwards, and shared read-only via `Arc`:
//! verifiers take a snapshot instead of blocks holding a reference into
//! long-lived chain state.

use powchain_core::{Block, Hash, PublicKey};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors from loading a checkpoint table.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed checkpoint file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An immutable height-indexed table of known-good block hashes.
#[derive(Debug, Clone, Default)]
pub struct CheckpointSet {
    entries: HashMap<u64, Hash>,
}

impl CheckpointSet {
    /// An empty table (no heights are checkpointed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from (height, hash) pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (u64, Hash)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Load a table from a JSON file mapping heights to hashes, e.g.
    /// `{"10": "00ab…", "100": "00cd…"}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: HashMap<u64, Hash> = serde_json::from_str(&json)?;
        Ok(Self { entries })
    }

    /// The expected hash at a height, if that height is checkpointed.
    pub fn expected_hash(&self, height: u64) -> Option<&Hash> {
        self.entries.get(&height)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cross-checks blocks against a shared checkpoint table.
#[derive(Debug, Clone)]
pub struct CheckpointVerifier {
    checkpoints: Arc<CheckpointSet>,
}

impl CheckpointVerifier {
    /// Create a verifier over a shared checkpoint snapshot.
    pub fn new(checkpoints: Arc<CheckpointSet>) -> Self {
        Self { checkpoints }
    }

    /// The underlying table.
    pub fn checkpoints(&self) -> &CheckpointSet {
        &self.checkpoints
    }

    /// Verify a block, honoring checkpoints.
    ///
    /// At a checkpointed height the computed block hash must equal the
    /// trust anchor exactly; that comparison decides the outcome and
    /// overrides signature or Merkle success. Every other height falls
    /// back to full signature + Merkle verification.
    pub fn verify_block(&self, block: &Block, public_key: &PublicKey) -> bool {
        if let Some(expected) = self.checkpoints.expected_hash(block.height()) {
            return block.calculate_hash() == *expected;
        }
        block.verify_block(public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::{Hash, Keypair, Transaction};

    fn signed_block(height: u64) -> (Block, Keypair) {
        let keypair = Keypair::generate();
        let mut block = Block::new(Hash::from_hex("genesis"));
        block.add_transaction(Transaction::from("tx1")).unwrap();
        block.commit_merkle_root();
        block.sign(&keypair).unwrap();
        block.set_height(height);
        (block, keypair)
    }

    #[test]
    fn non_checkpointed_height_falls_back_to_full_verification() {
        let (block, keypair) = signed_block(5);
        let verifier = CheckpointVerifier::new(Arc::new(CheckpointSet::new()));
        assert!(verifier.verify_block(&block, &keypair.public_key));

        let stranger = Keypair::generate();
        assert!(!verifier.verify_block(&block, &stranger.public_key));
    }

    #[test]
    fn checkpoint_mismatch_rejects_an_otherwise_valid_block() {
        let (block, keypair) = signed_block(10);
        assert!(block.verify_block(&keypair.public_key));

        let forged = CheckpointSet::from_entries([(10, Hash::from_hex("deadbeef"))]);
        let verifier = CheckpointVerifier::new(Arc::new(forged));
        assert!(!verifier.verify_block(&block, &keypair.public_key));
    }

    #[test]
    fn checkpoint_match_accepts_the_anchored_block() {
        let (block, keypair) = signed_block(10);
        let anchored = CheckpointSet::from_entries([(10, block.calculate_hash())]);
        let verifier = CheckpointVerifier::new(Arc::new(anchored));
        assert!(verifier.verify_block(&block, &keypair.public_key));
    }

    #[test]
    fn other_heights_are_unaffected_by_the_table() {
        let (block, keypair) = signed_block(7);
        let table = CheckpointSet::from_entries([(10, Hash::from_hex("deadbeef"))]);
        let verifier = CheckpointVerifier::new(Arc::new(table));
        assert!(verifier.verify_block(&block, &keypair.public_key));
    }

    #[test]
    fn load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        std::fs::write(&path, r#"{"10": "00ab", "100": "00cd"}"#).unwrap();

        let set = CheckpointSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.expected_hash(10), Some(&Hash::from_hex("00ab")));
        assert_eq!(set.expected_hash(100), Some(&Hash::from_hex("00cd")));
        assert_eq!(set.expected_hash(11), None);
    }

    #[test]
    fn load_missing_file_reports_the_path() {
        let err = CheckpointSet::load("/nonexistent/checkpoints.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/checkpoints.json"));
    }

    #[test]
    fn load_malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        std::fs::write(&path, r#"["not", "a", "map"]"#).unwrap();
        assert!(matches!(
            CheckpointSet::load(&path),
            Err(CheckpointError::Parse(_))
        ));
    }
}
