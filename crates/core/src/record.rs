//! The structured block record and block files.
//!
//! A block persists as a fixed eight-field JSON object. The schema is
//! closed: every field is mandatory, and a record missing one fails to
//! parse with the offending field named in the error. The same record
//! serves block files (pretty-printed) and key-value store payloads.
//!
//! An unsigned block records an empty `signature` string; everything
//! else round-trips field-for-field.

use crate::block::Block;
use crate::crypto::{CryptoError, Signature};
use crate::hash::Hash;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from record parsing and block file I/O.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Malformed record: missing or mistyped field. Fatal for this load
    /// attempt; the message names the field.
    #[error("malformed block record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The signature field held text that is not a valid signature.
    #[error("malformed block record: {0}")]
    Crypto(#[from] CryptoError),

    /// Block file could not be read or written.
    #[error("block file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The wire/storage form of a block.
///
/// Field names match the historical JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub previous_hash: String,
    pub merkle_root: String,
    pub signature: String,
    pub block_height: u64,
    pub timestamp: u64,
    pub nonce: u64,
    pub difficulty: u32,
    pub transactions: Vec<String>,
}

impl Block {
    /// Convert to the structured record.
    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            previous_hash: self.previous_hash.as_str().to_owned(),
            merkle_root: self.merkle_root.as_str().to_owned(),
            signature: self
                .signature
                .map(|s| s.to_hex())
                .unwrap_or_default(),
            block_height: self.height,
            timestamp: self.timestamp,
            nonce: self.nonce,
            difficulty: self.difficulty,
            transactions: self
                .transactions
                .iter()
                .map(|tx| tx.as_str().to_owned())
                .collect(),
        }
    }

    /// Rebuild a block from its structured record.
    ///
    /// The loaded block is frozen: it skips assembly but must still pass
    /// the usual verification before being trusted.
    pub fn from_record(record: BlockRecord) -> Result<Self, RecordError> {
        let signature = if record.signature.is_empty() {
            None
        } else {
            Some(Signature::from_hex(&record.signature)?)
        };
        Ok(Self {
            previous_hash: Hash::from_hex(record.previous_hash),
            merkle_root: Hash::from_hex(record.merkle_root),
            signature,
            height: record.block_height,
            timestamp: record.timestamp,
            nonce: record.nonce,
            difficulty: record.difficulty,
            transactions: record
                .transactions
                .into_iter()
                .map(Transaction::from)
                .collect(),
        })
    }

    /// Serialize to the record's JSON text (human-readable, indented).
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    /// Parse a block from record JSON text.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let record: BlockRecord = serde_json::from_str(json)?;
        Self::from_record(record)
    }

    /// Write the block record to a file, overwriting any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a block record from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
