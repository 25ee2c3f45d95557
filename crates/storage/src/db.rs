//! sled database wrapper with JSON serialization helpers.

use powchain_core::{Hash, RecordError};
use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("block does not extend the chain head: {0}")]
    BrokenChain(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Wrapper around a sled database with JSON serialization helpers.
///
/// Values are stored as the JSON encoding of their serde form, so block
/// payloads on disk are exactly the structured block record.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open a temporary database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Store a serializable value.
    pub fn put<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: serde::Serialize,
    {
        let encoded = serde_json::to_vec(value)?;
        self.db.insert(key, encoded)?;
        Ok(())
    }

    /// Retrieve and deserialize a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        match self.db.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Retrieve a value, returning an error if not found.
    pub fn get_or_err<K, V>(&self, key: K) -> Result<V>
    where
        K: AsRef<[u8]> + std::fmt::Debug + Clone,
        V: serde::de::DeserializeOwned,
    {
        self.get(key.clone())?
            .ok_or_else(|| StorageError::NotFound(format!("{:?}", key)))
    }

    /// Delete a key.
    pub fn delete<K: AsRef<[u8]>>(&self, key: K) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }

    /// Check if a key exists.
    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> Result<bool> {
        Ok(self.db.contains_key(key)?)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // =========================================================================
    // Key Construction Helpers
    // =========================================================================

    /// Key for a block by hash. Format: `block:hash:{hex}`
    pub fn block_hash_key(hash: &Hash) -> String {
        format!("block:hash:{}", hash)
    }

    /// Key for the hash pointer at a height. Format: `block:height:{height}`
    pub fn block_height_key(height: u64) -> String {
        format!("block:height:{}", height)
    }
}
