//! Opaque transaction records.
//!
//! The block layer never interprets transaction payloads: fees, inputs,
//! and outputs belong to a separate subsystem. A transaction here is an
//! ordered, serializable text record whose bytes feed the Merkle tree and
//! the canonical block hash.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(String);

impl Transaction {
    /// Wrap a serialized transaction record.
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// The payload text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The payload bytes hashed into Merkle leaves and block headers.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for Transaction {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Transaction {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
