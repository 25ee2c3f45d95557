//! Blake3 content hashing with hex-encoded digests.
//!
//! Hashes travel through the block layer as lowercase hex strings: the
//! mining difficulty predicate counts leading `'0'` characters, Merkle
//! nodes concatenate the hex text of their children, and the structured
//! block record stores every hash as a text field. The empty hash is a
//! deliberate sentinel (genesis `previous_hash`, Merkle root of zero
//! transactions), distinct from the digest of empty input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hex characters in a full digest.
pub const HASH_HEX_LEN: usize = 64;

/// A hex-encoded Blake3 digest, or the empty sentinel.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(String);

impl Hash {
    /// The empty sentinel hash.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap an already hex-encoded digest (or the empty sentinel).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Hash(empty)")
        } else {
            write!(f, "Hash({})", &self.0[..8.min(self.0.len())])
        }
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for Hash {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Hash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Hash arbitrary data, returning the hex digest.
pub fn hash(data: &[u8]) -> Hash {
    Hash(blake3::hash(data).to_hex().to_string())
}

/// Hash multiple pieces of data as if they were concatenated.
pub fn hash_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(hash(data), hash(data));
    }

    #[test]
    fn hash_differs_per_input() {
        assert_ne!(hash(b"hello"), hash(b"world"));
    }

    #[test]
    fn hash_is_full_length_hex() {
        let h = hash(b"test data");
        assert_eq!(h.as_str().len(), HASH_HEX_LEN);
        assert!(h.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_concat_matches_joined_input() {
        assert_eq!(hash_concat(&[b"hello", b"world"]), hash(b"helloworld"));
    }

    #[test]
    fn empty_sentinel_is_not_hash_of_empty_input() {
        assert!(Hash::empty().is_empty());
        assert_ne!(Hash::empty(), hash(b""));
    }

    #[test]
    fn hex_roundtrip() {
        let h = hash(b"roundtrip");
        assert_eq!(Hash::from_hex(h.as_str()), h);
    }

    #[test]
    fn json_is_a_plain_string() {
        let h = hash(b"json");
        let encoded = serde_json::to_string(&h).unwrap();
        assert_eq!(encoded, format!("\"{}\"", h.as_str()));
        let decoded: Hash = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, h);
    }
}
