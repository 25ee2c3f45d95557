//! Merkle commitments over ordered transaction sequences.
//!
//! The tree splits the sequence into halves recursively: `mid = n / 2`,
//! so the left subtree takes the smaller-or-equal half when `n` is odd.
//! An internal node hashes the byte concatenation of its children's hex
//! digests. Leaf order is insertion order; the same sequence always
//! yields the same root.
//!
//! Sentinels: the empty sequence commits to the empty hash, a single
//! transaction commits to its leaf hash directly.

use crate::hash::{hash, hash_concat, Hash};
use crate::transaction::Transaction;

/// Compute the Merkle root of a transaction sequence.
pub fn merkle_root(transactions: &[Transaction]) -> Hash {
    let leaves: Vec<Hash> = transactions.iter().map(|tx| hash(tx.as_bytes())).collect();
    subtree_root(&leaves)
}

/// Check a claimed root against a transaction sequence.
///
/// The empty sequence is valid only against the empty sentinel.
pub fn verify_merkle_root(root: &Hash, transactions: &[Transaction]) -> bool {
    merkle_root(transactions) == *root
}

/// Root of a subtree over precomputed leaf hashes.
///
/// Each leaf is hashed once by the caller and each internal node once
/// here, so a full build costs O(n) hash invocations.
fn subtree_root(leaves: &[Hash]) -> Hash {
    match leaves.len() {
        0 => Hash::empty(),
        1 => leaves[0].clone(),
        n => {
            let (left, right) = leaves.split_at(n / 2);
            hash_concat(&[subtree_root(left).as_ref(), subtree_root(right).as_ref()])
        }
    }
}

/// A built Merkle tree, caching leaf hashes and the root.
///
/// Use this when the same transaction sequence is verified repeatedly;
/// the leaves are hashed once at build time.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    leaves: Vec<Hash>,
    root: Hash,
}

impl MerkleTree {
    /// Build the tree over a transaction sequence.
    pub fn build(transactions: &[Transaction]) -> Self {
        let leaves: Vec<Hash> = transactions.iter().map(|tx| hash(tx.as_bytes())).collect();
        let root = subtree_root(&leaves);
        Self { leaves, root }
    }

    /// The cached root commitment.
    pub fn root(&self) -> &Hash {
        &self.root
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Check a claimed root against this tree.
    pub fn verify(&self, root: &Hash) -> bool {
        self.root == *root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txs(payloads: &[&str]) -> Vec<Transaction> {
        payloads.iter().map(|p| Transaction::from(*p)).collect()
    }

    #[test]
    fn empty_sequence_commits_to_empty_sentinel() {
        assert_eq!(merkle_root(&[]), Hash::empty());
        assert!(verify_merkle_root(&Hash::empty(), &[]));
    }

    #[test]
    fn empty_root_rejects_nonempty_sequence() {
        assert!(!verify_merkle_root(&Hash::empty(), &txs(&["tx1"])));
    }

    #[test]
    fn single_transaction_root_is_its_leaf_hash() {
        let t = txs(&["tx1"]);
        assert_eq!(merkle_root(&t), hash(b"tx1"));
    }

    #[test]
    fn two_transactions_concatenate_leaf_digests() {
        let t = txs(&["tx1", "tx2"]);
        let left = hash(b"tx1");
        let right = hash(b"tx2");
        let expected = hash_concat(&[left.as_ref(), right.as_ref()]);
        assert_eq!(merkle_root(&t), expected);
    }

    #[test]
    fn odd_split_is_left_biased() {
        // 5 leaves: left half gets 2, right half gets 3.
        let t = txs(&["a", "b", "c", "d", "e"]);
        let left = merkle_root(&t[..2]);
        let right = merkle_root(&t[2..]);
        let expected = hash_concat(&[left.as_ref(), right.as_ref()]);
        assert_eq!(merkle_root(&t), expected);
    }

    #[test]
    fn root_is_deterministic() {
        let t = txs(&["tx1", "tx2", "tx3", "tx4", "tx5", "tx6", "tx7"]);
        assert_eq!(merkle_root(&t), merkle_root(&t));
    }

    #[test]
    fn root_verifies_for_nonempty_sequences() {
        for n in 1..12 {
            let payloads: Vec<String> = (0..n).map(|i| format!("tx{}", i)).collect();
            let t: Vec<Transaction> = payloads.iter().map(|p| Transaction::new(p)).collect();
            let root = merkle_root(&t);
            assert!(verify_merkle_root(&root, &t), "n = {}", n);
        }
    }

    #[test]
    fn changing_one_element_changes_the_root() {
        let original = txs(&["tx1", "tx2", "tx3", "tx4"]);
        let root = merkle_root(&original);
        for i in 0..original.len() {
            let mut tampered = original.clone();
            tampered[i] = Transaction::from("tampered");
            assert_ne!(merkle_root(&tampered), root, "element {}", i);
        }
    }

    #[test]
    fn order_matters() {
        let forward = txs(&["tx1", "tx2", "tx3"]);
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_ne!(merkle_root(&forward), merkle_root(&reversed));
    }

    #[test]
    fn built_tree_matches_free_function() {
        let t = txs(&["tx1", "tx2", "tx3", "tx4", "tx5"]);
        let tree = MerkleTree::build(&t);
        assert_eq!(*tree.root(), merkle_root(&t));
        assert_eq!(tree.leaf_count(), 5);
        assert!(tree.verify(&merkle_root(&t)));
        assert!(!tree.verify(&hash(b"wrong")));
    }
}
