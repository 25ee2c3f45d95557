//! Cancellable proof-of-work nonce search.
//!
//! A hash satisfies difficulty `d` when its first `d` hex characters are
//! all `'0'`. The search is unbounded: an unsatisfiable difficulty
//! against a fixed header would loop forever, so every miner takes a
//! [`CancelToken`] and returns [`PowError::Cancelled`] instead of a
//! silently wrong nonce. Independent blocks can be mined concurrently on
//! worker threads; each search touches only its own header bytes.

use crate::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How many nonce attempts run between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Errors from the nonce search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("mining cancelled before a valid nonce was found")]
    Cancelled,
}

/// A successful nonce search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowSolution {
    /// The nonce satisfying the difficulty target.
    pub nonce: u64,
    /// The block hash produced by that nonce.
    pub hash: Hash,
}

/// Cooperative cancellation for mining.
///
/// Cloneable and thread-safe: hand one clone to the miner and keep
/// another to cancel from outside. An optional deadline cancels the
/// search once wall-clock time runs out.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that never fires unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that fires after `timeout` has elapsed.
    pub fn with_deadline(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether the search should stop.
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}

/// Whether a hash meets the leading-zero difficulty target.
///
/// Difficulty 0 always passes; the empty sentinel never passes a
/// non-zero difficulty.
pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
    let d = difficulty as usize;
    let s = hash.as_str();
    s.len() >= d && s.bytes().take(d).all(|b| b == b'0')
}

/// Search for a nonce whose hash meets the difficulty target.
///
/// `hash_at` must be a pure function of the nonce (the caller fixes the
/// rest of the header). Nonces are tried in increasing order starting at
/// `start_nonce`, so the search is deterministic for a deterministic
/// hasher. The token is consulted every [`CANCEL_CHECK_INTERVAL`]
/// attempts.
pub fn mine<F>(
    mut hash_at: F,
    difficulty: u32,
    start_nonce: u64,
    cancel: &CancelToken,
) -> Result<PowSolution, PowError>
where
    F: FnMut(u64) -> Hash,
{
    let mut nonce = start_nonce;
    let mut attempts: u64 = 0;
    loop {
        if attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(PowError::Cancelled);
        }
        let hash = hash_at(nonce);
        if meets_difficulty(&hash, difficulty) {
            return Ok(PowSolution { nonce, hash });
        }
        nonce = nonce.wrapping_add(1);
        attempts += 1;
    }
}
