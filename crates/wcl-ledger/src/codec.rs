//! # Block Codec
//!
//! Deterministic serialization and hashing for a single block.
//!
//! ```text
//! hash = SHA256(JCS({event, index, memo?, previous_hash, reward, timestamp, username}))
//! ```
//!
//! Numbers that carry value (`reward`) are canonical decimal strings and
//! timestamps are fixed-precision UTC strings, so the same logical block
//! hashes identically on every machine and in every language. `memo` is
//! omitted from the hashed object when absent.
//!
//! The codec never sees invalid input: a [`BlockDraft`] can only hold a
//! validated username, a finite fixed-point reward and a bounded memo.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;
use wcl_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, Coins, Digest, Memo, Timestamp, Username,
};

use crate::block::{Block, BlockDraft, EventKind};

/// `previous_hash` of the genesis block.
pub const GENESIS_SENTINEL: Digest = Digest::ZERO;

/// Source of block timestamps.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Deterministic clock: starts at a fixed instant and advances by a fixed
/// step on every read.
#[derive(Debug)]
pub struct FixedClock {
    start: Timestamp,
    step_millis: i64,
    ticks: AtomicI64,
}

impl FixedClock {
    /// A clock frozen at `start`.
    pub fn at(start: Timestamp) -> Self {
        Self::stepping(start, 0)
    }

    /// A clock that returns `start`, `start + step`, `start + 2*step`, ...
    pub fn stepping(start: Timestamp, step_millis: i64) -> Self {
        Self {
            start,
            step_millis,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        let millis = self
            .start
            .epoch_millis()
            .saturating_add(tick.saturating_mul(self.step_millis));
        Timestamp::from_epoch_millis(millis).unwrap_or(self.start)
    }
}

#[derive(Serialize)]
struct HashedFields<'a> {
    index: u64,
    timestamp: &'a Timestamp,
    username: &'a Username,
    reward: &'a Coins,
    event: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    memo: Option<&'a Memo>,
    previous_hash: &'a Digest,
}

impl<'a> HashedFields<'a> {
    fn of(block: &'a Block) -> Self {
        Self {
            index: block.index,
            timestamp: &block.timestamp,
            username: &block.username,
            reward: &block.reward,
            event: block.event,
            memo: block.memo.as_ref(),
            previous_hash: &block.previous_hash,
        }
    }
}

/// Canonical bytes of everything in `block` except its own `hash`.
pub fn canonical_block_bytes(block: &Block) -> Result<CanonicalBytes, CanonicalizationError> {
    CanonicalBytes::new(&HashedFields::of(block))
}

/// Recompute the hash a block should carry.
pub fn compute_block_hash(block: &Block) -> Result<Digest, CanonicalizationError> {
    Ok(sha256_digest(&canonical_block_bytes(block)?))
}

/// True when `block.hash` matches its recomputed content hash.
pub fn verify_block_hash(block: &Block) -> bool {
    matches!(compute_block_hash(block), Ok(d) if d == block.hash)
}

/// Build and seal the block at `index` that links to `previous_hash`.
pub fn build_block(
    index: u64,
    draft: BlockDraft,
    previous_hash: Digest,
    clock: &dyn Clock,
) -> Result<Block, CanonicalizationError> {
    let BlockDraft {
        username,
        reward,
        event,
        memo,
    } = draft;
    let mut block = Block {
        index,
        timestamp: clock.now(),
        username,
        reward,
        event,
        memo,
        previous_hash,
        hash: Digest::ZERO,
    };
    block.hash = compute_block_hash(&block)?;
    Ok(block)
}
