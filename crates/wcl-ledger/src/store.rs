//! # Chain Store
//!
//! Ordered, append-only collection of blocks with integrity invariants and
//! durable persistence through a [`BlockLog`].
//!
//! ## Integrity Model
//!
//! 1. `chain[0].index == 0` and `chain[0].previous_hash` is the genesis sentinel.
//! 2. Indices increase by exactly one.
//! 3. Every `previous_hash` equals the preceding block's `hash`.
//! 4. Every `hash` equals the recomputed content hash of its block.
//!
//! [`ChainStore::append`] refuses any block that would break one of these.
//! [`ChainStore::verify_chain`] re-checks all four over a snapshot and
//! reports the first offending index, which is how tampering with the
//! persisted file is detected.
//!
//! A persisted record that cannot be decoded at all is reported the same
//! way, as [`VerificationFault::UnreadableRecord`] at its position. The
//! store still opens over the decodable prefix and serves reads, but
//! refuses appends until an administrative reset.
//!
//! ## Concurrency
//!
//! Commits are serialized by the log mutex and persisted before the new
//! snapshot is published. Readers clone an `Arc` under a short read lock,
//! so a reader sees either the chain before a commit or after it, never a
//! partial block.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wcl_core::Digest;

use crate::block::Block;
use crate::codec::{compute_block_hash, GENESIS_SENTINEL};
use crate::error::{ChainIntegrityError, LedgerError, StorageError};
use crate::ledger::ResetAuthorization;
use crate::log::{BlockLog, LoadedChain, MemoryLog, UnreadableRecord};

/// Immutable point-in-time view of the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSnapshot(Arc<Vec<Block>>);

impl ChainSnapshot {
    /// The last block, if any.
    pub fn tail(&self) -> Option<&Block> {
        self.0.last()
    }

    /// Copy the blocks out of the snapshot.
    pub fn to_vec(&self) -> Vec<Block> {
        self.0.as_ref().clone()
    }
}

impl Deref for ChainSnapshot {
    type Target = [Block];

    fn deref(&self) -> &[Block] {
        &self.0
    }
}

/// Why a chain failed verification.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationFault {
    /// The first block does not link to the genesis sentinel.
    #[error("genesis block links to {actual} instead of the genesis sentinel")]
    GenesisSentinel {
        /// The `previous_hash` found on block 0.
        actual: Digest,
    },

    /// A block's index is not its position in the chain.
    #[error("index gap: expected {expected}, found {actual}")]
    IndexGap {
        /// The position in the chain.
        expected: u64,
        /// The index stored on the block.
        actual: u64,
    },

    /// A block's `previous_hash` does not match its predecessor.
    #[error("broken link: expected previous_hash {expected}, found {actual}")]
    BrokenLink {
        /// Hash of the preceding block.
        expected: Digest,
        /// The `previous_hash` stored on the block.
        actual: Digest,
    },

    /// A block's content no longer matches its stored hash.
    #[error("hash mismatch: stored {stored}")]
    HashMismatch {
        /// The hash stored on the block.
        stored: Digest,
        /// The hash recomputed from the block's content, when computable.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recomputed: Option<Digest>,
    },

    /// The persisted record at this position could not be decoded.
    #[error("unreadable record at line {line}: {reason}")]
    UnreadableRecord {
        /// 1-based line in the backing log.
        line: usize,
        /// Decoder message.
        reason: String,
    },
}

/// Outcome of a full-chain verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// True when every invariant holds for every block.
    pub valid: bool,
    /// Position of the first block that breaks an invariant.
    pub first_bad_index: Option<u64>,
    /// What was wrong with that block.
    pub fault: Option<VerificationFault>,
}

impl ChainVerification {
    fn ok() -> Self {
        Self {
            valid: true,
            first_bad_index: None,
            fault: None,
        }
    }

    fn failed(index: u64, fault: VerificationFault) -> Self {
        Self {
            valid: false,
            first_bad_index: Some(index),
            fault: Some(fault),
        }
    }
}

/// Check every chain invariant over `blocks`, stopping at the first failure.
pub fn verify_blocks(blocks: &[Block]) -> ChainVerification {
    let mut expected_prev = GENESIS_SENTINEL;
    for (position, block) in blocks.iter().enumerate() {
        let position = position as u64;

        if block.index != position {
            return ChainVerification::failed(
                position,
                VerificationFault::IndexGap {
                    expected: position,
                    actual: block.index,
                },
            );
        }

        if block.previous_hash != expected_prev {
            let fault = if position == 0 {
                VerificationFault::GenesisSentinel {
                    actual: block.previous_hash,
                }
            } else {
                VerificationFault::BrokenLink {
                    expected: expected_prev,
                    actual: block.previous_hash,
                }
            };
            return ChainVerification::failed(position, fault);
        }

        match compute_block_hash(block) {
            Ok(recomputed) if recomputed == block.hash => {}
            recomputed => {
                return ChainVerification::failed(
                    position,
                    VerificationFault::HashMismatch {
                        stored: block.hash,
                        recomputed: recomputed.ok(),
                    },
                );
            }
        }

        expected_prev = block.hash;
    }
    ChainVerification::ok()
}

/// The single owner of the chain.
#[derive(Debug)]
pub struct ChainStore {
    snapshot: RwLock<Arc<Vec<Block>>>,
    unreadable: RwLock<Option<UnreadableRecord>>,
    log: Mutex<Box<dyn BlockLog>>,
    location: String,
}

impl ChainStore {
    /// Load the chain persisted in `log`.
    ///
    /// A chain that fails verification still opens: the failure is logged
    /// at error level and reported again by every [`Self::verify_chain`].
    pub fn open(log: impl BlockLog + 'static) -> Result<Self, StorageError> {
        let mut log: Box<dyn BlockLog> = Box::new(log);
        let LoadedChain { blocks, unreadable } = log.load()?;
        let location = log.describe();

        let report = verify_loaded(&blocks, unreadable.as_ref());
        if let (false, Some(index), Some(fault)) =
            (report.valid, report.first_bad_index, &report.fault)
        {
            tracing::error!(
                location = %location,
                first_bad_index = index,
                fault = %fault,
                "persisted chain failed verification"
            );
        }
        tracing::info!(location = %location, blocks = blocks.len(), "chain store opened");

        Ok(Self {
            snapshot: RwLock::new(Arc::new(blocks)),
            unreadable: RwLock::new(unreadable),
            log: Mutex::new(log),
            location,
        })
    }

    /// An empty, volatile store.
    pub fn in_memory() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Vec::new())),
            unreadable: RwLock::new(None),
            log: Mutex::new(Box::new(MemoryLog::new())),
            location: "memory".to_string(),
        }
    }

    /// Where the chain is persisted.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Durably append `block` as the new tail.
    ///
    /// The block must carry `index == len()`, link to the current tail hash
    /// (or the genesis sentinel) and carry its own correct content hash.
    /// On any error the store is unchanged.
    pub fn append(&self, block: Block) -> Result<(), LedgerError> {
        let mut log = self.log.lock();

        if let Some(unreadable) = &*self.unreadable.read() {
            return Err(ChainIntegrityError::UnreadableRecord {
                position: unreadable.position,
            }
            .into());
        }

        {
            let current = self.snapshot.read();
            let expected_index = current.len() as u64;
            if block.index != expected_index {
                return Err(ChainIntegrityError::IndexMismatch {
                    expected: expected_index,
                    actual: block.index,
                }
                .into());
            }
            let expected_prev = current.last().map_or(GENESIS_SENTINEL, |b| b.hash);
            if block.previous_hash != expected_prev {
                return Err(ChainIntegrityError::PreviousHashMismatch {
                    index: block.index,
                    expected: expected_prev,
                    actual: block.previous_hash,
                }
                .into());
            }
        }

        let recomputed = compute_block_hash(&block)?;
        if recomputed != block.hash {
            return Err(ChainIntegrityError::HashMismatch {
                index: block.index,
                stored: block.hash,
                recomputed,
            }
            .into());
        }

        if let Err(e) = log.append(&block) {
            tracing::error!(
                location = %self.location,
                index = block.index,
                error = %e,
                "durable append failed; chain unchanged"
            );
            return Err(e.into());
        }

        let mut published = self.snapshot.write();
        Arc::make_mut(&mut *published).push(block);
        Ok(())
    }

    /// The current last block.
    pub fn tail(&self) -> Option<Block> {
        self.snapshot.read().last().cloned()
    }

    /// A consistent snapshot of the whole chain.
    pub fn all(&self) -> ChainSnapshot {
        ChainSnapshot(Arc::clone(&*self.snapshot.read()))
    }

    /// Number of committed blocks.
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    /// True when no block has been committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verify every invariant over the current snapshot.
    pub fn verify_chain(&self) -> ChainVerification {
        let unreadable = self.unreadable.read();
        verify_loaded(&self.all(), unreadable.as_ref())
    }

    /// Remove every block, persisted and in memory. Returns how many were
    /// removed, counting an unreadable record and anything after it as one.
    pub(crate) fn purge(&self, _authorization: &ResetAuthorization) -> Result<usize, StorageError> {
        let mut log = self.log.lock();
        log.purge()?;
        let mut unreadable = self.unreadable.write();
        let mut published = self.snapshot.write();
        let removed = published.len() + usize::from(unreadable.is_some());
        *published = Arc::new(Vec::new());
        *unreadable = None;
        Ok(removed)
    }
}

fn verify_loaded(blocks: &[Block], unreadable: Option<&UnreadableRecord>) -> ChainVerification {
    let report = verify_blocks(blocks);
    match unreadable {
        Some(record) if report.valid => ChainVerification::failed(
            record.position,
            VerificationFault::UnreadableRecord {
                line: record.line,
                reason: record.reason.clone(),
            },
        ),
        _ => report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockDraft, EventKind};
    use crate::codec::{build_block, FixedClock};
    use wcl_core::{Coins, Timestamp};

    fn clock() -> FixedClock {
        FixedClock::stepping(Timestamp::parse("2026-01-15T12:00:00Z").unwrap(), 1_000)
    }

    fn next_block(store: &ChainStore, user: &str, reward: f64, clock: &FixedClock) -> Block {
        let draft = BlockDraft::from_raw(user, reward, EventKind::LeakReport, None).unwrap();
        let prev = store.tail().map_or(GENESIS_SENTINEL, |b| b.hash);
        build_block(store.len() as u64, draft, prev, clock).unwrap()
    }

    fn three_block_store() -> ChainStore {
        let clock = clock();
        let store = ChainStore::in_memory();
        for (user, reward) in [("alice", 5.0), ("bob", 12.5), ("carol", 5.0)] {
            store.append(next_block(&store, user, reward, &clock)).unwrap();
        }
        store
    }

    /// Log that fails every append while `failing` is set.
    #[derive(Debug, Default)]
    struct FlakyLog {
        inner: MemoryLog,
        failing: Arc<std::sync::atomic::AtomicBool>,
    }

    impl BlockLog for FlakyLog {
        fn load(&mut self) -> Result<LoadedChain, StorageError> {
            self.inner.load()
        }

        fn append(&mut self, block: &Block) -> Result<(), StorageError> {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".into()));
            }
            self.inner.append(block)
        }

        fn purge(&mut self) -> Result<(), StorageError> {
            self.inner.purge()
        }

        fn describe(&self) -> String {
            "flaky".into()
        }
    }

    #[test]
    fn test_empty_store() {
        let store = ChainStore::in_memory();
        assert!(store.is_empty());
        assert_eq!(store.tail(), None);
        assert!(store.all().is_empty());
        assert_eq!(store.verify_chain(), ChainVerification::ok());
    }

    #[test]
    fn test_append_links_blocks() {
        let store = three_block_store();
        let chain = store.all();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].previous_hash, GENESIS_SENTINEL);
        assert_eq!(chain[1].previous_hash, chain[0].hash);
        assert_eq!(chain[2].previous_hash, chain[1].hash);
        assert_eq!(store.tail().unwrap().index, 2);
        assert!(store.verify_chain().valid);
    }

    #[test]
    fn test_index_mismatch_rejected() {
        let clock = clock();
        let store = three_block_store();
        let mut block = next_block(&store, "dave", 5.0, &clock);
        block.index = 7;
        block.hash = compute_block_hash(&block).unwrap();

        let err = store.append(block).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ChainIntegrity(ChainIntegrityError::IndexMismatch {
                expected: 3,
                actual: 7
            })
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_stale_previous_hash_rejected() {
        let clock = clock();
        let store = three_block_store();
        let stale = store.all()[1].hash;
        let draft = BlockDraft::from_raw("dave", 5.0, EventKind::LeakReport, None).unwrap();
        let block = build_block(3, draft, stale, &clock).unwrap();

        let err = store.append(block).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ChainIntegrity(ChainIntegrityError::PreviousHashMismatch { index: 3, .. })
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_forged_hash_rejected() {
        let clock = clock();
        let store = ChainStore::in_memory();
        let mut block = next_block(&store, "alice", 5.0, &clock);
        block.reward = Coins::from_hundredths(100_000);

        let err = store.append(block).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ChainIntegrity(ChainIntegrityError::HashMismatch { index: 0, .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_tampered_reward_reports_first_bad_index() {
        let mut blocks = three_block_store().all().to_vec();
        blocks[1].reward = Coins::from_hundredths(1_000_000);

        let store = ChainStore::open(MemoryLog::with_blocks(blocks)).unwrap();
        let report = store.verify_chain();
        assert!(!report.valid);
        assert_eq!(report.first_bad_index, Some(1));
        assert!(matches!(
            report.fault,
            Some(VerificationFault::HashMismatch { recomputed: Some(_), .. })
        ));
    }

    #[test]
    fn test_verification_is_repeatable() {
        let store = three_block_store();
        assert_eq!(store.verify_chain(), store.verify_chain());

        let mut blocks = store.all().to_vec();
        blocks[1].reward = Coins::from_hundredths(1_000_000);
        let tampered = ChainStore::open(MemoryLog::with_blocks(blocks)).unwrap();
        let first = tampered.verify_chain();
        assert!(!first.valid);
        assert_eq!(first, tampered.verify_chain());
    }

    /// Log whose persisted contents end in a record that failed to decode.
    #[derive(Debug)]
    struct DamagedLog {
        blocks: Vec<Block>,
    }

    impl BlockLog for DamagedLog {
        fn load(&mut self) -> Result<LoadedChain, StorageError> {
            Ok(LoadedChain {
                blocks: self.blocks.clone(),
                unreadable: Some(UnreadableRecord {
                    position: self.blocks.len() as u64,
                    line: self.blocks.len() + 1,
                    reason: "amount 5.001 has more than two fractional digits".into(),
                }),
            })
        }

        fn append(&mut self, block: &Block) -> Result<(), StorageError> {
            self.blocks.push(block.clone());
            Ok(())
        }

        fn purge(&mut self) -> Result<(), StorageError> {
            self.blocks.clear();
            Ok(())
        }

        fn describe(&self) -> String {
            "damaged".into()
        }
    }

    #[test]
    fn test_unreadable_record_is_a_fault_not_an_open_error() {
        let clock = clock();
        let prefix = three_block_store().all()[..1].to_vec();
        let store = ChainStore::open(DamagedLog { blocks: prefix }).unwrap();
        assert_eq!(store.len(), 1);

        let report = store.verify_chain();
        assert!(!report.valid);
        assert_eq!(report.first_bad_index, Some(1));
        assert!(matches!(
            report.fault,
            Some(VerificationFault::UnreadableRecord { line: 2, .. })
        ));
        assert_eq!(report, store.verify_chain());

        let err = store.append(next_block(&store, "dave", 5.0, &clock)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ChainIntegrity(ChainIntegrityError::UnreadableRecord { position: 1 })
        ));
        assert_eq!(store.len(), 1);

        let removed = store.purge(&ResetAuthorization::irreversible("test")).unwrap();
        assert_eq!(removed, 2);
        assert!(store.verify_chain().valid);
        store.append(next_block(&store, "dave", 5.0, &clock)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_earlier_fault_wins_over_unreadable_record() {
        let mut blocks = three_block_store().all().to_vec();
        blocks[0].reward = Coins::from_hundredths(9_999);
        let store = ChainStore::open(DamagedLog { blocks }).unwrap();
        let report = store.verify_chain();
        assert_eq!(report.first_bad_index, Some(0));
        assert!(matches!(report.fault, Some(VerificationFault::HashMismatch { .. })));
    }

    #[test]
    fn test_broken_link_detected() {
        let mut blocks = three_block_store().all().to_vec();
        blocks[2].previous_hash = Digest::from_bytes([7; 32]);
        let report = verify_blocks(&blocks);
        assert_eq!(report.first_bad_index, Some(2));
        assert!(matches!(report.fault, Some(VerificationFault::BrokenLink { .. })));
    }

    #[test]
    fn test_wrong_genesis_sentinel_detected() {
        let mut blocks = three_block_store().all().to_vec();
        blocks[0].previous_hash = Digest::from_bytes([1; 32]);
        let report = verify_blocks(&blocks);
        assert_eq!(report.first_bad_index, Some(0));
        assert!(matches!(report.fault, Some(VerificationFault::GenesisSentinel { .. })));
    }

    #[test]
    fn test_removed_block_detected_as_index_gap() {
        let mut blocks = three_block_store().all().to_vec();
        blocks.remove(1);
        let report = verify_blocks(&blocks);
        assert_eq!(report.first_bad_index, Some(1));
        assert_eq!(
            report.fault,
            Some(VerificationFault::IndexGap {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_appends() {
        let clock = clock();
        let store = three_block_store();
        let before = store.all();
        store.append(next_block(&store, "dave", 5.0, &clock)).unwrap();
        assert_eq!(before.len(), 3);
        assert_eq!(store.all().len(), 4);
    }

    #[test]
    fn test_storage_failure_leaves_chain_unchanged() {
        let clock = clock();
        let failing = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let store = ChainStore::open(FlakyLog {
            inner: MemoryLog::new(),
            failing: Arc::clone(&failing),
        })
        .unwrap();
        store.append(next_block(&store, "alice", 5.0, &clock)).unwrap();
        let tail = store.tail();

        failing.store(true, std::sync::atomic::Ordering::SeqCst);
        let block = next_block(&store, "bob", 12.5, &clock);
        let err = store.append(block.clone()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.len(), 1);
        assert_eq!(store.tail(), tail);

        failing.store(false, std::sync::atomic::Ordering::SeqCst);
        store.append(block).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.verify_chain().valid);
    }

    #[test]
    fn test_purge_empties_store() {
        let store = three_block_store();
        let removed = store
            .purge(&ResetAuthorization::irreversible("test"))
            .unwrap();
        assert_eq!(removed, 3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_verification_serializes_with_fault_kind() {
        let report = ChainVerification::failed(
            4,
            VerificationFault::IndexGap {
                expected: 4,
                actual: 5,
            },
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["first_bad_index"], 4);
        assert_eq!(json["fault"]["kind"], "index_gap");
    }
}
