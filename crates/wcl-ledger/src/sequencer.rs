//! # Sequencer
//!
//! The single serialization point for chain mutation. Concurrent
//! submitters queue on one mutex; whoever holds it reads the tail, builds
//! the next block against the tail hash and commits it through the
//! [`ChainStore`] before releasing.
//!
//! Validation belongs to the caller and should happen before
//! [`Sequencer::submit`] so the exclusive section stays short. The only
//! blocking work inside it is the durability write.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::block::{Block, BlockDraft};
use crate::codec::{build_block, Clock, GENESIS_SENTINEL};
use crate::error::LedgerError;
use crate::store::ChainStore;

/// Serializes appends to one [`ChainStore`].
pub struct Sequencer {
    store: Arc<ChainStore>,
    clock: Arc<dyn Clock>,
    gate: Mutex<()>,
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("store", &self.store.location())
            .field("len", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl Sequencer {
    /// A sequencer committing to `store` with timestamps from `clock`.
    pub fn new(store: Arc<ChainStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            gate: Mutex::new(()),
        }
    }

    /// The store this sequencer writes to.
    pub fn store(&self) -> &Arc<ChainStore> {
        &self.store
    }

    /// Commit one block.
    ///
    /// `builder` runs inside the exclusive section with the current tail and
    /// returns the content of the next block. At most one builder runs at a
    /// time. Errors from the builder, the codec or the store are returned
    /// unchanged and leave the chain as it was; nothing is retried here.
    pub fn submit<F>(&self, builder: F) -> Result<Block, LedgerError>
    where
        F: FnOnce(Option<&Block>) -> Result<BlockDraft, LedgerError>,
    {
        let _gate = self.gate.lock();

        let snapshot = self.store.all();
        let tail = snapshot.tail();
        let draft = builder(tail)?;

        let index = snapshot.len() as u64;
        let previous_hash = tail.map_or(GENESIS_SENTINEL, |b| b.hash);
        let block = build_block(index, draft, previous_hash, self.clock.as_ref())?;
        drop(snapshot);

        self.store.append(block.clone())?;

        tracing::info!(
            index = block.index,
            username = %block.username,
            reward = %block.reward,
            event = %block.event,
            hash = %block.hash,
            "block committed"
        );
        Ok(block)
    }

    /// Run `f` with no submission in flight.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce(&ChainStore) -> R) -> R {
        let _gate = self.gate.lock();
        f(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::EventKind;
    use crate::codec::FixedClock;
    use std::thread;
    use wcl_core::{Timestamp, ValidationError};

    fn sequencer() -> Sequencer {
        let clock = FixedClock::stepping(Timestamp::parse("2026-01-15T12:00:00Z").unwrap(), 1);
        Sequencer::new(Arc::new(ChainStore::in_memory()), Arc::new(clock))
    }

    fn leak(user: &str) -> Result<BlockDraft, LedgerError> {
        Ok(BlockDraft::from_raw(user, 5.0, EventKind::LeakReport, None)?)
    }

    #[test]
    fn test_builder_sees_current_tail() {
        let seq = sequencer();
        let first = seq
            .submit(|tail| {
                assert!(tail.is_none());
                leak("alice")
            })
            .unwrap();
        let second = seq
            .submit(|tail| {
                assert_eq!(tail.map(|b| b.index), Some(0));
                leak("bob")
            })
            .unwrap();
        assert_eq!(first.previous_hash, GENESIS_SENTINEL);
        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(second.index, 1);
    }

    #[test]
    fn test_builder_error_leaves_chain_unchanged() {
        let seq = sequencer();
        seq.submit(|_| leak("alice")).unwrap();
        let err = seq
            .submit(|_| Err(ValidationError::EmptyUsername.into()))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(seq.store().len(), 1);
    }

    #[test]
    fn test_concurrent_submitters_form_one_chain() {
        let seq = Arc::new(sequencer());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let seq = Arc::clone(&seq);
                thread::spawn(move || {
                    for _ in 0..25 {
                        seq.submit(|_| leak(&format!("user{t}"))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let chain = seq.store().all();
        assert_eq!(chain.len(), 200);
        for (i, block) in chain.iter().enumerate() {
            assert_eq!(block.index, i as u64);
        }
        assert!(seq.store().verify_chain().valid);
    }
}
