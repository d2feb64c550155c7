//! # Query Engine
//!
//! Read-only folds over a chain snapshot. Each call takes one snapshot
//! from the [`ChainStore`] and never holds a lock while it computes, so a
//! long query never stalls the Sequencer.

use std::collections::BTreeMap;
use std::sync::Arc;

use wcl_core::{Coins, Username};

use crate::block::Block;
use crate::store::{ChainSnapshot, ChainStore, ChainVerification};

/// Balance and report count of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserSummary {
    /// Sum of every reward credited to the user.
    pub balance: Coins,
    /// Number of the user's leak-report blocks.
    pub reports: u64,
    /// Sum of rewards from leak reports only.
    pub report_rewards: Coins,
}

/// Queries over a shared [`ChainStore`].
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    store: Arc<ChainStore>,
}

impl LedgerQuery {
    /// Query engine reading from `store`.
    pub fn new(store: Arc<ChainStore>) -> Self {
        Self { store }
    }

    fn blocks_of<'a>(
        snapshot: &'a ChainSnapshot,
        username: &'a Username,
    ) -> impl Iterator<Item = &'a Block> + 'a {
        snapshot.iter().filter(move |b| &b.username == username)
    }

    /// Sum of `reward` over the user's blocks; zero for an unknown user.
    pub fn balance_of(&self, username: &Username) -> Coins {
        let snapshot = self.store.all();
        Self::blocks_of(&snapshot, username).map(|b| b.reward).sum()
    }

    /// Number of the user's blocks produced by leak reports.
    pub fn report_count_of(&self, username: &Username) -> u64 {
        let snapshot = self.store.all();
        Self::blocks_of(&snapshot, username)
            .filter(|b| b.is_leak_report())
            .count() as u64
    }

    /// The user's blocks in chain order.
    pub fn history_of(&self, username: &Username) -> Vec<Block> {
        let snapshot = self.store.all();
        Self::blocks_of(&snapshot, username).cloned().collect()
    }

    /// The whole chain.
    pub fn full_ledger(&self) -> ChainSnapshot {
        self.store.all()
    }

    /// Balance and report count from a single snapshot.
    pub fn profile(&self, username: &Username) -> UserSummary {
        let snapshot = self.store.all();
        Self::blocks_of(&snapshot, username).fold(UserSummary::default(), |mut acc, b| {
            acc.balance = acc.balance.saturating_add(b.reward);
            if b.is_leak_report() {
                acc.reports += 1;
                acc.report_rewards = acc.report_rewards.saturating_add(b.reward);
            }
            acc
        })
    }

    /// Every user's balance from a single snapshot.
    pub fn balances(&self) -> BTreeMap<Username, Coins> {
        let snapshot = self.store.all();
        let mut balances = BTreeMap::new();
        for block in snapshot.iter() {
            let entry = balances.entry(block.username.clone()).or_insert(Coins::ZERO);
            *entry = entry.saturating_add(block.reward);
        }
        balances
    }

    /// Verify the whole chain.
    pub fn verify(&self) -> ChainVerification {
        self.store.verify_chain()
    }
}
