//! # Ledger
//!
//! One handle wiring Reward Policy, Sequencer, Chain Store and Query
//! Engine together. Handlers hold an `Arc<Ledger>` and call the operation
//! they serve; every method returns the payload that operation responds
//! with.
//!
//! ## Write path
//!
//! ```text
//! RewardRequest ─► RewardPolicy::validate ─► Sequencer::submit ─► ChainStore::append
//!                  (no lock held)              (exclusive)          (write + fsync)
//! ```

use std::sync::Arc;

use wcl_core::Username;

use crate::block::Block;
use crate::codec::{Clock, SystemClock};
use crate::config::{ConfigError, LedgerConfig};
use crate::error::LedgerError;
use crate::log::JsonlLog;
use crate::policy::{RewardPolicy, RewardRequest};
use crate::query::LedgerQuery;
use crate::sequencer::Sequencer;
use crate::store::{ChainStore, ChainVerification};
use crate::views::{HistoryView, LedgerView, ProfileView, RewardReceipt, TransactionReceipt};

/// Proof that an operator explicitly asked to wipe the chain.
///
/// The reward path never constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetAuthorization {
    operator: String,
}

impl ResetAuthorization {
    /// Authorize an irreversible reset on behalf of `operator`.
    pub fn irreversible(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
        }
    }

    /// Who authorized the reset.
    pub fn operator(&self) -> &str {
        &self.operator
    }
}

/// The reward ledger.
#[derive(Debug)]
pub struct Ledger {
    store: Arc<ChainStore>,
    sequencer: Sequencer,
    query: LedgerQuery,
    policy: RewardPolicy,
}

impl Ledger {
    /// Assemble a ledger from its parts.
    pub fn new(store: Arc<ChainStore>, policy: RewardPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            sequencer: Sequencer::new(Arc::clone(&store), clock),
            query: LedgerQuery::new(Arc::clone(&store)),
            store,
            policy,
        }
    }

    /// A volatile ledger with wall-clock timestamps.
    pub fn in_memory(policy: RewardPolicy) -> Self {
        Self::new(Arc::new(ChainStore::in_memory()), policy, Arc::new(SystemClock))
    }

    /// Open the file-backed ledger described by `config`.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let policy = RewardPolicy::from_config(&config.policy)
            .map_err(|e| ConfigError::Invalid(format!("policy.known_users: {e}")))?;
        let store = ChainStore::open(JsonlLog::in_dir(&config.data_dir)?)?;
        Ok(Self::new(Arc::new(store), policy, Arc::new(SystemClock)))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<ChainStore> {
        &self.store
    }

    /// The query engine.
    pub fn query(&self) -> &LedgerQuery {
        &self.query
    }

    /// The reward policy.
    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    /// Validate and commit one reward request.
    pub fn submit(&self, request: &RewardRequest) -> Result<Block, LedgerError> {
        let draft = self.policy.validate(request).map_err(|e| {
            tracing::warn!(
                username = %request.username,
                event = %request.event.kind(),
                error = %e,
                "reward request rejected"
            );
            e
        })?;
        self.sequencer.submit(move |_| Ok(draft))
    }

    /// `add-reward`: credit `username` for an event named by `event_kind`.
    pub fn add_reward(&self, username: &str, event_kind: &str) -> Result<RewardReceipt, LedgerError> {
        let request = RewardRequest::from_parts(username, event_kind, None, None).map_err(|e| {
            tracing::warn!(%username, %event_kind, error = %e, "reward request rejected");
            e
        })?;
        let block = self.submit(&request)?;
        Ok(RewardReceipt::from(&block))
    }

    /// `add-transaction`: an administrator credit.
    pub fn add_transaction(
        &self,
        username: &str,
        amount: f64,
        reason: Option<&str>,
    ) -> Result<TransactionReceipt, LedgerError> {
        let request = RewardRequest::manual_credit(username, amount, reason.map(str::to_owned));
        let block = self.submit(&request)?;
        Ok(TransactionReceipt::from(&block))
    }

    /// `ledger`: the whole chain.
    pub fn ledger(&self) -> LedgerView {
        LedgerView {
            chain: self.query.full_ledger().to_vec(),
        }
    }

    /// `profile`: balance and report count. Unknown users have zero of both.
    pub fn profile(&self, username: &str) -> Result<ProfileView, LedgerError> {
        let username = Username::new(username)?;
        let summary = self.query.profile(&username);
        Ok(ProfileView {
            username,
            coins: summary.balance,
            reports: summary.reports,
        })
    }

    /// `history`: the user's blocks in chain order.
    pub fn history(&self, username: &str) -> Result<HistoryView, LedgerError> {
        let username = Username::new(username)?;
        Ok(HistoryView {
            reports: self.query.history_of(&username),
        })
    }

    /// `verify`: check every chain invariant.
    pub fn verify(&self) -> ChainVerification {
        let report = self.query.verify();
        if !report.valid {
            tracing::error!(
                location = %self.store.location(),
                first_bad_index = ?report.first_bad_index,
                fault = ?report.fault,
                "chain verification failed"
            );
        }
        report
    }

    /// Remove every block. The next committed block is index 0 again.
    ///
    /// Waits for any in-flight submission, then purges under the same
    /// exclusive section. Returns how many blocks were removed.
    pub fn administrative_reset(
        &self,
        authorization: ResetAuthorization,
    ) -> Result<usize, LedgerError> {
        let removed = self
            .sequencer
            .exclusive(|store| store.purge(&authorization))?;
        tracing::warn!(
            operator = %authorization.operator(),
            removed,
            location = %self.store.location(),
            "administrative reset: chain purged"
        );
        Ok(removed)
    }
}
