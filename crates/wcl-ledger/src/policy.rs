//! # Reward Policy
//!
//! Maps an incoming event to a reward and validates the request before it
//! reaches the Sequencer. Everything here is pure and lock-free; a request
//! that fails validation never touches the chain.
//!
//! Leak-report rewards are fixed and server-determined. A client-supplied
//! amount is never part of [`RewardEvent::LeakReport`], so a tampered
//! client cannot choose its own reward. Manual credits carry the
//! administrator's amount and are bounded by configuration.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use wcl_core::{Coins, Memo, Username, ValidationError};

use crate::block::{BlockDraft, EventKind};
use crate::config::PolicyConfig;

/// Answers whether a username references an existing account.
pub trait UserDirectory: Send + Sync + fmt::Debug {
    /// True when `username` may receive credits.
    fn contains(&self, username: &Username) -> bool;
}

/// Directory that accepts every well-formed username.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenDirectory;

impl UserDirectory for OpenDirectory {
    fn contains(&self, _username: &Username) -> bool {
        true
    }
}

/// Directory backed by a fixed list of accounts.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: BTreeSet<Username>,
}

impl StaticDirectory {
    /// Build from raw usernames. Invalid names are rejected.
    pub fn new<I, S>(users: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let users = users
            .into_iter()
            .map(Username::new)
            .collect::<Result<_, _>>()?;
        Ok(Self { users })
    }
}

impl UserDirectory for StaticDirectory {
    fn contains(&self, username: &Username) -> bool {
        self.users.contains(username)
    }
}

/// The event a reward is requested for.
#[derive(Debug, Clone, PartialEq)]
pub enum RewardEvent {
    /// A citizen leak report. The reward is fixed by policy.
    LeakReport {
        /// Optional report description (zone, notes).
        details: Option<String>,
    },
    /// An administrator credit.
    ManualCredit {
        /// Requested amount in coins.
        amount: f64,
        /// Optional reason shown in the ledger.
        reason: Option<String>,
    },
}

impl RewardEvent {
    /// The block event kind this request produces.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::LeakReport { .. } => EventKind::LeakReport,
            Self::ManualCredit { .. } => EventKind::ManualCredit,
        }
    }

    fn memo(&self) -> Option<&str> {
        match self {
            Self::LeakReport { details } => details.as_deref(),
            Self::ManualCredit { reason, .. } => reason.as_deref(),
        }
    }
}

/// A reward request as received from a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardRequest {
    /// Raw recipient name.
    pub username: String,
    /// What is being rewarded.
    pub event: RewardEvent,
}

impl RewardRequest {
    /// A leak-report request.
    pub fn leak_report(username: impl Into<String>, details: Option<String>) -> Self {
        Self {
            username: username.into(),
            event: RewardEvent::LeakReport { details },
        }
    }

    /// A manual-credit request.
    pub fn manual_credit(username: impl Into<String>, amount: f64, reason: Option<String>) -> Self {
        Self {
            username: username.into(),
            event: RewardEvent::ManualCredit { amount, reason },
        }
    }

    /// Build a request from an untyped `(username, eventKind, amount?)` triple.
    ///
    /// `leak_report` discards any supplied amount. `manual_credit` requires one.
    pub fn from_parts(
        username: impl Into<String>,
        event_kind: &str,
        amount: Option<f64>,
        memo: Option<String>,
    ) -> Result<Self, ValidationError> {
        let username = username.into();
        match event_kind.parse::<EventKind>()? {
            EventKind::LeakReport => {
                if amount.is_some() {
                    tracing::debug!(%username, "ignoring client-supplied amount on leak report");
                }
                Ok(Self::leak_report(username, memo))
            }
            EventKind::ManualCredit => {
                let amount = amount.ok_or_else(|| {
                    ValidationError::MissingAmount(EventKind::ManualCredit.to_string())
                })?;
                Ok(Self::manual_credit(username, amount, memo))
            }
        }
    }
}

/// Computes and validates rewards.
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    leak_report_reward: Coins,
    max_manual_credit: Coins,
    allow_debits: bool,
    directory: Arc<dyn UserDirectory>,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        let config = PolicyConfig::default();
        Self {
            leak_report_reward: config.leak_report_reward,
            max_manual_credit: config.max_manual_credit,
            allow_debits: config.allow_debits,
            directory: Arc::new(OpenDirectory),
        }
    }
}

impl RewardPolicy {
    /// Build from configuration. `known_users`, when set, becomes a
    /// [`StaticDirectory`].
    pub fn from_config(config: &PolicyConfig) -> Result<Self, ValidationError> {
        let policy = Self {
            leak_report_reward: config.leak_report_reward,
            max_manual_credit: config.max_manual_credit,
            allow_debits: config.allow_debits,
            directory: Arc::new(OpenDirectory),
        };
        match &config.known_users {
            Some(users) => Ok(policy.with_directory(Arc::new(StaticDirectory::new(users)?))),
            None => Ok(policy),
        }
    }

    /// Replace the user directory.
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Fixed reward for one leak report.
    pub fn leak_report_reward(&self) -> Coins {
        self.leak_report_reward
    }

    /// The reward `event` earns.
    pub fn compute_reward(&self, event: &RewardEvent) -> Result<Coins, ValidationError> {
        match event {
            RewardEvent::LeakReport { .. } => Ok(self.leak_report_reward),
            RewardEvent::ManualCredit { amount, .. } => {
                let amount = Coins::from_f64(*amount)?;
                self.check_manual_amount(amount)?;
                Ok(amount)
            }
        }
    }

    fn check_manual_amount(&self, amount: Coins) -> Result<(), ValidationError> {
        let reject = |reason: String| ValidationError::AmountNotPermitted {
            amount: amount.to_canonical_string(),
            reason,
        };
        if amount.is_zero() {
            return Err(reject("manual credits must be non-zero".into()));
        }
        if amount.is_negative() && !self.allow_debits {
            return Err(reject("debits are disabled".into()));
        }
        if amount.abs() > self.max_manual_credit {
            return Err(reject(format!(
                "exceeds the manual credit limit of {}",
                self.max_manual_credit
            )));
        }
        Ok(())
    }

    /// Validate `request` into the content of the next block.
    pub fn validate(&self, request: &RewardRequest) -> Result<BlockDraft, ValidationError> {
        let username = Username::new(&request.username)?;
        let reward = self.compute_reward(&request.event)?;
        if let RewardEvent::ManualCredit { .. } = request.event {
            if !self.directory.contains(&username) {
                return Err(ValidationError::UnknownRecipient(username.to_string()));
            }
        }
        let memo = match request.event.memo() {
            Some(text) => Memo::new(text)?,
            None => None,
        };
        Ok(BlockDraft::new(username, reward, request.event.kind(), memo))
    }
}
