//! # Ledger Blocks
//!
//! A [`Block`] records one reward transaction. It is immutable once the
//! Chain Store has accepted it. A [`BlockDraft`] is the unhashed content a
//! submitter proposes; the Sequencer assigns `index`, `timestamp` and
//! `previous_hash`, and the codec seals the `hash`.

use serde::{Deserialize, Serialize};
use wcl_core::{Coins, Digest, Memo, Timestamp, Username, ValidationError};

/// What produced a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A citizen's photo leak report (fixed reward).
    LeakReport,
    /// An administrator-initiated credit (admin-chosen amount).
    ManualCredit,
}

impl EventKind {
    /// Wire name, as used in requests and in the block hash.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeakReport => "leak_report",
            Self::ManualCredit => "manual_credit",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "leak_report" => Ok(Self::LeakReport),
            "manual_credit" => Ok(Self::ManualCredit),
            other => Err(ValidationError::UnknownEventKind(other.to_string())),
        }
    }
}

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub index: u64,
    /// Server clock at append time.
    pub timestamp: Timestamp,
    /// Reward recipient.
    pub username: Username,
    /// Credited amount.
    pub reward: Coins,
    /// Event that produced the reward.
    pub event: EventKind,
    /// Optional reason or report description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<Memo>,
    /// Hash of the preceding block, or the genesis sentinel.
    pub previous_hash: Digest,
    /// SHA-256 over the canonical form of every other field.
    pub hash: Digest,
}

impl Block {
    /// True when this block was produced by a leak report.
    pub fn is_leak_report(&self) -> bool {
        self.event == EventKind::LeakReport
    }
}

/// Unhashed block content proposed to the Sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDraft {
    /// Reward recipient.
    pub username: Username,
    /// Credited amount.
    pub reward: Coins,
    /// Event that produced the reward.
    pub event: EventKind,
    /// Optional reason or report description.
    pub memo: Option<Memo>,
}

impl BlockDraft {
    /// Build a draft from already-validated parts.
    pub fn new(username: Username, reward: Coins, event: EventKind, memo: Option<Memo>) -> Self {
        Self {
            username,
            reward,
            event,
            memo,
        }
    }

    /// Validate raw inputs into a draft.
    ///
    /// Fails fast on an empty username, a non-finite or over-precise reward
    /// or an oversized memo. No hashing happens for rejected input.
    pub fn from_raw(
        username: &str,
        reward: f64,
        event: EventKind,
        memo: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let username = Username::new(username)?;
        let reward = Coins::from_f64(reward)?;
        let memo = match memo {
            Some(text) => Memo::new(text)?,
            None => None,
        };
        Ok(Self::new(username, reward, event, memo))
    }
}
