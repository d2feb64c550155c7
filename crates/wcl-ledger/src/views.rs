//! Response payloads of the ledger's external operations.
//!
//! These serialize exactly as an HTTP layer would return them, so a
//! handler can pass them straight to its JSON encoder.

use serde::{Deserialize, Serialize};
use wcl_core::{Coins, Digest, Username};

use crate::block::Block;

/// Result of `add-reward`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardReceipt {
    /// Index of the committed block.
    pub block_index: u64,
    /// Hash of the committed block.
    pub hash: Digest,
    /// Amount credited.
    pub reward: Coins,
}

impl From<&Block> for RewardReceipt {
    fn from(block: &Block) -> Self {
        Self {
            block_index: block.index,
            hash: block.hash,
            reward: block.reward,
        }
    }
}

/// Result of `add-transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Index of the committed block.
    pub block_index: u64,
    /// Hash of the committed block.
    pub hash: Digest,
    /// Confirmation text for the administrator.
    pub message: String,
}

impl From<&Block> for TransactionReceipt {
    fn from(block: &Block) -> Self {
        Self {
            block_index: block.index,
            hash: block.hash,
            message: format!("credited {} to {}", block.reward, block.username),
        }
    }
}

/// Result of `ledger`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerView {
    /// Every block in chain order.
    pub chain: Vec<Block>,
}

/// Result of `profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    /// The queried user.
    pub username: Username,
    /// Current balance.
    pub coins: Coins,
    /// Number of leak reports.
    pub reports: u64,
}

/// Result of `history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryView {
    /// The user's blocks in chain order.
    pub reports: Vec<Block>,
}
