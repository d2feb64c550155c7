//! # wcl-ledger — Hash-Chained Reward Ledger
//!
//! Durably, verifiably and concurrently records reward transactions and
//! answers balance and history queries.
//!
//! - **Codec** (`codec.rs`): canonical serialization and SHA-256 hashing
//!   of a single block. Injected `Clock` for timestamps.
//!
//! - **Store** (`store.rs`): append-only chain with index, link and hash
//!   invariants. Snapshots are `Arc`-shared; verification reports the
//!   first bad index.
//!
//! - **Log** (`log.rs`): persistence backends. `JsonlLog` writes one
//!   record per line and syncs before acknowledging; `MemoryLog` is
//!   volatile.
//!
//! - **Sequencer** (`sequencer.rs`): one commit at a time against the
//!   current tail.
//!
//! - **Policy** (`policy.rs`): leak reports earn a fixed reward, manual
//!   credits a bounded admin amount. Validation happens before sequencing.
//!
//! - **Query** (`query.rs`): balances, report counts and history over
//!   snapshots.
//!
//! - **Ledger** (`ledger.rs`): the facade handlers call, returning the
//!   payloads in `views.rs`.
//!
//! ## Crate Policy
//!
//! - Depends on `wcl-core` internally.
//! - Chain state lives in one injected `ChainStore`; there are no globals.
//! - Nothing in this crate retries. Storage failures are reported as
//!   retryable and leave the chain unchanged.

pub mod block;
pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod policy;
pub mod query;
pub mod sequencer;
pub mod store;
pub mod views;

pub use block::{Block, BlockDraft, EventKind};
pub use codec::{
    build_block, compute_block_hash, verify_block_hash, Clock, FixedClock, SystemClock,
    GENESIS_SENTINEL,
};
pub use config::{ConfigError, LedgerConfig, LogFormat, PolicyConfig};
pub use error::{ChainIntegrityError, LedgerError, StorageError};
pub use ledger::{Ledger, ResetAuthorization};
pub use log::{BlockLog, JsonlLog, LoadedChain, MemoryLog, UnreadableRecord};
pub use policy::{
    OpenDirectory, RewardEvent, RewardPolicy, RewardRequest, StaticDirectory, UserDirectory,
};
pub use query::{LedgerQuery, UserSummary};
pub use sequencer::Sequencer;
pub use store::{verify_blocks, ChainSnapshot, ChainStore, ChainVerification, VerificationFault};
pub use views::{HistoryView, LedgerView, ProfileView, RewardReceipt, TransactionReceipt};
