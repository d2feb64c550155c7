//! # Ledger Errors
//!
//! The four error kinds a ledger caller can see:
//!
//! - [`ValidationError`] — bad input, rejected before any chain mutation.
//! - [`ChainIntegrityError`] — a proposed block does not extend the tail.
//!   Always fatal to that request, never silently corrected.
//! - [`StorageError`] — the durability write failed. The chain is unchanged
//!   and the request may be retried.
//! - Verification failures are not errors: they are reported inside
//!   [`crate::ChainVerification`] with the first bad index.
//!
//! Every kind is returned to the immediate caller. Nothing in the ledger
//! retries on its own.

use std::path::PathBuf;

use thiserror::Error;
use wcl_core::{CanonicalizationError, Digest, ValidationError};

use crate::config::ConfigError;

/// Umbrella error for ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Request rejected by validation or the reward policy.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Proposed block does not extend the current tail.
    #[error("chain integrity error: {0}")]
    ChainIntegrity(#[from] ChainIntegrityError),

    /// Durability write or read failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Block content could not be canonicalized for hashing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Ledger configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LedgerError {
    /// Whether the same request can be resubmitted unchanged.
    ///
    /// Only storage failures qualify: they leave the chain untouched. A
    /// lock held by another process is not cleared by resubmitting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if !matches!(e, StorageError::Locked { .. }))
    }
}

/// A proposed block that does not extend the current chain tail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainIntegrityError {
    /// `block.index` is not the current chain length.
    #[error("index mismatch: expected {expected}, got {actual}")]
    IndexMismatch {
        /// The current chain length.
        expected: u64,
        /// The index carried by the block.
        actual: u64,
    },

    /// `block.previous_hash` is not the tail hash (or the genesis sentinel).
    #[error("previous_hash mismatch for block #{index}: expected {expected}, got {actual}")]
    PreviousHashMismatch {
        /// The index of the rejected block.
        index: u64,
        /// The hash the block should have linked to.
        expected: Digest,
        /// The hash it actually carries.
        actual: Digest,
    },

    /// The block's stored hash does not match its content.
    #[error("hash mismatch for block #{index}: stored {stored}, recomputed {recomputed}")]
    HashMismatch {
        /// The index of the rejected block.
        index: u64,
        /// The hash carried by the block.
        stored: Digest,
        /// The hash recomputed from its content.
        recomputed: Digest,
    },

    /// A persisted record could not be decoded, so nothing can extend the
    /// chain until it is repaired or reset.
    #[error("persisted record #{position} is unreadable; chain is read-only")]
    UnreadableRecord {
        /// Chain position of the unreadable record.
        position: u64,
    },
}

/// Failure of the persistence backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A block could not be encoded for persistence.
    #[error("failed to encode block #{index}: {source}")]
    Encode {
        /// Index of the block being written.
        index: u64,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Another log already holds the backing file.
    #[error("{path} is locked by another ledger process")]
    Locked {
        /// The contended file.
        path: PathBuf,
    },

    /// The backend refused the write.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
