//! # Error Types
//!
//! Errors raised by the foundational types, built with `thiserror`.
//! Validation errors carry the offending input so an operator can see what
//! was rejected without re-running the request.

use thiserror::Error;

/// Input rejected before it could reach the ledger.
///
/// Raised by the domain newtypes ([`crate::Username`], [`crate::Coins`],
/// [`crate::Memo`]) and by the reward policy. A request failing with this
/// error never produces a chain mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Username is empty after trimming.
    #[error("username must be non-empty")]
    EmptyUsername,

    /// Username exceeds the maximum length.
    #[error("username \"{0}\" is longer than {max} characters", max = crate::identity::MAX_USERNAME_LEN)]
    UsernameTooLong(String),

    /// Username contains control characters.
    #[error("username {0:?} contains control characters")]
    UsernameControlChars(String),

    /// Amount is NaN or infinite.
    #[error("amount must be a finite number, got {0}")]
    NonFiniteAmount(f64),

    /// Amount has more fractional digits than the ledger records.
    #[error("amount {0} has more than two fractional digits")]
    ExcessPrecision(String),

    /// Amount does not fit the ledger's fixed-point range.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(String),

    /// Amount text could not be parsed as a decimal.
    #[error("invalid decimal amount \"{0}\"")]
    InvalidAmount(String),

    /// An event kind that needs an explicit amount arrived without one.
    #[error("{0} requires an administrator-supplied amount")]
    MissingAmount(String),

    /// Amount is rejected by the reward policy.
    #[error("amount {amount} rejected: {reason}")]
    AmountNotPermitted {
        /// The rejected amount, in canonical decimal text.
        amount: String,
        /// Which policy rule rejected it.
        reason: String,
    },

    /// Event kind is not one the ledger knows how to reward.
    #[error("unknown event kind \"{0}\" (expected leak_report or manual_credit)")]
    UnknownEventKind(String),

    /// Recipient is not present in the user directory.
    #[error("recipient \"{0}\" does not reference an existing account")]
    UnknownRecipient(String),

    /// Memo text is too long.
    #[error("memo is {len} characters, limit is {max}")]
    MemoTooLong {
        /// Length of the rejected memo in characters.
        len: usize,
        /// The configured limit.
        max: usize,
    },

    /// A digest string is not 64 hex characters.
    #[error("invalid digest \"{0}\" (expected 64 hex characters)")]
    InvalidDigest(String),

    /// Timestamp string is not a UTC ISO 8601 instant.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be decimal strings or integers.
    #[error("float values are not permitted in canonical representations; use decimal strings for amounts: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
