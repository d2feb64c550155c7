//! # wcl-core — Foundational Types for the WaterCoin Ledger
//!
//! Leaf crate of the workspace. It defines the primitives every other crate
//! builds blocks from, and enforces their invariants at construction time.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All digest computation flows through
//!    `CanonicalBytes::new()` (RFC 8785 JCS, floats rejected). No raw
//!    `serde_json::to_vec()` for hashing.
//!
//! 2. **`sha256_digest()` accepts only `&CanonicalBytes`.** The compiler
//!    rejects any attempt to hash non-canonical bytes.
//!
//! 3. **Fixed-point `Coins`.** Rewards are hundredths in an `i64`, rendered
//!    as canonical decimal text. No floats cross the ledger boundary.
//!
//! 4. **UTC millisecond `Timestamp`.** One textual form per instant, so a
//!    stored timestamp always re-hashes to the same bytes.
//!
//! 5. **Validated newtypes.** `Username` and `Memo` cannot hold empty,
//!    oversized, or control-character text.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `wcl-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use amount::Coins;
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, Digest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{Memo, Username, MAX_MEMO_LEN, MAX_USERNAME_LEN};
pub use temporal::Timestamp;
