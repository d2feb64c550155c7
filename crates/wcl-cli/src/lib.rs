//! # wcl-cli — Operator CLI for the WaterCoin Ledger
//!
//! Provides the `wcl` command-line interface over a file-backed ledger.
//!
//! ## Subcommands
//!
//! - `wcl reward <user>` — credit a leak report (fixed reward).
//! - `wcl credit <user> <amount>` — administrator credit.
//! - `wcl ledger` / `wcl profile <user>` / `wcl history <user>` — queries.
//! - `wcl verify` — full-chain verification; exits 2 when broken.
//! - `wcl reset --confirm-irreversible` — administrative reset.
//!
//! Every command prints its result as pretty JSON on stdout:
//!
//! ```bash
//! wcl --data-dir /var/lib/watercoin reward alice --zone north
//! wcl credit bob 12.5 --reason "pipe repair bonus"
//! wcl profile bob
//! ```

pub mod inspect;
pub mod reset;
pub mod reward;
pub mod settings;

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

/// Write `value` as pretty JSON followed by a newline.
pub fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}
