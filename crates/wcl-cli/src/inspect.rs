//! # Read-only Subcommands
//!
//! `ledger`, `profile`, `history` and `verify`. None of these take the
//! sequencer lock; each reads one snapshot.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use wcl_ledger::Ledger;

use crate::print_json;

/// Exit code of `wcl verify` when the chain is broken.
pub const EXIT_VERIFICATION_FAILED: u8 = 2;

/// Arguments naming one user.
#[derive(Args, Debug)]
pub struct UserArgs {
    /// Account to inspect.
    #[arg(value_name = "USER")]
    pub username: String,
}

/// Execute `wcl ledger`.
pub fn run_ledger(ledger: &Ledger, out: &mut impl Write) -> Result<u8> {
    print_json(out, &ledger.ledger())?;
    Ok(0)
}

/// Execute `wcl profile`.
pub fn run_profile(args: &UserArgs, ledger: &Ledger, out: &mut impl Write) -> Result<u8> {
    let profile = ledger
        .profile(&args.username)
        .with_context(|| format!("invalid username \"{}\"", args.username))?;
    print_json(out, &profile)?;
    Ok(0)
}

/// Execute `wcl history`.
pub fn run_history(args: &UserArgs, ledger: &Ledger, out: &mut impl Write) -> Result<u8> {
    let history = ledger
        .history(&args.username)
        .with_context(|| format!("invalid username \"{}\"", args.username))?;
    print_json(out, &history)?;
    Ok(0)
}

/// Execute `wcl verify`. A broken chain is reported, not raised.
pub fn run_verify(ledger: &Ledger, out: &mut impl Write) -> Result<u8> {
    let report = ledger.verify();
    print_json(out, &report)?;
    Ok(if report.valid {
        0
    } else {
        EXIT_VERIFICATION_FAILED
    })
}
