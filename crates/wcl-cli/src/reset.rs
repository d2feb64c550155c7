//! # Reset Subcommand
//!
//! Wipes the chain. Irreversible; refuses to run without
//! `--confirm-irreversible`.

use std::io::Write;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use wcl_ledger::{Ledger, ResetAuthorization};

use crate::print_json;

/// Arguments for `wcl reset`.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Acknowledge that every block will be deleted.
    #[arg(long)]
    pub confirm_irreversible: bool,

    /// Operator recorded in the reset log line.
    #[arg(long, env = "USER", default_value = "operator")]
    pub operator: String,
}

#[derive(Serialize)]
struct ResetReport {
    removed_blocks: usize,
}

/// Execute `wcl reset`.
pub fn run_reset(args: &ResetArgs, ledger: &Ledger, out: &mut impl Write) -> Result<u8> {
    if !args.confirm_irreversible {
        bail!(
            "refusing to delete {} blocks without --confirm-irreversible",
            ledger.store().len()
        );
    }
    let removed =
        ledger.administrative_reset(ResetAuthorization::irreversible(args.operator.clone()))?;
    print_json(
        out,
        &ResetReport {
            removed_blocks: removed,
        },
    )?;
    Ok(0)
}
