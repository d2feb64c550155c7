//! # Reward and Credit Subcommands
//!
//! `wcl reward` posts a leak-report reward; the amount is always the
//! configured fixed reward. `wcl credit` posts an administrator credit with
//! an explicit amount.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use wcl_ledger::{Ledger, RewardReceipt, RewardRequest};

use crate::print_json;

/// Arguments for `wcl reward`.
#[derive(Args, Debug)]
pub struct RewardArgs {
    /// Reporter to credit.
    #[arg(value_name = "USER")]
    pub username: String,

    /// Zone the leak was reported in.
    #[arg(long)]
    pub zone: Option<String>,

    /// Free-text description of the leak.
    #[arg(long)]
    pub description: Option<String>,
}

impl RewardArgs {
    /// Combine zone and description into the block memo.
    pub fn details(&self) -> Option<String> {
        match (self.zone.as_deref(), self.description.as_deref()) {
            (Some(zone), Some(desc)) => Some(format!("[{zone}] {desc}")),
            (Some(zone), None) => Some(format!("[{zone}]")),
            (None, Some(desc)) => Some(desc.to_string()),
            (None, None) => None,
        }
    }
}

/// Arguments for `wcl credit`.
#[derive(Args, Debug)]
pub struct CreditArgs {
    /// Account to credit.
    #[arg(value_name = "USER")]
    pub username: String,

    /// Amount in coins, at most two decimals.
    #[arg(value_name = "AMOUNT", allow_negative_numbers = true)]
    pub amount: f64,

    /// Reason recorded in the ledger.
    #[arg(long)]
    pub reason: Option<String>,
}

/// Execute `wcl reward`.
pub fn run_reward(args: &RewardArgs, ledger: &Ledger, out: &mut impl Write) -> Result<u8> {
    let request = RewardRequest::leak_report(&args.username, args.details());
    let block = ledger
        .submit(&request)
        .with_context(|| format!("failed to reward leak report for \"{}\"", args.username))?;
    print_json(out, &RewardReceipt::from(&block))?;
    Ok(0)
}

/// Execute `wcl credit`.
pub fn run_credit(args: &CreditArgs, ledger: &Ledger, out: &mut impl Write) -> Result<u8> {
    let receipt = ledger
        .add_transaction(&args.username, args.amount, args.reason.as_deref())
        .with_context(|| format!("failed to credit {} to \"{}\"", args.amount, args.username))?;
    print_json(out, &receipt)?;
    Ok(0)
}
