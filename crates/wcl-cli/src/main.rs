//! # wcl CLI entry point
//!
//! Parses command-line arguments, resolves configuration, opens the ledger
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use wcl_cli::inspect::{run_history, run_ledger, run_profile, run_verify, UserArgs};
use wcl_cli::reset::{run_reset, ResetArgs};
use wcl_cli::reward::{run_credit, run_reward, CreditArgs, RewardArgs};
use wcl_cli::settings::{init_tracing, resolve_config, ConfigOverrides};
use wcl_ledger::{Ledger, LogFormat};

/// WaterCoin ledger CLI.
///
/// Records leak-report rewards and administrator credits in a hash-chained,
/// append-only ledger, and answers balance and history queries over it.
#[derive(Parser, Debug)]
#[command(name = "wcl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true, env = "WCL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding chain.jsonl.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reward a leak report with the configured fixed amount.
    Reward(RewardArgs),

    /// Post an administrator credit.
    Credit(CreditArgs),

    /// Print the whole chain.
    Ledger,

    /// Print a user's balance and report count.
    Profile(UserArgs),

    /// Print a user's blocks in chain order.
    History(UserArgs),

    /// Verify every block; exits 2 if the chain is broken.
    Verify,

    /// Delete every block. Irreversible.
    Reset(ResetArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        config: cli.config.clone(),
        data_dir: cli.data_dir.clone(),
        log_format: cli.log_format,
    };
    let config = resolve_config(&overrides);

    let format = match &config {
        Ok(config) => config.log_format,
        Err(_) => cli.log_format.unwrap_or_default(),
    };
    init_tracing(cli.verbose, format);

    let result = config.and_then(|config| {
        tracing::debug!(data_dir = %config.data_dir.display(), "opening ledger");
        let ledger = Ledger::open(&config).with_context(|| {
            format!("failed to open ledger in {}", config.data_dir.display())
        })?;
        dispatch(cli.command, &ledger)
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(command: Commands, ledger: &Ledger) -> anyhow::Result<u8> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Reward(args) => run_reward(&args, ledger, &mut out),
        Commands::Credit(args) => run_credit(&args, ledger, &mut out),
        Commands::Ledger => run_ledger(ledger, &mut out),
        Commands::Profile(args) => run_profile(&args, ledger, &mut out),
        Commands::History(args) => run_history(&args, ledger, &mut out),
        Commands::Verify => run_verify(ledger, &mut out),
        Commands::Reset(args) => run_reset(&args, ledger, &mut out),
    }
}
