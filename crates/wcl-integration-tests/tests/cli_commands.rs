//! # CLI Command Tests
//!
//! Exercises the `wcl` subcommand handlers against a file-backed ledger,
//! capturing stdout into a buffer. These are the same code paths the
//! binary dispatches to.

use std::path::PathBuf;

use serde_json::Value;
use wcl_cli::inspect::{run_history, run_ledger, run_profile, run_verify, UserArgs};
use wcl_cli::reset::{run_reset, ResetArgs};
use wcl_cli::reward::{run_credit, run_reward, CreditArgs, RewardArgs};
use wcl_cli::settings::{resolve_config_with, ConfigOverrides};
use wcl_ledger::Ledger;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open(dir: &std::path::Path) -> Ledger {
    let overrides = ConfigOverrides {
        data_dir: Some(dir.to_path_buf()),
        ..ConfigOverrides::default()
    };
    let config = resolve_config_with(&overrides, |_| None).unwrap();
    Ledger::open(&config).unwrap()
}

fn capture(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<u8>) -> (u8, Value) {
    let mut out = Vec::new();
    let code = f(&mut out).unwrap();
    (code, serde_json::from_slice(&out).unwrap())
}

fn user(name: &str) -> UserArgs {
    UserArgs {
        username: name.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_reward_credit_profile_history() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());

    let (code, receipt) = capture(|out| {
        run_reward(
            &RewardArgs {
                username: "alice".into(),
                zone: Some("north".into()),
                description: None,
            },
            &ledger,
            out,
        )
    });
    assert_eq!(code, 0);
    assert_eq!(receipt["block_index"], 0);
    assert_eq!(receipt["reward"], "5");

    let (_, tx) = capture(|out| {
        run_credit(
            &CreditArgs {
                username: "bob".into(),
                amount: 12.5,
                reason: Some("pipe repair bonus".into()),
            },
            &ledger,
            out,
        )
    });
    assert_eq!(tx["block_index"], 1);
    assert_eq!(tx["message"], "credited 12.5 to bob");

    let (_, profile) = capture(|out| run_profile(&user("bob"), &ledger, out));
    assert_eq!(profile["username"], "bob");
    assert_eq!(profile["coins"], "12.5");
    assert_eq!(profile["reports"], 0);

    let (_, history) = capture(|out| run_history(&user("alice"), &ledger, out));
    assert_eq!(history["reports"].as_array().unwrap().len(), 1);
    assert_eq!(history["reports"][0]["memo"], "[north]");

    let (_, full) = capture(|out| run_ledger(&ledger, out));
    assert_eq!(full["chain"].as_array().unwrap().len(), 2);
}

#[test]
fn test_verify_exit_code_reflects_chain_state() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ledger = open(dir.path());
        ledger.add_reward("alice", "leak_report").unwrap();
        ledger.add_reward("bob", "leak_report").unwrap();
        let (code, report) = capture(|out| run_verify(&ledger, out));
        assert_eq!(code, 0);
        assert_eq!(report["valid"], true);
    }

    let path: PathBuf = dir.path().join("chain.jsonl");
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replacen("\"alice\"", "\"mallory\"", 1)).unwrap();

    let ledger = open(dir.path());
    let (code, report) = capture(|out| run_verify(&ledger, out));
    assert_eq!(code, wcl_cli::inspect::EXIT_VERIFICATION_FAILED);
    assert_eq!(report["valid"], false);
    assert_eq!(report["first_bad_index"], 0);
    assert_eq!(report["fault"]["kind"], "hash_mismatch");
}

#[test]
fn test_reset_requires_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());
    ledger.add_reward("alice", "leak_report").unwrap();

    let mut out = Vec::new();
    let refused = run_reset(
        &ResetArgs {
            confirm_irreversible: false,
            operator: "ops".into(),
        },
        &ledger,
        &mut out,
    );
    assert!(refused.is_err());
    assert_eq!(ledger.store().len(), 1);

    let (code, report) = capture(|out| {
        run_reset(
            &ResetArgs {
                confirm_irreversible: true,
                operator: "ops".into(),
            },
            &ledger,
            out,
        )
    });
    assert_eq!(code, 0);
    assert_eq!(report["removed_blocks"], 1);
    assert!(ledger.store().is_empty());
}

#[test]
fn test_rejected_credit_is_an_error_not_a_block() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());
    let mut out = Vec::new();
    let err = run_credit(
        &CreditArgs {
            username: "bob".into(),
            amount: 0.001,
            reason: None,
        },
        &ledger,
        &mut out,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("two fractional digits"));
    assert!(out.is_empty());
    assert!(ledger.store().is_empty());
}
