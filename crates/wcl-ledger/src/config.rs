//! Ledger configuration.
//!
//! Layered lowest to highest: built-in defaults, a YAML file, `WCL_*`
//! environment variables, then whatever the caller (usually CLI flags)
//! sets on the struct directly.
//!
//! ```yaml
//! data_dir: /var/lib/watercoin
//! log_format: json
//! policy:
//!   leak_report_reward: 5
//!   max_manual_credit: 1000000
//!   allow_debits: false
//!   known_users: [alice, bob]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wcl_core::Coins;

use crate::log::JsonlLog;

/// Default reward for one leak report, in whole coins.
pub const DEFAULT_LEAK_REPORT_REWARD: i64 = 5;

/// Default bound on the absolute value of a manual credit, in whole coins.
pub const DEFAULT_MAX_MANUAL_CREDIT: i64 = 1_000_000;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format \"{other}\" (expected text or json)")),
        }
    }
}

/// Reward policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Fixed reward credited per leak report.
    pub leak_report_reward: Coins,
    /// Largest absolute manual credit an administrator may post.
    pub max_manual_credit: Coins,
    /// Whether manual credits may be negative.
    pub allow_debits: bool,
    /// Accounts that may receive manual credits. `None` accepts anyone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_users: Option<Vec<String>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            leak_report_reward: Coins::from_hundredths(DEFAULT_LEAK_REPORT_REWARD * 100),
            max_manual_credit: Coins::from_hundredths(DEFAULT_MAX_MANUAL_CREDIT * 100),
            allow_debits: false,
            known_users: None,
        }
    }
}

/// Top-level ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Directory holding `chain.jsonl`.
    pub data_dir: PathBuf,
    /// Log output format for binaries.
    pub log_format: LogFormat,
    /// Reward policy.
    pub policy: PolicyConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_format: LogFormat::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml {
            path: None,
            reason: e.to_string(),
        })
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            path: Some(path.to_path_buf()),
            reason: e.to_string(),
        })
    }

    /// Apply overrides from the process environment.
    ///
    /// Variables:
    /// - `WCL_DATA_DIR`
    /// - `WCL_LOG_FORMAT` (`text` or `json`)
    /// - `WCL_LEAK_REPORT_REWARD` (decimal coins)
    /// - `WCL_MAX_MANUAL_CREDIT` (decimal coins)
    /// - `WCL_ALLOW_DEBITS` (`true` or `false`)
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("WCL_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("WCL_LOG_FORMAT") {
            self.log_format = raw
                .parse()
                .map_err(|reason| ConfigError::invalid_env("WCL_LOG_FORMAT", &raw, reason))?;
        }
        if let Some(raw) = lookup("WCL_LEAK_REPORT_REWARD") {
            self.policy.leak_report_reward = Coins::parse(&raw).map_err(|e| {
                ConfigError::invalid_env("WCL_LEAK_REPORT_REWARD", &raw, e.to_string())
            })?;
        }
        if let Some(raw) = lookup("WCL_MAX_MANUAL_CREDIT") {
            self.policy.max_manual_credit = Coins::parse(&raw).map_err(|e| {
                ConfigError::invalid_env("WCL_MAX_MANUAL_CREDIT", &raw, e.to_string())
            })?;
        }
        if let Some(raw) = lookup("WCL_ALLOW_DEBITS") {
            self.policy.allow_debits = raw.trim().parse().map_err(|_| {
                ConfigError::invalid_env("WCL_ALLOW_DEBITS", &raw, "expected true or false".into())
            })?;
        }
        Ok(())
    }

    /// Reject settings no ledger could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.leak_report_reward.is_negative() || self.policy.leak_report_reward.is_zero()
        {
            return Err(ConfigError::Invalid(format!(
                "policy.leak_report_reward must be positive, got {}",
                self.policy.leak_report_reward
            )));
        }
        if self.policy.max_manual_credit.is_negative() {
            return Err(ConfigError::Invalid(format!(
                "policy.max_manual_credit must not be negative, got {}",
                self.policy.max_manual_credit
            )));
        }
        Ok(())
    }

    /// Path of the persisted chain.
    pub fn chain_path(&self) -> PathBuf {
        self.data_dir.join(JsonlLog::FILE_NAME)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is malformed.
    #[error("invalid config{}: {reason}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Yaml {
        /// The file path, when loaded from disk.
        path: Option<PathBuf>,
        /// Parser message.
        reason: String,
    },

    /// An environment override could not be parsed.
    #[error("invalid value \"{value}\" for {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Settings parse but cannot be used.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_env(var: &str, value: &str, reason: String) -> Self {
        Self::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
            reason,
        }
    }
}
