//! # Configuration and Logging Setup
//!
//! Resolves the effective [`LedgerConfig`] from its layers and installs the
//! tracing subscriber. Logs go to stderr so stdout carries only the JSON
//! payload of the command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use wcl_ledger::{LedgerConfig, LogFormat};

/// Values given on the command line, the highest configuration layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// YAML file to read.
    pub config: Option<PathBuf>,
    /// Replacement data directory.
    pub data_dir: Option<PathBuf>,
    /// Replacement log format.
    pub log_format: Option<LogFormat>,
}

/// Defaults, then the YAML file, then `WCL_*` variables, then `overrides`.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<LedgerConfig> {
    resolve_config_with(overrides, |var| std::env::var(var).ok())
}

/// [`resolve_config`] with an explicit environment lookup.
pub fn resolve_config_with<F>(overrides: &ConfigOverrides, lookup: F) -> Result<LedgerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &overrides.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    config
        .apply_env_from(lookup)
        .context("invalid environment override")?;
    if let Some(dir) = &overrides.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(format) = overrides.log_format {
        config.log_format = format;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Filter for a `-v` count. `RUST_LOG` wins when no `-v` is given.
pub fn verbosity_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => return EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(level)
}

/// Install the global subscriber.
pub fn init_tracing(verbose: u8, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(verbosity_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wcl.yaml");
        std::fs::write(&path, "data_dir: from-file\nlog_format: json\n").unwrap();

        let overrides = ConfigOverrides {
            config: Some(path),
            data_dir: Some(PathBuf::from("from-flag")),
            log_format: None,
        };
        let config = resolve_config_with(&overrides, |var| {
            (var == "WCL_DATA_DIR").then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("from-flag"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = resolve_config_with(&ConfigOverrides::default(), |var| {
            (var == "WCL_DATA_DIR").then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("from-env"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let overrides = ConfigOverrides {
            config: Some(PathBuf::from("/nonexistent/wcl.yaml")),
            ..ConfigOverrides::default()
        };
        let err = resolve_config_with(&overrides, |_| None).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/wcl.yaml"));
    }
}
