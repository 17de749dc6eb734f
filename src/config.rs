//! Configuration management for the transfer tracker
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub tracker: TrackerConfig,
    pub storage: StorageConfig,
    pub ledger: LedgerConfig,
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Seconds between confirmation poll cycles
    pub poll_interval_secs: u64,
    /// Cap, in cycles, on the exponential backoff applied to a record whose
    /// ledger queries keep failing
    pub max_backoff_cycles: u32,
    /// How long to wait for the host to background before opening the
    /// universal fallback link
    pub handoff_fallback_ms: u64,
    /// How long to wait before offering the wallet install prompt
    pub handoff_install_ms: u64,
    pub device_class: DeviceClass,
    /// Base URL used to rebuild resume links for unsigned records
    pub resume_link_base: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Well-known path of the persisted transaction collection
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub chain_id: u64,
    pub rpc_urls: Vec<String>,
    /// Prefix for explorer links shown in history, e.g. an etherscan tx URL
    pub explorer_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Deep link that opens the wallet application directly
    pub deep_link: String,
    /// Universal link fallback when the deep link did not take
    pub fallback_link: String,
    /// Where to send the user if the wallet is not installed
    pub install_link: String,
    pub private_key_env: Option<String>,
}

impl Settings {
    /// Load settings from the configured file
    pub fn load() -> Result<Self> {
        let config_path = env::var("TRACKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
        Self::load_from(&config_path)
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.ledger.rpc_urls.is_empty() {
            anyhow::bail!("At least one ledger RPC URL must be configured");
        }
        if self.tracker.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be non-zero");
        }
        if self.tracker.handoff_install_ms <= self.tracker.handoff_fallback_ms {
            anyhow::bail!("handoff_install_ms must exceed handoff_fallback_ms");
        }
        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
