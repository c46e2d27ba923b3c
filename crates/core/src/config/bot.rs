//! Runtime configuration with profile support.
//!
//! Profiles (`default`, `testing`, `production`) are selected with
//! `BOT_PROFILE`; a TOML file named by `BOT_CONFIG` overrides them entirely.

use crate::verifier::PriceComparison;
use anyhow::Context;
use liquidator_chain::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure containing all bot parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Profile name (for logging/identification)
    #[serde(default = "default_profile_name")]
    pub profile: String,

    /// Price feed verification
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Oracle monitor loop
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Transaction submission
    #[serde(default)]
    pub submitter: SubmitterConfig,

    /// Timeout and retry for every RPC read
    #[serde(default)]
    pub rpc: RetryPolicy,
}

fn default_profile_name() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// How provider and TWAP prices are compared ("identity" or "numeric")
    #[serde(default)]
    pub price_comparison: PriceComparison,

    /// Assets verified in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    4
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            price_comparison: PriceComparison::default(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Delay between verification rounds (seconds)
    #[serde(default = "default_monitor_interval")]
    pub interval_secs: u64,
}

fn default_monitor_interval() -> u64 {
    20
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_monitor_interval(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitterConfig {
    /// Headroom added to the node's gas estimate (percent)
    #[serde(default)]
    pub gas_limit_buffer_pct: u64,

    /// Log unsigned transactions at debug level
    #[serde(default = "default_log_transactions")]
    pub log_transactions: bool,

    /// How long to wait for a receipt (seconds)
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    /// Receipt polling interval (milliseconds)
    #[serde(default = "default_confirm_poll")]
    pub confirm_poll_ms: u64,
}

fn default_log_transactions() -> bool {
    true
}
fn default_confirm_timeout() -> u64 {
    120
}
fn default_confirm_poll() -> u64 {
    1_000
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            gas_limit_buffer_pct: 0,
            log_transactions: default_log_transactions(),
            confirm_timeout_secs: default_confirm_timeout(),
            confirm_poll_ms: default_confirm_poll(),
        }
    }
}

impl SubmitterConfig {
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn confirm_poll(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            profile: default_profile_name(),
            verifier: VerifierConfig::default(),
            monitor: MonitorConfig::default(),
            submitter: SubmitterConfig::default(),
            rpc: RetryPolicy::default(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bot config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid bot config {}", path.display()))?;
        Ok(config)
    }

    /// Short intervals and fast retries for local chains.
    pub fn testing() -> Self {
        Self {
            profile: "testing".to_string(),
            verifier: VerifierConfig {
                price_comparison: PriceComparison::Identity,
                concurrency: 2,
            },
            monitor: MonitorConfig { interval_secs: 5 },
            submitter: SubmitterConfig {
                gas_limit_buffer_pct: 0,
                log_transactions: true,
                confirm_timeout_secs: 30,
                confirm_poll_ms: 250,
            },
            rpc: RetryPolicy {
                max_attempts: 2,
                initial_backoff_ms: 50,
                max_backoff_ms: 200,
                call_timeout_ms: 5_000,
            },
        }
    }

    /// Never logs transactions; more patient with flaky nodes.
    pub fn production() -> Self {
        Self {
            profile: "production".to_string(),
            verifier: VerifierConfig::default(),
            monitor: MonitorConfig::default(),
            submitter: SubmitterConfig {
                log_transactions: false,
                confirm_timeout_secs: 300,
                ..Default::default()
            },
            rpc: RetryPolicy {
                max_attempts: 5,
                initial_backoff_ms: 250,
                max_backoff_ms: 4_000,
                call_timeout_ms: 15_000,
            },
        }
    }

    /// Look up a named profile.
    pub fn profile(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "testing" | "test" => Some(Self::testing()),
            "production" | "prod" => Some(Self::production()),
            _ => None,
        }
    }

    /// Profile from BOT_PROFILE, falling back to the default profile.
    pub fn from_env() -> Self {
        let profile = std::env::var("BOT_PROFILE").unwrap_or_else(|_| "default".to_string());
        Self::profile(&profile).unwrap_or_else(|| {
            tracing::warn!(profile = %profile, "Unknown BOT_PROFILE, using default profile");
            Self::default()
        })
    }

    /// BOT_CONFIG file if set, otherwise the BOT_PROFILE profile.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("BOT_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::from_env()),
        }
    }

    /// True for any spelling [`profile`](Self::profile) maps to production.
    pub fn is_production(&self) -> bool {
        matches!(self.profile.to_lowercase().as_str(), "production" | "prod")
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        tracing::info!(profile = %self.profile, "Bot configuration loaded");
        tracing::info!(
            price_comparison = ?self.verifier.price_comparison,
            concurrency = self.verifier.concurrency,
            interval_secs = self.monitor.interval_secs,
            "Verifier settings"
        );
        tracing::info!(
            gas_limit_buffer_pct = self.submitter.gas_limit_buffer_pct,
            log_transactions = self.submitter.log_transactions,
            confirm_timeout_secs = self.submitter.confirm_timeout_secs,
            "Submitter settings"
        );
        tracing::info!(
            max_attempts = self.rpc.max_attempts,
            call_timeout_ms = self.rpc.call_timeout_ms,
            "RPC retry policy"
        );
    }
}
