//! Chain section of the deployment config.

use liquidator_chain::{create_gas_strategy, GasPricingModel, GasStrategy};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Chain details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDetails {
    /// Chain ID
    pub chain_id: u64,
    /// Human-readable name
    pub name: String,
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,
    /// Gas configuration
    #[serde(default)]
    pub gas: GasConfig,
}

/// Gas pricing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Gas pricing model
    #[serde(default)]
    pub pricing: GasPricingModel,
    /// Maximum gas price willing to pay (in gwei)
    #[serde(default = "default_max_gas_price")]
    pub max_gas_price_gwei: f64,
    /// Default gas price for legacy transactions (in gwei)
    #[serde(default = "default_gas_price")]
    pub default_gas_price_gwei: f64,
    /// Priority fee for EIP-1559 transactions (in gwei)
    #[serde(default)]
    pub priority_fee_gwei: Option<f64>,
}

fn default_max_gas_price() -> f64 {
    100.0
}

fn default_gas_price() -> f64 {
    1.0
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            pricing: GasPricingModel::default(),
            max_gas_price_gwei: default_max_gas_price(),
            default_gas_price_gwei: default_gas_price(),
            priority_fee_gwei: None,
        }
    }
}

impl GasConfig {
    pub fn strategy(&self) -> Box<dyn GasStrategy> {
        create_gas_strategy(
            self.pricing,
            self.default_gas_price_gwei,
            self.max_gas_price_gwei,
            self.priority_fee_gwei,
        )
    }
}

/// Expand `${VAR_NAME}` patterns with environment variable values.
///
/// Unset variables are left untouched.
pub(crate) fn expand_env(s: &str) -> String {
    expand_with(s, |name| std::env::var(name).ok())
}

fn expand_with(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

    re.replace_all(s, |caps: &regex_lite::Captures<'_>| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
