//! Deployment configuration that ties together chain, contracts, and assets.

use super::bot::BotConfig;
use super::chain::{expand_env, ChainDetails};
use crate::assets::{AssetDescriptor, AssetRegistry};
use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_DEPLOYMENT_PATH: &str = "./config/deployment.toml";

/// Full deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Chain the market is deployed on
    pub chain: ChainDetails,
    /// Market contract addresses
    pub contracts: MarketContracts,
    /// Supported assets and their oracles
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
    /// Replaces the BOT_PROFILE profile when present
    #[serde(default)]
    pub bot: Option<BotConfig>,
}

/// Market contract addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContracts {
    pub master_price_oracle: Address,
    pub fuse_pool_directory: Address,
    pub fuse_safe_liquidator: Address,
}

impl DeploymentConfig {
    /// Load from a TOML file, expanding `${VAR}` references first.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid deployment config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(&expand_env(content))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by DEPLOYMENT_CONFIG (default `./config/deployment.toml`).
    pub fn load_from_env() -> Result<Self> {
        let path = std::env::var("DEPLOYMENT_CONFIG")
            .unwrap_or_else(|_| DEFAULT_DEPLOYMENT_PATH.to_string());
        Self::from_file(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_url.contains("${") {
            bail!("RPC url references an unset variable: {}", self.chain.rpc_url);
        }
        if self.contracts.master_price_oracle.is_zero() {
            bail!("master_price_oracle must be set");
        }

        let mut seen = HashSet::with_capacity(self.assets.len());
        for asset in &self.assets {
            if !seen.insert(asset.underlying) {
                bail!("Duplicate asset {} ({})", asset.symbol, asset.underlying);
            }
        }
        Ok(())
    }

    pub fn asset_registry(&self) -> AssetRegistry {
        AssetRegistry::new(self.assets.clone())
    }

    /// Log the deployment (never includes secrets).
    pub fn log_summary(&self) {
        tracing::info!(
            chain = %self.chain.name,
            chain_id = self.chain.chain_id,
            assets = self.assets.len(),
            gas_pricing = ?self.chain.gas.pricing,
            "Deployment loaded"
        );
        tracing::info!(
            master_price_oracle = %self.contracts.master_price_oracle,
            fuse_pool_directory = %self.contracts.fuse_pool_directory,
            fuse_safe_liquidator = %self.contracts.fuse_safe_liquidator,
            "Market contracts"
        );
    }
}
