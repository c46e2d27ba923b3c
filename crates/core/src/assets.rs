//! Supported assets and the oracle contracts that price them.
//!
//! Assets are loaded from the deployment config; nothing here is hard-coded
//! per chain.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Named oracle contract an asset is priced by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OracleKind {
    ChainlinkPriceOracleV2,
    DiaPriceOracle,
    FluxPriceOracle,
    UniswapTwapPriceOracleV2,
    FixedNativePriceOracle,
    /// Any other oracle contract (`MasterPriceOracle`, `SimplePriceOracle`, ...)
    Other(String),
}

/// How a verified price is classified, by oracle family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleCategory {
    /// External price providers (Chainlink, DIA, Flux)
    Provider,
    /// On-chain time-weighted average
    Twap,
    /// Native currency, fixed at 1e18
    FixedNative,
    Default,
}

impl OracleKind {
    pub fn category(&self) -> OracleCategory {
        match self {
            Self::ChainlinkPriceOracleV2 | Self::DiaPriceOracle | Self::FluxPriceOracle => {
                OracleCategory::Provider
            }
            Self::UniswapTwapPriceOracleV2 => OracleCategory::Twap,
            Self::FixedNativePriceOracle => OracleCategory::FixedNative,
            Self::Other(_) => OracleCategory::Default,
        }
    }

    /// Contract name as it appears in deployments.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChainlinkPriceOracleV2 => "ChainlinkPriceOracleV2",
            Self::DiaPriceOracle => "DiaPriceOracle",
            Self::FluxPriceOracle => "FluxPriceOracle",
            Self::UniswapTwapPriceOracleV2 => "UniswapTwapPriceOracleV2",
            Self::FixedNativePriceOracle => "FixedNativePriceOracle",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for OracleKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "ChainlinkPriceOracleV2" => Self::ChainlinkPriceOracleV2,
            "DiaPriceOracle" => Self::DiaPriceOracle,
            "FluxPriceOracle" => Self::FluxPriceOracle,
            "UniswapTwapPriceOracleV2" => Self::UniswapTwapPriceOracleV2,
            "FixedNativePriceOracle" => Self::FixedNativePriceOracle,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for OracleKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<OracleKind> for String {
    fn from(kind: OracleKind) -> Self {
        match kind {
            OracleKind::Other(name) => name,
            named => named.as_str().to_string(),
        }
    }
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An asset the market supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Underlying token address
    pub underlying: Address,
    /// Token symbol (e.g., "WBNB", "USDC")
    pub symbol: String,
    /// Oracle pricing the token; `None` when the asset has no oracle
    #[serde(default)]
    pub oracle: Option<OracleKind>,
}

impl AssetDescriptor {
    pub fn new(underlying: Address, symbol: impl Into<String>, oracle: Option<OracleKind>) -> Self {
        Self {
            underlying,
            symbol: symbol.into(),
            oracle,
        }
    }

    pub fn category(&self) -> Option<OracleCategory> {
        self.oracle.as_ref().map(OracleKind::category)
    }
}

/// Asset registry for lookups by token address or symbol.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: Vec<AssetDescriptor>,
    by_token: HashMap<Address, usize>,
    by_symbol: HashMap<String, usize>,
}

impl AssetRegistry {
    /// Build from a list; a later entry for the same token replaces the earlier lookup.
    pub fn new(assets: Vec<AssetDescriptor>) -> Self {
        let mut by_token = HashMap::with_capacity(assets.len());
        let mut by_symbol = HashMap::with_capacity(assets.len());

        for (index, asset) in assets.iter().enumerate() {
            by_token.insert(asset.underlying, index);
            by_symbol.insert(asset.symbol.to_lowercase(), index);
        }

        Self {
            assets,
            by_token,
            by_symbol,
        }
    }

    pub fn get_by_token(&self, token: &Address) -> Option<&AssetDescriptor> {
        self.by_token.get(token).map(|&i| &self.assets[i])
    }

    /// Case-insensitive symbol lookup.
    pub fn get_by_symbol(&self, symbol: &str) -> Option<&AssetDescriptor> {
        self.by_symbol
            .get(&symbol.to_lowercase())
            .map(|&i| &self.assets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.assets.iter()
    }

    /// Assets whose price comes from an oracle.
    pub fn priced(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.assets.iter().filter(|a| a.oracle.is_some())
    }

    pub fn by_category(&self, category: OracleCategory) -> impl Iterator<Item = &AssetDescriptor> {
        self.assets
            .iter()
            .filter(move |a| a.category() == Some(category))
    }

    pub fn as_slice(&self) -> &[AssetDescriptor] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
