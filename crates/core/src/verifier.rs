//! Price feed verification.
//!
//! Cross-checks the master price oracle against the oracle it delegates to
//! for a token, then classifies the agreed price by oracle family.

use crate::assets::{AssetDescriptor, OracleCategory};
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use liquidator_chain::{ChainError, OracleReader, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Price of one unit of the native currency (18 decimals).
pub const NATIVE_PRICE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Price reported for assets that have no oracle. Means "not verified".
pub const UNVERIFIED_PRICE: U256 = U256::from_limbs([1, 0, 0, 0]);

/// How provider and TWAP prices are compared during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceComparison {
    /// Same value object. Two independently read prices never are, so
    /// provider and TWAP feeds always classify as invalid.
    #[default]
    Identity,
    /// Numerically equal.
    Numeric,
}

impl PriceComparison {
    fn matches(self, aggregator: &U256, underlying: &U256) -> bool {
        match self {
            Self::Identity => std::ptr::eq(aggregator, underlying),
            Self::Numeric => aggregator == underlying,
        }
    }
}

/// Outcome of verifying one asset's price feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub asset: AssetDescriptor,
    pub valid: bool,
    /// 18-decimal fixed point
    pub price: U256,
    pub observed_at: DateTime<Utc>,
}

impl PriceObservation {
    fn new(asset: &AssetDescriptor, valid: bool, price: U256) -> Self {
        Self {
            asset: asset.clone(),
            valid,
            price,
            observed_at: Utc::now(),
        }
    }
}

/// Verifies price feeds against one master price oracle.
#[derive(Debug, Clone)]
pub struct PriceFeedVerifier {
    reader: Arc<dyn OracleReader>,
    master_price_oracle: Address,
    comparison: PriceComparison,
    retry: RetryPolicy,
}

impl PriceFeedVerifier {
    pub fn new(reader: Arc<dyn OracleReader>, master_price_oracle: Address) -> Self {
        Self {
            reader,
            master_price_oracle,
            comparison: PriceComparison::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_comparison(mut self, comparison: PriceComparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn master_price_oracle(&self) -> Address {
        self.master_price_oracle
    }

    pub fn comparison(&self) -> PriceComparison {
        self.comparison
    }

    /// Verify the price feed of a single asset.
    ///
    /// Assets without an oracle are reported valid at [`UNVERIFIED_PRICE`]
    /// without touching the network. Disagreeing oracles are a hard error.
    #[instrument(skip(self, asset), fields(symbol = %asset.symbol, token = %asset.underlying))]
    pub async fn verify(&self, asset: &AssetDescriptor) -> Result<PriceObservation, ChainError> {
        let Some(kind) = &asset.oracle else {
            debug!("No oracle configured, skipping verification");
            return Ok(PriceObservation::new(asset, true, UNVERIFIED_PRICE));
        };

        let token = asset.underlying;
        let mpo = self.master_price_oracle;
        let reader = &self.reader;

        let aggregator_price = self
            .retry
            .run("aggregator price", || reader.aggregator_price(mpo, token))
            .await
            .map_err(ChainError::network("aggregator price"))?;

        let delegate = self
            .retry
            .run("delegate oracle", || reader.delegate_oracle(mpo, token))
            .await
            .map_err(ChainError::network("delegate oracle"))?;
        if delegate == Address::ZERO {
            return Err(ChainError::PriceUnavailable {
                token,
                reason: "no oracle registered in the master price oracle".into(),
            });
        }

        let oracle_price = self
            .retry
            .run("oracle price", || reader.oracle_price(delegate, token))
            .await
            .map_err(ChainError::network("oracle price"))?;

        info!(
            oracle = %kind,
            delegate = %delegate,
            aggregator_price = %aggregator_price,
            oracle_price = %oracle_price,
            "Fetched oracle prices"
        );

        if aggregator_price != oracle_price {
            warn!(
                aggregator_price = %aggregator_price,
                oracle_price = %oracle_price,
                "Oracles out of sync"
            );
            return Err(ChainError::OraclesOutOfSync {
                token,
                aggregator_price,
                oracle_price,
            });
        }

        let (valid, price) = match kind.category() {
            OracleCategory::Provider | OracleCategory::Twap => (
                self.comparison.matches(&aggregator_price, &oracle_price),
                oracle_price,
            ),
            // Valid native feeds report no price
            OracleCategory::FixedNative if oracle_price == NATIVE_PRICE => (true, U256::ZERO),
            OracleCategory::FixedNative => (false, oracle_price),
            OracleCategory::Default => (true, oracle_price),
        };

        if !valid {
            warn!(
                oracle = %kind,
                price = %oracle_price,
                comparison = ?self.comparison,
                "Price feed failed verification"
            );
        }

        Ok(PriceObservation::new(asset, valid, price))
    }

    /// Verify many assets, at most `concurrency` at a time.
    ///
    /// Results arrive in completion order; one asset failing never stops the rest.
    pub async fn verify_all(
        &self,
        assets: &[AssetDescriptor],
        concurrency: usize,
    ) -> Vec<(Address, Result<PriceObservation, ChainError>)> {
        stream::iter(assets)
            .map(|asset| async move { (asset.underlying, self.verify(asset).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}
