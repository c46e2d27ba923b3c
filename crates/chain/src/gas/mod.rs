//! Fee pricing for signed transactions.
//!
//! The submitter estimates the gas *limit* per transaction; the strategies
//! here decide the *price* fields (legacy `gasPrice` or EIP-1559 fee caps)
//! before signing.

mod eip1559;
mod legacy;

pub use eip1559::Eip1559GasStrategy;
pub use legacy::LegacyGasStrategy;

use crate::error::RpcError;
use crate::rpc::TransactionRpc;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

const GWEI: f64 = 1e9;

/// Gas parameters fetched from the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasParams {
    Legacy {
        gas_price: u128,
    },
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
        base_fee: u128,
    },
}

impl GasParams {
    /// Highest price per gas the transaction may pay.
    pub fn effective_gas_price(&self) -> u128 {
        match self {
            GasParams::Legacy { gas_price } => *gas_price,
            GasParams::Eip1559 { max_fee_per_gas, .. } => *max_fee_per_gas,
        }
    }
}

/// Fee pricing model of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasPricingModel {
    #[default]
    Legacy,
    Eip1559,
}

/// Trait for gas pricing strategies.
#[async_trait]
pub trait GasStrategy: Send + Sync + Debug {
    /// Query the chain for current fee data.
    async fn fetch_params(&self, rpc: &dyn TransactionRpc) -> Result<GasParams, RpcError>;

    /// Fee data to sign with when the node cannot answer and nothing is cached.
    fn fallback_params(&self) -> Option<GasParams> {
        None
    }

    /// Write the fee fields into `tx`.
    fn apply_gas(&self, tx: &mut TransactionRequest, params: &GasParams);

    fn strategy_name(&self) -> &'static str;
}

/// Create a gas strategy from chain configuration (prices in gwei).
pub fn create_gas_strategy(
    model: GasPricingModel,
    default_gas_price_gwei: f64,
    max_gas_price_gwei: f64,
    priority_fee_gwei: Option<f64>,
) -> Box<dyn GasStrategy> {
    let max_gas_price = (max_gas_price_gwei * GWEI) as u128;
    match model {
        GasPricingModel::Eip1559 => {
            let priority_fee = priority_fee_gwei.unwrap_or(2.0);
            Box::new(
                Eip1559GasStrategy::new((priority_fee * GWEI) as u128, 2.0)
                    .with_max_fee_cap(max_gas_price),
            )
        }
        GasPricingModel::Legacy => Box::new(LegacyGasStrategy::new(
            (default_gas_price_gwei * GWEI) as u128,
            max_gas_price,
        )),
    }
}
