//! Legacy gas pricing (single `gasPrice` field).

use super::{GasParams, GasStrategy};
use crate::error::RpcError;
use crate::rpc::TransactionRpc;
use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

/// Uses the node's suggested gas price, capped at `max_gas_price`.
#[derive(Debug)]
pub struct LegacyGasStrategy {
    default_gas_price: u128,
    max_gas_price: u128,
}

impl LegacyGasStrategy {
    /// Prices are in wei.
    pub fn new(default_gas_price: u128, max_gas_price: u128) -> Self {
        Self {
            default_gas_price: default_gas_price.min(max_gas_price),
            max_gas_price,
        }
    }

    pub fn default_gas_price(&self) -> u128 {
        self.default_gas_price
    }
}

#[async_trait]
impl GasStrategy for LegacyGasStrategy {
    async fn fetch_params(&self, rpc: &dyn TransactionRpc) -> Result<GasParams, RpcError> {
        let gas_price = rpc.gas_price().await?;
        Ok(GasParams::Legacy {
            gas_price: gas_price.min(self.max_gas_price),
        })
    }

    fn fallback_params(&self) -> Option<GasParams> {
        Some(GasParams::Legacy {
            gas_price: self.default_gas_price,
        })
    }

    fn apply_gas(&self, tx: &mut TransactionRequest, params: &GasParams) {
        tx.set_gas_price(params.effective_gas_price());
    }

    fn strategy_name(&self) -> &'static str {
        "Legacy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRpc;
    use alloy::primitives::Address;

    #[test]
    fn test_default_price_is_capped() {
        let strategy = LegacyGasStrategy::new(50_000_000_000, 10_000_000_000);
        assert_eq!(strategy.default_gas_price(), 10_000_000_000);
        assert_eq!(
            strategy.fallback_params(),
            Some(GasParams::Legacy { gas_price: 10_000_000_000 })
        );
    }

    #[tokio::test]
    async fn test_fetch_caps_node_price() {
        let rpc = MockRpc::new();
        rpc.set_gas_price(20_000_000_000);
        let strategy = LegacyGasStrategy::new(1_000_000_000, 10_000_000_000);

        let params = strategy.fetch_params(&rpc).await.unwrap();
        assert_eq!(params, GasParams::Legacy { gas_price: 10_000_000_000 });
    }

    #[tokio::test]
    async fn test_fetch_propagates_node_errors() {
        let rpc = MockRpc::new();
        rpc.fail_next("gas_price", 1, RpcError::Transport("connection reset".into()));
        let strategy = LegacyGasStrategy::new(1_000_000_000, 10_000_000_000);

        let err = strategy.fetch_params(&rpc).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_apply_gas_sets_gas_price() {
        let strategy = LegacyGasStrategy::new(1_000_000_000, 10_000_000_000);
        let mut tx = TransactionRequest::default().with_to(Address::ZERO);

        strategy.apply_gas(&mut tx, &GasParams::Legacy { gas_price: 5_000_000_000 });
        assert_eq!(tx.gas_price(), Some(5_000_000_000));
    }
}
