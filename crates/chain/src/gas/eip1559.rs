//! EIP-1559 gas pricing (base fee plus priority tip).

use super::{GasParams, GasStrategy};
use crate::error::RpcError;
use crate::rpc::TransactionRpc;
use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::debug;

const FALLBACK_BASE_FEE: u128 = 30_000_000_000;
const DEFAULT_MAX_FEE_CAP: u128 = 500_000_000_000;

/// `max_fee = base_fee * multiplier + tip`, capped at `max_fee_cap`.
#[derive(Debug)]
pub struct Eip1559GasStrategy {
    default_priority_fee: u128,
    max_fee_multiplier: f64,
    max_fee_cap: u128,
}

impl Eip1559GasStrategy {
    pub fn new(default_priority_fee: u128, max_fee_multiplier: f64) -> Self {
        Self {
            default_priority_fee,
            max_fee_multiplier,
            max_fee_cap: DEFAULT_MAX_FEE_CAP,
        }
    }

    pub fn with_max_fee_cap(mut self, cap: u128) -> Self {
        self.max_fee_cap = cap;
        self
    }

    fn max_fee(&self, base_fee: u128, priority_fee: u128) -> u128 {
        let max_fee = ((base_fee as f64) * self.max_fee_multiplier) as u128 + priority_fee;
        max_fee.min(self.max_fee_cap)
    }
}

#[async_trait]
impl GasStrategy for Eip1559GasStrategy {
    async fn fetch_params(&self, rpc: &dyn TransactionRpc) -> Result<GasParams, RpcError> {
        let base_fee = rpc.latest_base_fee().await?.unwrap_or_else(|| {
            debug!("latest block has no base fee, using fallback");
            FALLBACK_BASE_FEE
        });

        // Nodes without eth_maxPriorityFeePerGas get the configured tip
        let priority_fee = match rpc.max_priority_fee_per_gas().await {
            Ok(fee) => fee,
            Err(e) if e.is_transient() => return Err(e),
            Err(e) => {
                debug!(error = %e, "priority fee unsupported, using default");
                self.default_priority_fee
            }
        };

        let max_fee_per_gas = self.max_fee(base_fee, priority_fee);
        Ok(GasParams::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas: priority_fee.min(max_fee_per_gas),
            base_fee,
        })
    }

    fn apply_gas(&self, tx: &mut TransactionRequest, params: &GasParams) {
        match params {
            GasParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
                ..
            } => {
                tx.set_max_fee_per_gas(*max_fee_per_gas);
                tx.set_max_priority_fee_per_gas(*max_priority_fee_per_gas);
            }
            GasParams::Legacy { gas_price } => {
                tx.set_max_fee_per_gas(*gas_price);
                tx.set_max_priority_fee_per_gas(self.default_priority_fee.min(*gas_price));
            }
        }
    }

    fn strategy_name(&self) -> &'static str {
        "EIP-1559"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRpc;
    use alloy::primitives::Address;

    #[test]
    fn test_max_fee_calculation() {
        let strategy = Eip1559GasStrategy::new(2_000_000_000, 2.0);
        // 30 gwei * 2.0 + 2 gwei
        assert_eq!(strategy.max_fee(30_000_000_000, 2_000_000_000), 62_000_000_000);
    }

    #[test]
    fn test_max_fee_cap() {
        let strategy = Eip1559GasStrategy::new(2_000_000_000, 10.0).with_max_fee_cap(100_000_000_000);
        assert_eq!(strategy.max_fee(30_000_000_000, 2_000_000_000), 100_000_000_000);
    }

    #[tokio::test]
    async fn test_fetch_uses_latest_base_fee() {
        let rpc = MockRpc::new();
        rpc.set_base_fee(Some(10_000_000_000));
        rpc.set_priority_fee(1_000_000_000);
        let strategy = Eip1559GasStrategy::new(2_000_000_000, 2.0);

        let params = strategy.fetch_params(&rpc).await.unwrap();
        assert_eq!(
            params,
            GasParams::Eip1559 {
                max_fee_per_gas: 21_000_000_000,
                max_priority_fee_per_gas: 1_000_000_000,
                base_fee: 10_000_000_000,
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_defaults_priority_fee_on_error() {
        let rpc = MockRpc::new();
        rpc.set_base_fee(None);
        rpc.fail_next(
            "max_priority_fee_per_gas",
            1,
            RpcError::Rpc { code: -32601, message: "method not found".into() },
        );
        let strategy = Eip1559GasStrategy::new(2_000_000_000, 1.0);

        let params = strategy.fetch_params(&rpc).await.unwrap();
        assert_eq!(params.effective_gas_price(), FALLBACK_BASE_FEE + 2_000_000_000);
    }

    #[tokio::test]
    async fn test_fetch_propagates_transient_errors() {
        let rpc = MockRpc::new();
        rpc.fail_next("max_priority_fee_per_gas", 1, RpcError::Timeout(std::time::Duration::from_secs(1)));
        let strategy = Eip1559GasStrategy::new(2_000_000_000, 2.0);

        assert!(strategy.fetch_params(&rpc).await.is_err());
        assert_eq!(strategy.fallback_params(), None);
    }

    #[test]
    fn test_apply_gas() {
        let strategy = Eip1559GasStrategy::new(2_000_000_000, 1.5);
        let mut tx = TransactionRequest::default().with_to(Address::ZERO);

        strategy.apply_gas(
            &mut tx,
            &GasParams::Eip1559 {
                max_fee_per_gas: 50_000_000_000,
                max_priority_fee_per_gas: 2_000_000_000,
                base_fee: 30_000_000_000,
            },
        );
        assert_eq!(tx.max_fee_per_gas, Some(50_000_000_000));
        assert_eq!(tx.max_priority_fee_per_gas, Some(2_000_000_000));
    }
}
