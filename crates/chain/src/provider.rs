//! Alloy-backed implementation of the RPC seams.
//! One HTTP provider is built per endpoint and shared by every clone.

use crate::contracts::{
    FusePool, IBasePriceOracle, IComptroller, IFlywheel, IFusePoolDirectory, IMasterPriceOracle,
};
use crate::error::RpcError;
use crate::rpc::{OracleReader, ReceiptSummary, TransactionRpc};
use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, B256, U256, U64};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tracing::{debug, info};

/// HTTP JSON-RPC connection shared by every market service.
#[derive(Clone)]
pub struct AlloyRpc {
    url: Url,
    provider: RootProvider,
}

impl std::fmt::Debug for AlloyRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // RPC URLs frequently embed API keys
        f.debug_struct("AlloyRpc")
            .field("host", &self.url.host_str())
            .finish_non_exhaustive()
    }
}

impl AlloyRpc {
    /// Parse the endpoint without touching the network.
    pub fn new(http_url: &str) -> Result<Self, RpcError> {
        let url = http_url
            .parse::<Url>()
            .map_err(|e| RpcError::Transport(format!("invalid RPC url: {e}")))?;
        let provider = RootProvider::new_http(url.clone());
        Ok(Self { url, provider })
    }

    /// Parse the endpoint and verify it answers.
    pub async fn connect(http_url: &str) -> Result<Self, RpcError> {
        let rpc = Self::new(http_url)?;
        let block = rpc.block_number().await?;
        info!(host = ?rpc.url.host_str(), block, "RPC connection verified");
        Ok(rpc)
    }

    /// Get current block number.
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        Ok(self.provider.get_block_number().await?)
    }

    /// Native balance of `account`.
    pub async fn balance(&self, account: Address) -> Result<U256, RpcError> {
        Ok(self.provider.get_balance(account).await?)
    }

    /// All pools registered in the pool directory.
    pub async fn all_pools(&self, directory: Address) -> Result<Vec<FusePool>, RpcError> {
        let contract = IFusePoolDirectory::new(directory, &self.provider);
        let pools = contract.getAllPools().call().await?;
        debug!(directory = %directory, count = pools._0.len(), "Fetched pools");
        Ok(pools._0)
    }

    /// Markets (cTokens) listed in a comptroller.
    pub async fn comptroller_markets(&self, comptroller: Address) -> Result<Vec<Address>, RpcError> {
        let contract = IComptroller::new(comptroller, &self.provider);
        Ok(contract.getAllMarkets().call().await?._0)
    }

    /// Price oracle configured on a comptroller.
    pub async fn comptroller_oracle(&self, comptroller: Address) -> Result<Address, RpcError> {
        let contract = IComptroller::new(comptroller, &self.provider);
        Ok(contract.oracle().call().await?._0)
    }

    /// Reward flywheels registered on a comptroller.
    pub async fn rewards_distributors(&self, comptroller: Address) -> Result<Vec<Address>, RpcError> {
        let contract = IComptroller::new(comptroller, &self.provider);
        Ok(contract.getRewardsDistributors().call().await?._0)
    }

    /// Token a flywheel pays out.
    pub async fn flywheel_reward_token(&self, flywheel: Address) -> Result<Address, RpcError> {
        let contract = IFlywheel::new(flywheel, &self.provider);
        Ok(contract.rewardToken().call().await?._0)
    }

    /// Rewards accrued but not yet claimed by `account` on a flywheel.
    pub async fn flywheel_rewards_accrued(
        &self,
        flywheel: Address,
        account: Address,
    ) -> Result<U256, RpcError> {
        let contract = IFlywheel::new(flywheel, &self.provider);
        Ok(contract.rewardsAccrued(account).call().await?._0)
    }
}

#[async_trait]
impl OracleReader for AlloyRpc {
    async fn aggregator_price(&self, aggregator: Address, token: Address) -> Result<U256, RpcError> {
        let contract = IMasterPriceOracle::new(aggregator, &self.provider);
        Ok(contract.price(token).call().await?._0)
    }

    async fn delegate_oracle(&self, aggregator: Address, token: Address) -> Result<Address, RpcError> {
        let contract = IMasterPriceOracle::new(aggregator, &self.provider);
        Ok(contract.oracles(token).call().await?._0)
    }

    async fn oracle_price(&self, oracle: Address, token: Address) -> Result<U256, RpcError> {
        let contract = IBasePriceOracle::new(oracle, &self.provider);
        Ok(contract.price(token).call().await?._0)
    }
}

#[async_trait]
impl TransactionRpc for AlloyRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn transaction_count(&self, account: Address) -> Result<u64, RpcError> {
        Ok(self.provider.get_transaction_count(account).pending().await?)
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn max_priority_fee_per_gas(&self) -> Result<u128, RpcError> {
        Ok(self.provider.get_max_priority_fee_per_gas().await?)
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>, RpcError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?;
        Ok(block.and_then(|b| b.header.base_fee_per_gas).map(u128::from))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RpcError> {
        let gas: U64 = self
            .provider
            .client()
            .request("eth_estimateGas", (tx.clone(),))
            .await?;
        Ok(gas.to::<u64>())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, RpcError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|r| ReceiptSummary {
            hash,
            block_number: r.block_number,
            gas_used: r.gas_used as u64,
            success: r.status(),
        }))
    }
}

/// Raw calldata helper used by debug logging.
pub(crate) fn calldata_preview(data: &Bytes) -> String {
    let shown = data.len().min(36);
    format!("0x{}{}", hex::encode(&data[..shown]), if data.len() > shown { "…" } else { "" })
}
