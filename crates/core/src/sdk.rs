//! Entry point bundling every market client for one deployment.

use crate::assets::AssetRegistry;
use crate::config::{BotConfig, DeploymentConfig};
use crate::liquidation::LiquidationClient;
use crate::pools::PoolReader;
use crate::rewards::RewardsClient;
use crate::verifier::PriceFeedVerifier;
use liquidator_chain::{
    AdminSigner, AlloyRpc, ChainError, ContractInterface, TransactionSubmitterBuilder,
};
use std::sync::Arc;
use tracing::info;

/// Clients for one market deployment sharing a single RPC endpoint.
#[derive(Debug, Clone)]
pub struct MarketClient {
    chain_id: u64,
    assets: AssetRegistry,
    pub pools: PoolReader,
    pub rewards: RewardsClient,
    pub verifier: PriceFeedVerifier,
    liquidation: Option<LiquidationClient>,
}

impl MarketClient {
    /// Wire up the clients. Liquidations are only available with a signer.
    pub async fn connect(
        rpc: Arc<AlloyRpc>,
        deployment: &DeploymentConfig,
        bot: &BotConfig,
        signer: Option<Arc<AdminSigner>>,
    ) -> Result<Self, ChainError> {
        let contracts = &deployment.contracts;

        let verifier = PriceFeedVerifier::new(rpc.clone(), contracts.master_price_oracle)
            .with_comparison(bot.verifier.price_comparison)
            .with_retry(bot.rpc);
        let pools = PoolReader::new(rpc.clone(), contracts.fuse_pool_directory, bot.rpc);
        let rewards = RewardsClient::new(rpc.clone(), bot.rpc);

        let liquidation = match signer {
            Some(signer) => {
                let target = ContractInterface::safe_liquidator(contracts.fuse_safe_liquidator)?;
                let submitter = TransactionSubmitterBuilder::new(rpc, signer, target)
                    .chain_id(deployment.chain.chain_id)
                    .gas_strategy(deployment.chain.gas.strategy())
                    .gas_limit_buffer_pct(bot.submitter.gas_limit_buffer_pct)
                    .retry(bot.rpc)
                    .log_transactions(bot.submitter.log_transactions && !bot.is_production())
                    .build()
                    .await?;
                let client = LiquidationClient::new(Arc::new(submitter)).with_confirmation(
                    bot.submitter.confirm_timeout(),
                    bot.submitter.confirm_poll(),
                );
                Some(client)
            }
            None => None,
        };

        info!(
            chain = %deployment.chain.name,
            assets = deployment.assets.len(),
            can_liquidate = liquidation.is_some(),
            "Market client ready"
        );

        Ok(Self {
            chain_id: deployment.chain.chain_id,
            assets: deployment.asset_registry(),
            pools,
            rewards,
            verifier,
            liquidation,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    /// Liquidation client, or [`ChainError::NoSigner`] in read-only mode.
    pub fn liquidation(&self) -> Result<&LiquidationClient, ChainError> {
        self.liquidation.as_ref().ok_or(ChainError::NoSigner)
    }

    pub fn is_read_only(&self) -> bool {
        self.liquidation.is_none()
    }
}
