//! Reward flywheels attached to pools.

use alloy::primitives::{Address, U256};
use futures::future::try_join_all;
use liquidator_chain::{AlloyRpc, ChainError, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A flywheel and the token it distributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlywheelInfo {
    pub flywheel: Address,
    pub reward_token: Address,
}

#[derive(Debug, Clone)]
pub struct RewardsClient {
    rpc: Arc<AlloyRpc>,
    retry: RetryPolicy,
}

impl RewardsClient {
    pub fn new(rpc: Arc<AlloyRpc>, retry: RetryPolicy) -> Self {
        Self { rpc, retry }
    }

    /// Flywheels registered on a pool's comptroller.
    pub async fn flywheels(&self, comptroller: Address) -> Result<Vec<Address>, ChainError> {
        let rpc = &self.rpc;
        self.retry
            .run("flywheels", || rpc.rewards_distributors(comptroller))
            .await
            .map_err(ChainError::network("flywheels"))
    }

    pub async fn reward_token(&self, flywheel: Address) -> Result<Address, ChainError> {
        let rpc = &self.rpc;
        self.retry
            .run("reward token", || rpc.flywheel_reward_token(flywheel))
            .await
            .map_err(ChainError::network("reward token"))
    }

    /// Rewards accrued to `account` and not yet claimed.
    pub async fn accrued(&self, flywheel: Address, account: Address) -> Result<U256, ChainError> {
        let rpc = &self.rpc;
        self.retry
            .run("rewards accrued", || rpc.flywheel_rewards_accrued(flywheel, account))
            .await
            .map_err(ChainError::network("rewards accrued"))
    }

    /// Every flywheel of a pool with its reward token.
    pub async fn pool_flywheels(&self, comptroller: Address) -> Result<Vec<FlywheelInfo>, ChainError> {
        let flywheels = self.flywheels(comptroller).await?;
        try_join_all(flywheels.into_iter().map(|flywheel| async move {
            Ok(FlywheelInfo {
                flywheel,
                reward_token: self.reward_token(flywheel).await?,
            })
        }))
        .await
    }
}
