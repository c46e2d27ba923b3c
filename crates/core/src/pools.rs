//! Read access to the pool directory and pool comptrollers.

use alloy::primitives::Address;
use liquidator_chain::{AlloyRpc, ChainError, FusePool, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A pool registered in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub name: String,
    pub creator: Address,
    pub comptroller: Address,
    pub block_posted: u64,
    pub timestamp_posted: u64,
}

impl From<FusePool> for PoolSummary {
    fn from(pool: FusePool) -> Self {
        Self {
            name: pool.name,
            creator: pool.creator,
            comptroller: pool.comptroller,
            block_posted: pool.blockPosted.saturating_to(),
            timestamp_posted: pool.timestampPosted.saturating_to(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolReader {
    rpc: Arc<AlloyRpc>,
    directory: Address,
    retry: RetryPolicy,
}

impl PoolReader {
    pub fn new(rpc: Arc<AlloyRpc>, directory: Address, retry: RetryPolicy) -> Self {
        Self {
            rpc,
            directory,
            retry,
        }
    }

    pub fn directory(&self) -> Address {
        self.directory
    }

    /// Every pool in the directory.
    pub async fn all_pools(&self) -> Result<Vec<PoolSummary>, ChainError> {
        let rpc = &self.rpc;
        let directory = self.directory;
        let pools = self
            .retry
            .run("all pools", || rpc.all_pools(directory))
            .await
            .map_err(ChainError::network("all pools"))?;

        debug!(count = pools.len(), "Loaded pools");
        Ok(pools.into_iter().map(PoolSummary::from).collect())
    }

    /// Markets (cTokens) listed in a pool.
    pub async fn markets(&self, comptroller: Address) -> Result<Vec<Address>, ChainError> {
        let rpc = &self.rpc;
        self.retry
            .run("pool markets", || rpc.comptroller_markets(comptroller))
            .await
            .map_err(ChainError::network("pool markets"))
    }

    /// Price oracle a pool reads from.
    pub async fn price_oracle(&self, comptroller: Address) -> Result<Address, ChainError> {
        let rpc = &self.rpc;
        self.retry
            .run("pool oracle", || rpc.comptroller_oracle(comptroller))
            .await
            .map_err(ChainError::network("pool oracle"))
    }
}
