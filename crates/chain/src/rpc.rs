//! RPC seams used by the verifier and the submitter.
//!
//! The pipeline only needs a small slice of an Ethereum JSON-RPC client:
//! contract reads against the price oracles, nonce lookup, fee data, gas
//! estimation, raw transaction broadcast and receipt lookup. Keeping that
//! slice behind traits lets the pipeline run against [`crate::AlloyRpc`] in
//! production and against an in-memory double in tests.

use crate::error::RpcError;
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Read access to the aggregating price oracle and the oracles it delegates to.
#[async_trait]
pub trait OracleReader: Send + Sync + Debug {
    /// Price the aggregator reports for `token` (18 decimals).
    async fn aggregator_price(&self, aggregator: Address, token: Address) -> Result<U256, RpcError>;

    /// Oracle contract the aggregator delegates to for `token`.
    async fn delegate_oracle(&self, aggregator: Address, token: Address) -> Result<Address, RpcError>;

    /// Price an individual oracle reports for `token` (18 decimals).
    async fn oracle_price(&self, oracle: Address, token: Address) -> Result<U256, RpcError>;
}

/// Account, fee and transaction operations.
#[async_trait]
pub trait TransactionRpc: Send + Sync + Debug {
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// Transaction count of `account`, including pending transactions.
    async fn transaction_count(&self, account: Address) -> Result<u64, RpcError>;

    async fn gas_price(&self) -> Result<u128, RpcError>;

    async fn max_priority_fee_per_gas(&self) -> Result<u128, RpcError>;

    /// Base fee of the latest block, `None` on chains without EIP-1559.
    async fn latest_base_fee(&self) -> Result<Option<u128>, RpcError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RpcError>;

    /// Broadcast an EIP-2718 encoded signed transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, RpcError>;
}

/// The parts of a transaction receipt the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub success: bool,
}
