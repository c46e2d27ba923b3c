//! Liquidator chain interaction layer.
//!
//! This crate provides:
//! - RPC seams (`OracleReader`, `TransactionRpc`) and their alloy HTTP implementation
//! - Contract bindings for the price oracles, pool directory, comptroller and flywheels
//! - Method-name call encoding for the liquidator contract
//! - Admin signing, nonce tracking and transaction submission
//! - Gas strategy abstraction (Legacy + EIP-1559)
//! - Per-call timeouts and retry for transient RPC failures

mod contracts;
mod error;
pub mod gas;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod provider;
mod retry;
mod rpc;
mod signer;

pub use contracts::{
    ContractInterface, FusePool, IBasePriceOracle, IComptroller, IFlywheel, IFusePoolDirectory,
    IMasterPriceOracle, SAFE_LIQUIDATOR_ABI,
};
pub use error::{ChainError, RpcError};
pub use gas::{create_gas_strategy, GasParams, GasPricingModel, GasStrategy};
pub use provider::AlloyRpc;
pub use retry::RetryPolicy;
pub use rpc::{OracleReader, ReceiptSummary, TransactionRpc};
pub use signer::{
    AdminSigner, NonceManager, SubmittedTransaction, TransactionIntent, TransactionSubmitter,
    TransactionSubmitterBuilder,
};

// Re-exported so callers can build intent arguments without a direct alloy dependency
pub use alloy::dyn_abi::DynSolValue;
