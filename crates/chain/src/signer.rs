//! Admin signer and liquidation transaction submitter.
//!
//! Submission order is fixed: encode, nonce, gas estimate, sign, broadcast.
//! The nonce slot stays locked for the whole sequence so concurrent callers
//! never reuse a nonce.

use crate::contracts::ContractInterface;
use crate::error::{ChainError, RpcError};
use crate::gas::{GasParams, GasStrategy, LegacyGasStrategy};
use crate::provider::calldata_preview;
use crate::retry::RetryPolicy;
use crate::rpc::{ReceiptSummary, TransactionRpc};
use alloy::dyn_abi::DynSolValue;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// The market admin key.
pub struct AdminSigner {
    address: Address,
    wallet: EthereumWallet,
}

impl AdminSigner {
    /// Parse a hex private key, with or without `0x` prefix.
    pub fn from_private_key(private_key: &str) -> Result<Self, ChainError> {
        let key_hex = private_key.trim().trim_start_matches("0x");
        let bytes = hex::decode(key_hex).map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        let signer =
            PrivateKeySigner::from_slice(&bytes).map_err(|e| ChainError::InvalidKey(e.to_string()))?;

        Ok(Self {
            address: signer.address(),
            wallet: EthereumWallet::from(signer),
        })
    }

    /// Fail unless the key controls `expected`.
    pub fn with_expected_address(self, expected: Option<Address>) -> Result<Self, ChainError> {
        match expected {
            Some(expected) if expected != self.address => Err(ChainError::SignerMismatch {
                expected,
                actual: self.address,
            }),
            _ => Ok(self),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

impl std::fmt::Debug for AdminSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Locally tracked next nonce of the admin account.
///
/// The node's pending count can lag behind transactions this process just
/// broadcast, so the next nonce is `max(chain_count, local)`.
#[derive(Debug, Default)]
pub struct NonceManager {
    next: Option<u64>,
    last_synced: Option<u64>,
}

impl NonceManager {
    /// Pick the nonce for the next transaction given the chain's count.
    pub fn reserve(&mut self, chain_count: u64) -> u64 {
        self.last_synced = Some(chain_count);
        self.next.map_or(chain_count, |local| local.max(chain_count))
    }

    /// Record that `nonce` was accepted by the node.
    pub fn commit(&mut self, nonce: u64) {
        self.next = Some(nonce + 1);
    }

    /// Hand back a nonce whose broadcast failed so the next submit reuses it.
    ///
    /// Nonces below it stay accounted for even when the node lags.
    pub fn release(&mut self, nonce: u64) {
        self.next = Some(nonce);
    }

    pub fn next_local(&self) -> Option<u64> {
        self.next
    }

    pub fn last_synced(&self) -> Option<u64> {
        self.last_synced
    }
}

/// A liquidator contract call waiting to be submitted.
#[derive(Debug, Clone)]
pub struct TransactionIntent {
    pub method: String,
    pub args: Vec<DynSolValue>,
    pub value: U256,
}

impl TransactionIntent {
    pub fn new(method: impl Into<String>, args: Vec<DynSolValue>) -> Self {
        Self {
            method: method.into(),
            args,
            value: U256::ZERO,
        }
    }

    /// Native currency sent along with the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// A broadcast transaction.
#[derive(Clone)]
pub struct SubmittedTransaction {
    pub hash: B256,
    pub nonce: u64,
    pub method: String,
    pub gas_limit: u64,
    rpc: Arc<dyn TransactionRpc>,
}

impl std::fmt::Debug for SubmittedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmittedTransaction")
            .field("hash", &self.hash)
            .field("nonce", &self.nonce)
            .field("method", &self.method)
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}

impl SubmittedTransaction {
    /// Poll for the receipt until it appears or `timeout` elapses.
    pub async fn confirm(
        &self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<ReceiptSummary, ChainError> {
        let poll = async {
            loop {
                match self.rpc.transaction_receipt(self.hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {}
                    Err(e) if e.is_transient() => {
                        debug!(tx_hash = %self.hash, error = %e, "Receipt lookup failed, polling again");
                    }
                    Err(e) => return Err(ChainError::network("transaction receipt")(e)),
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        let receipt = tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| ChainError::Timeout {
                operation: "transaction confirmation",
                after: timeout,
            })??;

        if !receipt.success {
            warn!(tx_hash = %self.hash, method = %self.method, "Transaction reverted");
            return Err(ChainError::Reverted {
                method: self.method.clone(),
                hash: self.hash,
            });
        }

        info!(
            tx_hash = %self.hash,
            block = receipt.block_number.unwrap_or(0),
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }
}

/// Builder for [`TransactionSubmitter`].
pub struct TransactionSubmitterBuilder {
    rpc: Arc<dyn TransactionRpc>,
    signer: Arc<AdminSigner>,
    target: ContractInterface,
    chain_id: Option<u64>,
    gas_strategy: Option<Box<dyn GasStrategy>>,
    gas_limit_buffer_pct: u64,
    retry: RetryPolicy,
    log_transactions: bool,
}

impl TransactionSubmitterBuilder {
    pub fn new(
        rpc: Arc<dyn TransactionRpc>,
        signer: Arc<AdminSigner>,
        target: ContractInterface,
    ) -> Self {
        Self {
            rpc,
            signer,
            target,
            chain_id: None,
            gas_strategy: None,
            gas_limit_buffer_pct: 0,
            retry: RetryPolicy::default(),
            log_transactions: false,
        }
    }

    /// Skip the `eth_chainId` lookup on build.
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn gas_strategy(mut self, strategy: Box<dyn GasStrategy>) -> Self {
        self.gas_strategy = Some(strategy);
        self
    }

    /// Extra headroom added on top of the node's gas estimate.
    pub fn gas_limit_buffer_pct(mut self, pct: u64) -> Self {
        self.gas_limit_buffer_pct = pct;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Log unsigned requests at debug level. Keep off in production.
    pub fn log_transactions(mut self, enabled: bool) -> Self {
        self.log_transactions = enabled;
        self
    }

    pub async fn build(self) -> Result<TransactionSubmitter, ChainError> {
        let chain_id = match self.chain_id {
            Some(id) => id,
            None => {
                let rpc = &self.rpc;
                self.retry
                    .run("chain id", || rpc.chain_id())
                    .await
                    .map_err(ChainError::network("chain id"))?
            }
        };

        let gas_strategy = self.gas_strategy.unwrap_or_else(|| {
            Box::new(LegacyGasStrategy::new(
                1_000_000_000,  // 1 gwei default
                10_000_000_000, // 10 gwei max
            ))
        });

        info!(
            admin = %self.signer.address(),
            contract = self.target.name(),
            address = %self.target.address(),
            chain_id,
            gas_strategy = gas_strategy.strategy_name(),
            "Transaction submitter initialized"
        );

        Ok(TransactionSubmitter {
            rpc: self.rpc,
            signer: self.signer,
            target: self.target,
            chain_id,
            gas_strategy,
            cached_gas_params: RwLock::new(None),
            gas_limit_buffer_pct: self.gas_limit_buffer_pct,
            retry: self.retry,
            log_transactions: self.log_transactions,
            nonce: Mutex::new(NonceManager::default()),
        })
    }
}

/// Signs and broadcasts calls to one fixed contract with the admin key.
pub struct TransactionSubmitter {
    rpc: Arc<dyn TransactionRpc>,
    signer: Arc<AdminSigner>,
    target: ContractInterface,
    chain_id: u64,
    gas_strategy: Box<dyn GasStrategy>,
    /// Last fee data, reused when a refresh fails
    cached_gas_params: RwLock<Option<GasParams>>,
    gas_limit_buffer_pct: u64,
    retry: RetryPolicy,
    log_transactions: bool,
    nonce: Mutex<NonceManager>,
}

impl TransactionSubmitter {
    pub fn admin(&self) -> Address {
        self.signer.address()
    }

    pub fn target(&self) -> &ContractInterface {
        &self.target
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn gas_strategy_name(&self) -> &'static str {
        self.gas_strategy.strategy_name()
    }

    pub fn cached_gas_params(&self) -> Option<GasParams> {
        self.cached_gas_params.read().clone()
    }

    /// Next nonce this submitter would use without asking the chain.
    pub async fn next_local_nonce(&self) -> Option<u64> {
        self.nonce.lock().await.next_local()
    }

    /// Encode, sign and broadcast `intent` against the target contract.
    #[instrument(skip(self, intent), fields(method = %intent.method))]
    pub async fn submit(&self, intent: TransactionIntent) -> Result<SubmittedTransaction, ChainError> {
        let TransactionIntent {
            method,
            args,
            value,
        } = intent;
        let calldata = self.target.encode_call(&method, &args)?;
        let from = self.signer.address();

        let mut nonces = self.nonce.lock().await;

        let rpc = &self.rpc;
        let chain_count = self
            .retry
            .run("transaction count", || rpc.transaction_count(from))
            .await
            .map_err(ChainError::network("transaction count"))?;
        let nonce = nonces.reserve(chain_count);

        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_to(self.target.address())
            .with_input(calldata)
            .with_value(value)
            .with_nonce(nonce);

        let estimate_request = &tx;
        let estimated = self
            .retry
            .run("gas estimation", || rpc.estimate_gas(estimate_request))
            .await
            .map_err(|source| ChainError::GasEstimation {
                method: method.clone(),
                source,
            })?;
        let gas_limit = self.apply_buffer(estimated);

        let gas_params = self.gas_params().await?;
        tx.set_gas_limit(gas_limit);
        tx.set_chain_id(self.chain_id);
        self.gas_strategy.apply_gas(&mut tx, &gas_params);

        if self.log_transactions {
            debug!(
                to = %self.target.address(),
                nonce,
                gas_limit,
                value = %value,
                gas_price = gas_params.effective_gas_price(),
                data = %tx.input.input().map(calldata_preview).unwrap_or_default(),
                "Unsigned transaction"
            );
        }

        let envelope = TransactionBuilder::<Ethereum>::build(tx, self.signer.wallet())
            .await
            .map_err(|e| ChainError::Signing {
                method: method.clone(),
                reason: e.to_string(),
            })?;
        let raw = envelope.encoded_2718();

        match self.retry.once(rpc.send_raw_transaction(&raw)).await {
            Ok(hash) => {
                nonces.commit(nonce);
                info!(
                    tx_hash = %hash,
                    nonce,
                    gas_limit,
                    gas_strategy = self.gas_strategy.strategy_name(),
                    "Transaction broadcast"
                );
                Ok(SubmittedTransaction {
                    hash,
                    nonce,
                    method,
                    gas_limit,
                    rpc: Arc::clone(&self.rpc),
                })
            }
            Err(source) => {
                nonces.release(nonce);
                warn!(nonce, error = %source, "Broadcast failed, nonce released");
                Err(ChainError::Submission { method, source })
            }
        }
    }

    fn apply_buffer(&self, estimated: u64) -> u64 {
        estimated.saturating_add(estimated.saturating_mul(self.gas_limit_buffer_pct) / 100)
    }

    /// Fresh fee data, else the last known values, else the strategy's defaults.
    async fn gas_params(&self) -> Result<GasParams, ChainError> {
        let rpc = self.rpc.as_ref();
        let strategy = self.gas_strategy.as_ref();
        let fetched: Result<GasParams, RpcError> = self
            .retry
            .run("fee data", || strategy.fetch_params(rpc))
            .await;

        match fetched {
            Ok(params) => {
                *self.cached_gas_params.write() = Some(params.clone());
                Ok(params)
            }
            Err(e) => {
                if let Some(cached) = self.cached_gas_params() {
                    warn!(error = %e, "Fee data unavailable, using cached values");
                    return Ok(cached);
                }
                match strategy.fallback_params() {
                    Some(fallback) => {
                        warn!(error = %e, "Fee data unavailable, using configured defaults");
                        Ok(fallback)
                    }
                    None => Err(ChainError::network("fee data")(e)),
                }
            }
        }
    }
}

impl std::fmt::Debug for TransactionSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSubmitter")
            .field("admin", &self.signer.address())
            .field("target", &self.target.address())
            .field("chain_id", &self.chain_id)
            .field("gas_strategy", &self.gas_strategy.strategy_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::Eip1559GasStrategy;
    use crate::mock::MockRpc;

    // Well-known development key (DO NOT USE IN PRODUCTION)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            call_timeout_ms: 200,
        }
    }

    async fn submitter(rpc: &Arc<MockRpc>) -> TransactionSubmitter {
        let signer = Arc::new(AdminSigner::from_private_key(TEST_KEY).unwrap());
        let target = ContractInterface::safe_liquidator(Address::repeat_byte(0x11)).unwrap();
        TransactionSubmitterBuilder::new(rpc.clone(), signer, target)
            .retry(fast_retry())
            .log_transactions(true)
            .build()
            .await
            .unwrap()
    }

    fn liquidate_intent() -> TransactionIntent {
        TransactionIntent::new(
            "safeLiquidate",
            vec![
                DynSolValue::Address(Address::repeat_byte(0x01)),
                DynSolValue::Address(Address::repeat_byte(0x02)),
                DynSolValue::Address(Address::repeat_byte(0x03)),
                DynSolValue::Uint(U256::ZERO, 256),
                DynSolValue::Address(Address::ZERO),
                DynSolValue::Address(Address::ZERO),
                DynSolValue::Array(vec![]),
                DynSolValue::Array(vec![]),
            ],
        )
        .with_value(U256::from(1_000u64))
    }

    #[test]
    fn test_admin_signer_from_key() {
        let expected: Address = TEST_ADDRESS.parse().unwrap();
        let with_prefix = AdminSigner::from_private_key(TEST_KEY).unwrap();
        let without_prefix = AdminSigner::from_private_key(&TEST_KEY[2..]).unwrap();

        assert_eq!(with_prefix.address(), expected);
        assert_eq!(without_prefix.address(), expected);
    }

    #[test]
    fn test_admin_signer_debug_hides_key() {
        let signer = AdminSigner::from_private_key(TEST_KEY).unwrap();
        let shown = format!("{signer:?}").to_lowercase();
        assert!(shown.contains(TEST_ADDRESS));
        assert!(!shown.contains(&TEST_KEY[2..]));
    }

    #[test]
    fn test_admin_signer_rejects_bad_keys() {
        assert!(matches!(
            AdminSigner::from_private_key("0xnothex"),
            Err(ChainError::InvalidKey(_))
        ));
        assert!(matches!(
            AdminSigner::from_private_key("0x1234"),
            Err(ChainError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_admin_signer_expected_address() {
        let expected: Address = TEST_ADDRESS.parse().unwrap();
        let signer = AdminSigner::from_private_key(TEST_KEY).unwrap();
        let signer = signer.with_expected_address(Some(expected)).unwrap();
        let signer = signer.with_expected_address(None).unwrap();

        let err = signer
            .with_expected_address(Some(Address::repeat_byte(0x42)))
            .unwrap_err();
        assert!(matches!(err, ChainError::SignerMismatch { actual, .. } if actual == expected));
    }

    #[test]
    fn test_nonce_manager() {
        let mut manager = NonceManager::default();

        assert_eq!(manager.reserve(10), 10);
        manager.commit(10);
        assert_eq!(manager.next_local(), Some(11));

        // Lagging chain count
        assert_eq!(manager.reserve(10), 11);
        // Chain ahead of us (transactions sent elsewhere)
        assert_eq!(manager.reserve(15), 15);
        assert_eq!(manager.last_synced(), Some(15));

        // Failed broadcast of 15: reused, never dropped below
        manager.release(15);
        assert_eq!(manager.reserve(9), 15);
        assert_eq!(manager.reserve(17), 17);
    }

    #[tokio::test]
    async fn test_builder_fetches_chain_id() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_chain_id(56);
        let submitter = submitter(&rpc).await;

        assert_eq!(submitter.chain_id(), 56);
        assert_eq!(submitter.gas_strategy_name(), "Legacy");
        assert!(!format!("{submitter:?}").contains(&TEST_KEY[2..]));
    }

    #[tokio::test]
    async fn test_sequential_submits_use_increasing_nonces() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_transaction_count(5);
        let submitter = submitter(&rpc).await;

        let first = submitter.submit(liquidate_intent()).await.unwrap();
        let second = submitter.submit(liquidate_intent()).await.unwrap();

        assert_eq!(first.nonce, 5);
        assert_eq!(second.nonce, 6);
        assert_eq!(first.method, "safeLiquidate");
        assert_ne!(first.hash, second.hash);
        assert_eq!(rpc.broadcasts().len(), 2);
        assert_eq!(submitter.next_local_nonce().await, Some(7));
    }

    #[tokio::test]
    async fn test_concurrent_submits_never_share_a_nonce() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_transaction_count(3);
        rpc.set_latency("estimate_gas", Duration::from_millis(5));
        let submitter = submitter(&rpc).await;

        let (a, b) = tokio::join!(
            submitter.submit(liquidate_intent()),
            submitter.submit(liquidate_intent())
        );
        let mut nonces = vec![a.unwrap().nonce, b.unwrap().nonce];
        nonces.sort_unstable();

        assert_eq!(nonces, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_estimate_request_carries_nonce_and_sender() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_transaction_count(9);
        let submitter = submitter(&rpc).await;
        submitter.submit(liquidate_intent()).await.unwrap();

        let requests = rpc.estimate_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].nonce, Some(9));
        assert_eq!(requests[0].from, Some(TEST_ADDRESS.parse().unwrap()));
        assert_eq!(requests[0].value, Some(U256::from(1_000u64)));
    }

    #[tokio::test]
    async fn test_gas_limit_buffer() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_gas_estimate(100_000);
        let signer = Arc::new(AdminSigner::from_private_key(TEST_KEY).unwrap());
        let target = ContractInterface::safe_liquidator(Address::repeat_byte(0x11)).unwrap();
        let submitter = TransactionSubmitterBuilder::new(rpc.clone(), signer, target)
            .chain_id(1)
            .gas_limit_buffer_pct(20)
            .gas_strategy(Box::new(Eip1559GasStrategy::new(1_000_000_000, 2.0)))
            .retry(fast_retry())
            .build()
            .await
            .unwrap();

        let submitted = submitter.submit(liquidate_intent()).await.unwrap();
        assert_eq!(submitted.gas_limit, 120_000);
        assert_eq!(rpc.calls("chain_id"), 0);
        assert!(matches!(submitter.cached_gas_params(), Some(GasParams::Eip1559 { .. })));
    }

    #[tokio::test]
    async fn test_broadcast_failure_names_method() {
        let rpc = Arc::new(MockRpc::new());
        rpc.fail_next(
            "send_raw_transaction",
            1,
            RpcError::Rpc {
                code: -32000,
                message: "insufficient funds".into(),
            },
        );
        let submitter = submitter(&rpc).await;

        let err = submitter.submit(liquidate_intent()).await.unwrap_err();
        assert!(matches!(err, ChainError::Submission { .. }));
        assert!(err.to_string().contains("safeLiquidate"));
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn test_broadcast_is_not_retried() {
        let rpc = Arc::new(MockRpc::new());
        rpc.fail_next("send_raw_transaction", 1, RpcError::Transport("reset".into()));
        let submitter = submitter(&rpc).await;

        assert!(submitter.submit(liquidate_intent()).await.is_err());
        assert_eq!(rpc.calls("send_raw_transaction"), 1);
    }

    #[tokio::test]
    async fn test_failed_broadcast_reuses_its_nonce() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_transaction_count(20);
        let submitter = submitter(&rpc).await;

        let first = submitter.submit(liquidate_intent()).await.unwrap();
        assert_eq!(first.nonce, 20);

        rpc.fail_next("send_raw_transaction", 1, RpcError::Transport("reset".into()));
        assert!(submitter.submit(liquidate_intent()).await.is_err());
        assert_eq!(submitter.next_local_nonce().await, Some(21));

        // The node still reports 20 pending; 20 is already taken by `first`
        let next = submitter.submit(liquidate_intent()).await.unwrap();
        assert_eq!(next.nonce, 21);
        assert_eq!(rpc.broadcasts().len(), 2);
    }

    #[tokio::test]
    async fn test_node_ahead_after_failure_wins() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_transaction_count(4);
        let submitter = submitter(&rpc).await;

        rpc.fail_next("send_raw_transaction", 1, RpcError::Transport("reset".into()));
        assert!(submitter.submit(liquidate_intent()).await.is_err());

        // Transactions sent from elsewhere moved the account forward
        rpc.set_transaction_count(8);
        assert_eq!(submitter.submit(liquidate_intent()).await.unwrap().nonce, 8);
    }

    #[tokio::test]
    async fn test_gas_estimation_failure() {
        let rpc = Arc::new(MockRpc::new());
        rpc.fail_next(
            "estimate_gas",
            1,
            RpcError::Rpc {
                code: 3,
                message: "execution reverted".into(),
            },
        );
        let submitter = submitter(&rpc).await;

        let err = submitter.submit(liquidate_intent()).await.unwrap_err();
        assert!(matches!(err, ChainError::GasEstimation { ref method, .. } if method == "safeLiquidate"));
        assert!(!err.is_retryable());
        assert!(rpc.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_encoding_failure_makes_no_rpc_calls() {
        let rpc = Arc::new(MockRpc::new());
        let submitter = submitter(&rpc).await;

        let err = submitter
            .submit(TransactionIntent::new("safeLiquidate", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Encoding { .. }));
        assert_eq!(rpc.calls("transaction_count"), 0);
    }

    #[tokio::test]
    async fn test_transient_nonce_lookup_is_retried() {
        let rpc = Arc::new(MockRpc::new());
        rpc.fail_next("transaction_count", 2, RpcError::Transport("reset".into()));
        let submitter = submitter(&rpc).await;

        assert!(submitter.submit(liquidate_intent()).await.is_ok());
        assert_eq!(rpc.calls("transaction_count"), 3);
    }

    #[tokio::test]
    async fn test_fee_data_is_cached() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_gas_price(2_000_000_000);
        let submitter = submitter(&rpc).await;
        submitter.submit(liquidate_intent()).await.unwrap();

        assert_eq!(
            submitter.cached_gas_params(),
            Some(GasParams::Legacy { gas_price: 2_000_000_000 })
        );
    }

    #[tokio::test]
    async fn test_fee_outage_falls_back_to_cache_then_defaults() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_gas_price(4_000_000_000);
        let submitter = submitter(&rpc).await;

        // Cold cache: default price of the builder's legacy strategy (1 gwei)
        rpc.fail_next("gas_price", 3, RpcError::Transport("reset".into()));
        submitter.submit(liquidate_intent()).await.unwrap();
        assert_eq!(rpc.calls("gas_price"), 3);
        assert_eq!(submitter.cached_gas_params(), None);

        submitter.submit(liquidate_intent()).await.unwrap();
        assert_eq!(
            submitter.cached_gas_params(),
            Some(GasParams::Legacy { gas_price: 4_000_000_000 })
        );

        rpc.fail_next("gas_price", 3, RpcError::Transport("reset".into()));
        submitter.submit(liquidate_intent()).await.unwrap();
        assert_eq!(rpc.broadcasts().len(), 3);
    }

    #[tokio::test]
    async fn test_fee_outage_without_fallback_fails() {
        let rpc = Arc::new(MockRpc::new());
        rpc.fail_next("latest_base_fee", 3, RpcError::Transport("reset".into()));
        let signer = Arc::new(AdminSigner::from_private_key(TEST_KEY).unwrap());
        let target = ContractInterface::safe_liquidator(Address::repeat_byte(0x11)).unwrap();
        let submitter = TransactionSubmitterBuilder::new(rpc.clone(), signer, target)
            .chain_id(1)
            .gas_strategy(Box::new(Eip1559GasStrategy::new(1_000_000_000, 2.0)))
            .retry(fast_retry())
            .build()
            .await
            .unwrap();

        let err = submitter.submit(liquidate_intent()).await.unwrap_err();
        assert!(matches!(err, ChainError::Network { operation: "fee data", .. }));
        assert!(rpc.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_success() {
        let rpc = Arc::new(MockRpc::new());
        let submitter = submitter(&rpc).await;
        let submitted = submitter.submit(liquidate_intent()).await.unwrap();
        rpc.set_receipt(ReceiptSummary {
            hash: submitted.hash,
            block_number: Some(100),
            gas_used: 90_000,
            success: true,
        });

        let receipt = submitted
            .confirm(Duration::from_secs(1), Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(receipt.block_number, Some(100));
    }

    #[tokio::test]
    async fn test_confirm_reverted() {
        let rpc = Arc::new(MockRpc::new());
        let submitter = submitter(&rpc).await;
        let submitted = submitter.submit(liquidate_intent()).await.unwrap();
        rpc.set_receipt(ReceiptSummary {
            hash: submitted.hash,
            block_number: Some(100),
            gas_used: 90_000,
            success: false,
        });

        let err = submitted
            .confirm(Duration::from_secs(1), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Reverted { hash, .. } if hash == submitted.hash));
    }

    #[tokio::test]
    async fn test_confirm_times_out() {
        let rpc = Arc::new(MockRpc::new());
        let submitter = submitter(&rpc).await;
        let submitted = submitter.submit(liquidate_intent()).await.unwrap();

        let err = submitted
            .confirm(Duration::from_millis(30), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Timeout { .. }));
        assert!(rpc.calls("transaction_receipt") >= 2);
    }
}
