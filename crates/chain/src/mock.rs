//! In-memory RPC double for tests.
//!
//! Implements both [`OracleReader`] and [`TransactionRpc`] against local
//! state. Failures can be injected per method, every call is counted, and
//! broadcasts are recorded so tests can inspect nonces and ordering.

use crate::error::RpcError;
use crate::rpc::{OracleReader, ReceiptSummary, TransactionRpc};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// A broadcast the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub hash: B256,
    pub raw: Bytes,
}

#[derive(Debug)]
struct MockState {
    aggregator_prices: HashMap<Address, U256>,
    delegates: HashMap<Address, Address>,
    oracle_prices: HashMap<(Address, Address), U256>,
    failures: HashMap<&'static str, VecDeque<RpcError>>,
    latency: HashMap<&'static str, Duration>,
    calls: HashMap<&'static str, usize>,
    chain_id: u64,
    transaction_count: u64,
    gas_price: u128,
    priority_fee: u128,
    base_fee: Option<u128>,
    gas_estimate: u64,
    estimate_requests: Vec<TransactionRequest>,
    broadcasts: Vec<Broadcast>,
    receipts: HashMap<B256, ReceiptSummary>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            aggregator_prices: HashMap::new(),
            delegates: HashMap::new(),
            oracle_prices: HashMap::new(),
            failures: HashMap::new(),
            latency: HashMap::new(),
            calls: HashMap::new(),
            chain_id: 31337,
            transaction_count: 0,
            gas_price: 1_000_000_000,
            priority_fee: 1_000_000_000,
            base_fee: Some(10_000_000_000),
            gas_estimate: 500_000,
            estimate_requests: Vec::new(),
            broadcasts: Vec::new(),
            receipts: HashMap::new(),
        }
    }
}

/// Scriptable stand-in for a JSON-RPC node.
#[derive(Debug, Default)]
pub struct MockRpc {
    state: Mutex<MockState>,
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_aggregator_price(&self, token: Address, price: U256) {
        self.state.lock().aggregator_prices.insert(token, price);
    }

    pub fn set_delegate(&self, token: Address, oracle: Address) {
        self.state.lock().delegates.insert(token, oracle);
    }

    pub fn set_oracle_price(&self, oracle: Address, token: Address, price: U256) {
        self.state.lock().oracle_prices.insert((oracle, token), price);
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    /// Pending transaction count reported for every account.
    pub fn set_transaction_count(&self, count: u64) {
        self.state.lock().transaction_count = count;
    }

    pub fn set_gas_price(&self, gas_price: u128) {
        self.state.lock().gas_price = gas_price;
    }

    pub fn set_priority_fee(&self, fee: u128) {
        self.state.lock().priority_fee = fee;
    }

    pub fn set_base_fee(&self, base_fee: Option<u128>) {
        self.state.lock().base_fee = base_fee;
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state.lock().gas_estimate = gas;
    }

    pub fn set_receipt(&self, receipt: ReceiptSummary) {
        self.state.lock().receipts.insert(receipt.hash, receipt);
    }

    /// Fail the next `times` calls of `method` with `error`.
    pub fn fail_next(&self, method: &'static str, times: usize, error: RpcError) {
        let mut state = self.state.lock();
        let queue = state.failures.entry(method).or_default();
        queue.extend(std::iter::repeat(error).take(times));
    }

    /// Delay every call of `method` by `delay`.
    pub fn set_latency(&self, method: &'static str, delay: Duration) {
        self.state.lock().latency.insert(method, delay);
    }

    /// Number of times `method` was invoked, including failed calls.
    pub fn calls(&self, method: &str) -> usize {
        self.state.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Transactions passed to `estimate_gas`, in call order.
    pub fn estimate_requests(&self) -> Vec<TransactionRequest> {
        self.state.lock().estimate_requests.clone()
    }

    /// Accepted broadcasts, in call order.
    pub fn broadcasts(&self) -> Vec<Broadcast> {
        self.state.lock().broadcasts.clone()
    }

    /// Count the call, wait out any latency and pop an injected failure.
    async fn enter(&self, method: &'static str) -> Result<(), RpcError> {
        let delay = {
            let mut state = self.state.lock();
            *state.calls.entry(method).or_default() += 1;
            state.latency.get(method).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self
            .state
            .lock()
            .failures
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn reverted() -> RpcError {
    RpcError::Rpc {
        code: 3,
        message: "execution reverted".into(),
    }
}

#[async_trait]
impl OracleReader for MockRpc {
    async fn aggregator_price(&self, _aggregator: Address, token: Address) -> Result<U256, RpcError> {
        self.enter("aggregator_price").await?;
        self.state
            .lock()
            .aggregator_prices
            .get(&token)
            .copied()
            .ok_or_else(reverted)
    }

    async fn delegate_oracle(&self, _aggregator: Address, token: Address) -> Result<Address, RpcError> {
        self.enter("delegate_oracle").await?;
        Ok(self
            .state
            .lock()
            .delegates
            .get(&token)
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn oracle_price(&self, oracle: Address, token: Address) -> Result<U256, RpcError> {
        self.enter("oracle_price").await?;
        self.state
            .lock()
            .oracle_prices
            .get(&(oracle, token))
            .copied()
            .ok_or_else(reverted)
    }
}

#[async_trait]
impl TransactionRpc for MockRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        self.enter("chain_id").await?;
        Ok(self.state.lock().chain_id)
    }

    async fn transaction_count(&self, _account: Address) -> Result<u64, RpcError> {
        self.enter("transaction_count").await?;
        Ok(self.state.lock().transaction_count)
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        self.enter("gas_price").await?;
        Ok(self.state.lock().gas_price)
    }

    async fn max_priority_fee_per_gas(&self) -> Result<u128, RpcError> {
        self.enter("max_priority_fee_per_gas").await?;
        Ok(self.state.lock().priority_fee)
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>, RpcError> {
        self.enter("latest_base_fee").await?;
        Ok(self.state.lock().base_fee)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RpcError> {
        self.enter("estimate_gas").await?;
        let mut state = self.state.lock();
        state.estimate_requests.push(tx.clone());
        Ok(state.gas_estimate)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
        self.enter("send_raw_transaction").await?;
        let hash = keccak256(raw);
        let mut state = self.state.lock();
        state.broadcasts.push(Broadcast {
            hash,
            raw: Bytes::copy_from_slice(raw),
        });
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, RpcError> {
        self.enter("transaction_receipt").await?;
        Ok(self.state.lock().receipts.get(&hash).cloned())
    }
}
