//! Liquidation calls against the liquidator contract.
//!
//! Builds [`TransactionIntent`]s for the contract's entry points and hands
//! them to the shared [`TransactionSubmitter`].

use alloy::primitives::{Address, Bytes, U256};
use liquidator_chain::{
    ChainError, DynSolValue, ReceiptSummary, SubmittedTransaction, TransactionIntent,
    TransactionSubmitter,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const SAFE_LIQUIDATE: &str = "safeLiquidate";
pub const SAFE_LIQUIDATE_TO_TOKENS_WITH_FLASH_LOAN: &str = "safeLiquidateToTokensWithFlashLoan";

/// Redemption steps applied to seized collateral before swapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedemptionRoute {
    pub strategies: Vec<Address>,
    pub data: Vec<Bytes>,
}

impl RedemptionRoute {
    fn into_args(self) -> [DynSolValue; 2] {
        [addresses(self.strategies), byte_strings(self.data)]
    }
}

/// Repay the borrow in the native currency, sent as transaction value.
#[derive(Debug, Clone)]
pub struct NativeRepay {
    pub borrower: Address,
    pub repay_amount: U256,
    pub c_ether: Address,
    pub c_erc20_collateral: Address,
    pub min_output_amount: U256,
    pub exchange_seized_to: Address,
    pub uniswap_v2_router: Address,
    pub redemption: RedemptionRoute,
}

/// Repay the borrow in an ERC20 held by the liquidator.
#[derive(Debug, Clone)]
pub struct TokenRepay {
    pub borrower: Address,
    pub repay_amount: U256,
    pub c_erc20: Address,
    pub c_token_collateral: Address,
    pub min_output_amount: U256,
    pub exchange_seized_to: Address,
    pub uniswap_v2_router: Address,
    pub redemption: RedemptionRoute,
}

/// Borrow the repay amount with a flash swap and keep the profit in tokens.
#[derive(Debug, Clone)]
pub struct FlashLoanRepay {
    pub borrower: Address,
    pub repay_amount: U256,
    pub c_erc20: Address,
    pub c_token_collateral: Address,
    pub min_profit_amount: U256,
    pub exchange_profit_to: Address,
    pub uniswap_v2_router_for_borrow: Address,
    pub uniswap_v2_router_for_collateral: Address,
    pub redemption: RedemptionRoute,
    pub eth_to_coinbase: U256,
    pub funding: RedemptionRoute,
}

impl From<NativeRepay> for TransactionIntent {
    fn from(p: NativeRepay) -> Self {
        let [strategies, data] = p.redemption.into_args();
        TransactionIntent::new(
            SAFE_LIQUIDATE,
            vec![
                DynSolValue::Address(p.borrower),
                DynSolValue::Address(p.c_ether),
                DynSolValue::Address(p.c_erc20_collateral),
                uint(p.min_output_amount),
                DynSolValue::Address(p.exchange_seized_to),
                DynSolValue::Address(p.uniswap_v2_router),
                strategies,
                data,
            ],
        )
        .with_value(p.repay_amount)
    }
}

impl From<TokenRepay> for TransactionIntent {
    fn from(p: TokenRepay) -> Self {
        let [strategies, data] = p.redemption.into_args();
        TransactionIntent::new(
            SAFE_LIQUIDATE,
            vec![
                DynSolValue::Address(p.borrower),
                uint(p.repay_amount),
                DynSolValue::Address(p.c_erc20),
                DynSolValue::Address(p.c_token_collateral),
                uint(p.min_output_amount),
                DynSolValue::Address(p.exchange_seized_to),
                DynSolValue::Address(p.uniswap_v2_router),
                strategies,
                data,
            ],
        )
    }
}

impl From<FlashLoanRepay> for TransactionIntent {
    fn from(p: FlashLoanRepay) -> Self {
        let [strategies, data] = p.redemption.into_args();
        let [funding_strategies, funding_data] = p.funding.into_args();
        TransactionIntent::new(
            SAFE_LIQUIDATE_TO_TOKENS_WITH_FLASH_LOAN,
            vec![
                DynSolValue::Address(p.borrower),
                uint(p.repay_amount),
                DynSolValue::Address(p.c_erc20),
                DynSolValue::Address(p.c_token_collateral),
                uint(p.min_profit_amount),
                DynSolValue::Address(p.exchange_profit_to),
                DynSolValue::Address(p.uniswap_v2_router_for_borrow),
                DynSolValue::Address(p.uniswap_v2_router_for_collateral),
                strategies,
                data,
                uint(p.eth_to_coinbase),
                funding_strategies,
                funding_data,
            ],
        )
    }
}

fn uint(value: U256) -> DynSolValue {
    DynSolValue::Uint(value, 256)
}

fn addresses(values: Vec<Address>) -> DynSolValue {
    DynSolValue::Array(values.into_iter().map(DynSolValue::Address).collect())
}

fn byte_strings(values: Vec<Bytes>) -> DynSolValue {
    DynSolValue::Array(
        values
            .into_iter()
            .map(|b| DynSolValue::Bytes(b.to_vec()))
            .collect(),
    )
}

const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CONFIRM_POLL: Duration = Duration::from_secs(1);

/// Sends liquidations through the admin-signed submitter.
#[derive(Debug, Clone)]
pub struct LiquidationClient {
    submitter: Arc<TransactionSubmitter>,
    confirm_timeout: Duration,
    confirm_poll: Duration,
}

impl LiquidationClient {
    pub fn new(submitter: Arc<TransactionSubmitter>) -> Self {
        Self {
            submitter,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            confirm_poll: DEFAULT_CONFIRM_POLL,
        }
    }

    /// How long [`confirm`](Self::confirm) waits and how often it polls.
    pub fn with_confirmation(mut self, timeout: Duration, poll: Duration) -> Self {
        self.confirm_timeout = timeout;
        self.confirm_poll = poll;
        self
    }

    pub fn liquidator(&self) -> Address {
        self.submitter.target().address()
    }

    pub fn admin(&self) -> Address {
        self.submitter.admin()
    }

    pub fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }

    pub async fn liquidate_native_repay(
        &self,
        params: NativeRepay,
    ) -> Result<SubmittedTransaction, ChainError> {
        info!(borrower = %params.borrower, repay = %params.repay_amount, "Liquidating with native repay");
        self.submit(params.into()).await
    }

    pub async fn liquidate_token_repay(
        &self,
        params: TokenRepay,
    ) -> Result<SubmittedTransaction, ChainError> {
        info!(borrower = %params.borrower, repay = %params.repay_amount, "Liquidating with token repay");
        self.submit(params.into()).await
    }

    pub async fn liquidate_with_flash_loan(
        &self,
        params: FlashLoanRepay,
    ) -> Result<SubmittedTransaction, ChainError> {
        info!(borrower = %params.borrower, repay = %params.repay_amount, "Liquidating with flash loan");
        self.submit(params.into()).await
    }

    /// Submit any liquidator method by name.
    pub async fn submit(&self, intent: TransactionIntent) -> Result<SubmittedTransaction, ChainError> {
        self.submitter.submit(intent).await
    }

    /// Wait for a liquidation to be mined; reverts are errors.
    pub async fn confirm(&self, tx: &SubmittedTransaction) -> Result<ReceiptSummary, ChainError> {
        tx.confirm(self.confirm_timeout, self.confirm_poll).await
    }
}
