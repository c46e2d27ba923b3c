//! Liquidator core logic.
//!
//! This crate provides the market-facing functionality:
//! - Asset registry with oracle classification
//! - Price feed verification against the master price oracle
//! - Liquidation calls through the admin-signed submitter
//! - Pool directory and reward flywheel reads
//! - Periodic oracle monitoring
//! - Runtime and deployment configuration

mod assets;
pub mod config;
mod liquidation;
mod monitor;
mod pools;
mod rewards;
mod sdk;
mod verifier;

pub use assets::{AssetDescriptor, AssetRegistry, OracleCategory, OracleKind};
pub use config::{BotConfig, DeploymentConfig};
pub use liquidation::{
    FlashLoanRepay, LiquidationClient, NativeRepay, RedemptionRoute, TokenRepay, SAFE_LIQUIDATE,
    SAFE_LIQUIDATE_TO_TOKENS_WITH_FLASH_LOAN,
};
pub use monitor::{FeedFailure, MonitorReport, OracleMonitor};
pub use pools::{PoolReader, PoolSummary};
pub use rewards::{FlywheelInfo, RewardsClient};
pub use sdk::MarketClient;
pub use verifier::{PriceComparison, PriceFeedVerifier, PriceObservation, NATIVE_PRICE, UNVERIFIED_PRICE};
