//! Configuration for the liquidator.
//!
//! This module provides:
//! - Bot runtime configuration (profiles, verifier, monitor, submitter, RPC retry)
//! - Deployment configuration (chain, gas settings, market contracts, assets)
//! - Admin key loading from the environment

mod admin;
mod bot;
mod chain;
mod deployment;

pub use admin::{admin_signer_from, admin_signer_from_env, ADMIN_ACCOUNT, ADMIN_PRIVATE_KEY};
pub use bot::{BotConfig, MonitorConfig, SubmitterConfig, VerifierConfig};
pub use chain::{ChainDetails, GasConfig};
pub use deployment::{DeploymentConfig, MarketContracts};
