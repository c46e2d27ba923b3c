//! Lending market liquidator
//!
//! Verifies every configured price feed against the master price oracle on
//! a fixed interval. With ADMIN_PRIVATE_KEY set, the liquidation client is
//! wired up with the admin signer.
//!
//! Environment:
//! - DEPLOYMENT_CONFIG: deployment TOML (default `./config/deployment.toml`)
//! - BOT_PROFILE / BOT_CONFIG: runtime profile or file
//! - ADMIN_PRIVATE_KEY / ADMIN_ACCOUNT: admin signer, optional
//! - LOG_FORMAT=json: structured log output
//! - MONITOR_ONCE=1: run one round, print the report as JSON and exit

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use liquidator_chain::AlloyRpc;
use liquidator_core::config::admin_signer_from_env;
use liquidator_core::{BotConfig, DeploymentConfig, MarketClient, OracleMonitor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let deployment = DeploymentConfig::load_from_env().context("Failed to load deployment")?;
    deployment.log_summary();

    // A [bot] section in the deployment wins over BOT_PROFILE
    let bot_config = match deployment.bot.clone() {
        Some(bot) => bot,
        None => BotConfig::load()?,
    };
    bot_config.log_config();

    let rpc = Arc::new(
        AlloyRpc::connect(&deployment.chain.rpc_url)
            .await
            .context("RPC endpoint unreachable")?,
    );

    let signer = admin_signer_from_env()?.map(Arc::new);
    match &signer {
        Some(signer) => {
            let balance = rpc.balance(signer.address()).await.ok();
            info!(admin = %signer.address(), balance = ?balance, "Admin signer loaded");
        }
        None => warn!("ADMIN_PRIVATE_KEY not set, running read-only"),
    }

    let client = MarketClient::connect(rpc, &deployment, &bot_config, signer)
        .await
        .context("Failed to initialize market client")?;

    let monitor = OracleMonitor::new(
        client.verifier.clone(),
        client.assets().clone(),
        bot_config.verifier.concurrency,
    );

    if std::env::var("MONITOR_ONCE").is_ok() {
        let report = monitor.run_cycle().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    monitor
        .run(bot_config.monitor.interval(), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Shutdown complete");
    Ok(())
}

/// Human-readable logs by default, JSON lines with LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,liquidator_core=debug,liquidator_chain=debug"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
