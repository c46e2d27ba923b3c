//! Periodic verification of every configured price feed.

use crate::assets::AssetRegistry;
use crate::verifier::{PriceFeedVerifier, PriceObservation};
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use liquidator_chain::ChainError;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// A feed that could not be verified.
#[derive(Debug, Clone, Serialize)]
pub struct FeedFailure {
    pub token: Address,
    pub symbol: String,
    /// Both oracles answered with different prices
    pub out_of_sync: bool,
    pub reason: String,
}

/// Outcome of one verification round.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub started_at: DateTime<Utc>,
    pub checked: usize,
    pub observations: Vec<PriceObservation>,
    pub failures: Vec<FeedFailure>,
}

impl MonitorReport {
    pub fn valid(&self) -> usize {
        self.observations.iter().filter(|o| o.valid).count()
    }

    pub fn invalid(&self) -> usize {
        self.observations.len() - self.valid()
    }

    pub fn out_of_sync(&self) -> impl Iterator<Item = &FeedFailure> {
        self.failures.iter().filter(|f| f.out_of_sync)
    }

    pub fn is_healthy(&self) -> bool {
        self.failures.is_empty() && self.invalid() == 0
    }
}

pub struct OracleMonitor {
    verifier: PriceFeedVerifier,
    assets: AssetRegistry,
    concurrency: usize,
}

impl OracleMonitor {
    pub fn new(verifier: PriceFeedVerifier, assets: AssetRegistry, concurrency: usize) -> Self {
        Self {
            verifier,
            assets,
            concurrency,
        }
    }

    /// Verify every priced asset once.
    pub async fn run_cycle(&self) -> MonitorReport {
        let started_at = Utc::now();
        let results = self
            .verifier
            .verify_all(self.assets.as_slice(), self.concurrency)
            .await;

        let mut observations = Vec::with_capacity(results.len());
        let mut failures = Vec::new();

        for (token, result) in results {
            match result {
                Ok(observation) => observations.push(observation),
                Err(e) => {
                    let symbol = self
                        .assets
                        .get_by_token(&token)
                        .map(|a| a.symbol.clone())
                        .unwrap_or_default();
                    let out_of_sync = matches!(e, ChainError::OraclesOutOfSync { .. });
                    if out_of_sync {
                        error!(%token, %symbol, error = %e, "Price feeds out of sync");
                    } else {
                        warn!(%token, %symbol, error = %e, "Price feed verification failed");
                    }
                    failures.push(FeedFailure {
                        token,
                        symbol,
                        out_of_sync,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let report = MonitorReport {
            started_at,
            checked: self.assets.len(),
            observations,
            failures,
        };

        info!(
            checked = report.checked,
            valid = report.valid(),
            invalid = report.invalid(),
            failed = report.failures.len(),
            "Price feed round complete"
        );
        report
    }

    /// Run rounds every `period` until `shutdown` resolves.
    pub async fn run(&self, period: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(period_secs = period.as_secs(), assets = self.assets.len(), "Oracle monitor started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Oracle monitor stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetDescriptor, OracleKind};
    use crate::verifier::PriceComparison;
    use alloy::primitives::U256;
    use liquidator_chain::mock::MockRpc;
    use liquidator_chain::RetryPolicy;
    use std::sync::Arc;

    const MPO: Address = Address::repeat_byte(0xAA);
    const DELEGATE: Address = Address::repeat_byte(0xBB);
    const GOOD: Address = Address::repeat_byte(0x01);
    const DESYNCED: Address = Address::repeat_byte(0x02);
    const UNPRICED: Address = Address::repeat_byte(0x03);

    fn monitor(rpc: &Arc<MockRpc>) -> OracleMonitor {
        let verifier = PriceFeedVerifier::new(rpc.clone(), MPO)
            .with_comparison(PriceComparison::Numeric)
            .with_retry(RetryPolicy::no_retry(Duration::from_millis(100)));
        let assets = AssetRegistry::new(vec![
            AssetDescriptor::new(GOOD, "GOOD", Some(OracleKind::ChainlinkPriceOracleV2)),
            AssetDescriptor::new(DESYNCED, "DESYNC", Some(OracleKind::DiaPriceOracle)),
            AssetDescriptor::new(UNPRICED, "RAW", None),
        ]);
        OracleMonitor::new(verifier, assets, 2)
    }

    fn mock() -> Arc<MockRpc> {
        let rpc = Arc::new(MockRpc::new());
        let price = U256::from(2_000u64);
        for token in [GOOD, DESYNCED] {
            rpc.set_aggregator_price(token, price);
            rpc.set_delegate(token, DELEGATE);
        }
        rpc.set_oracle_price(DELEGATE, GOOD, price);
        rpc.set_oracle_price(DELEGATE, DESYNCED, price + U256::from(1u64));
        rpc
    }

    #[tokio::test]
    async fn test_cycle_reports_each_asset() {
        let rpc = mock();
        let report = monitor(&rpc).run_cycle().await;

        assert_eq!(report.checked, 3);
        assert_eq!(report.observations.len(), 2);
        assert_eq!(report.valid(), 2);
        assert_eq!(report.failures.len(), 1);

        let failure = &report.failures[0];
        assert_eq!(failure.token, DESYNCED);
        assert_eq!(failure.symbol, "DESYNC");
        assert!(failure.out_of_sync);
        assert_eq!(report.out_of_sync().count(), 1);
        assert!(!report.is_healthy());
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let rpc = mock();
        let report = monitor(&rpc).run_cycle().await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checked"], 3);
        assert_eq!(json["failures"][0]["out_of_sync"], true);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let rpc = mock();
        let monitor = monitor(&rpc);

        tokio::time::timeout(
            Duration::from_secs(5),
            monitor.run(Duration::from_millis(10), tokio::time::sleep(Duration::from_millis(50))),
        )
        .await
        .unwrap();

        assert!(rpc.calls("aggregator_price") >= 2);
    }
}
