//! Periodic certificate expiry checks
//!
//! Drives the same request-scoped analysis a live API call would use,
//! once per interval for each configured domain. The monitor owns the
//! schedule and the alert threshold; the engine knows nothing about
//! which domains are watched.

use std::sync::Arc;
use std::time::Duration;

use certwatch_chain::analyze_host;
use certwatch_probe::ChainProbe;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Default cadence: once a day
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Leaf certificates under this many days remaining are alert-worthy
pub const DEFAULT_ALERT_THRESHOLD_DAYS: i64 = 30;

/// Configuration for the expiry monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Domains to check on each tick
    pub domains: Vec<String>,

    /// Time between check rounds
    pub interval: Duration,

    /// Days-remaining threshold below which a warning is logged
    pub alert_threshold_days: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            interval: DEFAULT_INTERVAL,
            alert_threshold_days: DEFAULT_ALERT_THRESHOLD_DAYS,
        }
    }
}

/// Background task that periodically re-checks configured domains
pub struct ExpiryMonitor {
    probe: Arc<ChainProbe>,
    config: MonitorConfig,
}

impl ExpiryMonitor {
    pub fn new(probe: Arc<ChainProbe>, config: MonitorConfig) -> Self {
        Self { probe, config }
    }

    /// Run the check loop forever; intended to be spawned
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            info!(
                domains = self.config.domains.len(),
                "running certificate expiry check"
            );
            self.check_all().await;
        }
    }

    /// Check every configured domain once
    pub async fn check_all(&self) {
        for domain in &self.config.domains {
            self.check_domain(domain).await;
        }
    }

    async fn check_domain(&self, domain: &str) {
        match analyze_host(&self.probe, domain).await {
            Ok(record) => {
                if record.days_remaining < self.config.alert_threshold_days {
                    warn!(
                        %domain,
                        days_remaining = record.days_remaining,
                        threshold = self.config.alert_threshold_days,
                        "certificate approaching expiry"
                    );
                } else {
                    info!(
                        %domain,
                        days_remaining = record.days_remaining,
                        "certificate healthy"
                    );
                }
            }
            Err(err) => {
                error!(%domain, error = %err, "expiry check failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certwatch_probe::ProbeConfig;

    #[test]
    fn default_config_matches_daily_cadence() {
        let config = MonitorConfig::default();
        assert!(config.domains.is_empty());
        assert_eq!(config.interval, Duration::from_secs(86_400));
        assert_eq!(config.alert_threshold_days, 30);
    }

    #[tokio::test]
    async fn check_round_with_no_domains_completes() {
        let probe = Arc::new(ChainProbe::new(ProbeConfig::default()).unwrap());
        let monitor = ExpiryMonitor::new(probe, MonitorConfig::default());
        monitor.check_all().await;
    }
}
