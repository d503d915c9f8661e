use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use certwatch_api::{create_router, ApiState};
use certwatch_monitor::{ExpiryMonitor, MonitorConfig};
use certwatch_probe::{ChainProbe, ProbeConfig};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// certwatch - TLS certificate chain analysis and expiry monitoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/certwatch.yaml")]
    config: PathBuf,

    /// Override bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[derive(Debug, Deserialize, Default)]
struct Config {
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    monitor: MonitorSection,
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    #[serde(default = "default_bind_addr")]
    bind_addr: String,
}

#[derive(Debug, Deserialize)]
struct MonitorSection {
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default = "default_interval_hours")]
    interval_hours: u64,
    #[serde(default = "default_alert_threshold_days")]
    alert_threshold_days: i64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            interval_hours: default_interval_hours(),
            alert_threshold_days: default_alert_threshold_days(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_interval_hours() -> u64 {
    24
}

fn default_alert_threshold_days() -> i64 {
    30
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!(path = %path.display(), "no config file found, using defaults");
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    let bind_addr: SocketAddr = match args.bind {
        Some(addr) => addr,
        None => config
            .api
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address: {}", config.api.bind_addr))?,
    };

    let probe = Arc::new(ChainProbe::new(ProbeConfig::default()).context("TLS client setup")?);

    if !config.monitor.domains.is_empty() {
        let monitor = ExpiryMonitor::new(
            Arc::clone(&probe),
            MonitorConfig {
                domains: config.monitor.domains.clone(),
                interval: Duration::from_secs(config.monitor.interval_hours * 3600),
                alert_threshold_days: config.monitor.alert_threshold_days,
            },
        );
        info!(
            domains = config.monitor.domains.len(),
            interval_hours = config.monitor.interval_hours,
            "starting expiry monitor"
        );
        tokio::spawn(monitor.run());
    }

    let router = create_router(ApiState { probe });

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "certwatch API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
