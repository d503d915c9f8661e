//! Certificate chain analysis for certwatch
//!
//! Turns the raw DER chain captured by `certwatch-probe` into a linked
//! sequence of [`CertificateRecord`]s, leaf first, annotated with
//! fingerprints and days-until-expiry. The walk over the peer-provided
//! chain is bounded: fingerprints already seen terminate it (covering
//! both self-signed roots and longer cycles) and a fixed depth cap
//! backs that up.

pub mod analyzer;
pub mod error;
pub mod record;

pub use analyzer::{analyze, MAX_CHAIN_DEPTH};
pub use error::{AnalyzeError, ChainError, Result};
pub use record::CertificateRecord;

use certwatch_probe::ChainProbe;

/// Analyze the certificate chain presented by `host`
///
/// The single entry point shared by the API layer and the expiry
/// monitor: one network probe, one chain walk, no state kept between
/// calls.
pub async fn analyze_host(
    probe: &ChainProbe,
    host: &str,
) -> std::result::Result<CertificateRecord, AnalyzeError> {
    let raw = probe.fetch(host).await?;
    let record = analyze(&raw)?;
    Ok(record)
}
