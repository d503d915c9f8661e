//! Error types for chain analysis

use certwatch_probe::ProbeError;
use thiserror::Error;

/// Result type alias for chain analysis
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors that can occur while analyzing a raw certificate chain
#[derive(Debug, Error)]
pub enum ChainError {
    /// A certificate could not be parsed or lacks required validity
    /// fields, preventing derived-field computation
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// The raw chain contained no certificates at all
    #[error("certificate chain is empty")]
    EmptyChain,
}

/// Combined failure taxonomy for a full host analysis
///
/// Wraps the probe's connection-level failures and the analyzer's
/// parsing failures so callers see every failure kind behind one type.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
