//! Error types for the certificate chain probe

use std::time::Duration;
use thiserror::Error;

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors that can occur while retrieving a certificate chain
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Host input was malformed; caught before any network call
    #[error("invalid host input: {0}")]
    Input(String),

    /// DNS resolution, TCP connect, or TLS handshake failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// The handshake did not complete within the fixed deadline
    #[error("connection to {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    /// Handshake succeeded but the peer presented no certificates
    #[error("no certificate presented by {0}")]
    NoCertificate(String),
}
