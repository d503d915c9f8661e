//! Certificate chain retrieval for certwatch
//!
//! Opens a TLS connection to a target host and captures the certificate
//! chain the peer presents during the handshake. Verification is
//! intentionally disabled: the point is to inspect whatever the peer
//! sends, including expired, self-signed, or otherwise invalid chains.

pub mod error;
pub mod probe;
mod verifier;

pub use error::{ProbeError, Result};
pub use probe::{normalize_host, ChainProbe, ProbeConfig, RawChain, DEFAULT_TIMEOUT, DEFAULT_TLS_PORT};

// Re-exported so downstream crates can build a RawChain without
// depending on rustls directly.
pub use rustls::pki_types::CertificateDer;
