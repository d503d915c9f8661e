//! TLS connection handling and chain capture

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, ServerName};
use rustls::ClientConfig;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, instrument};

use crate::error::{ProbeError, Result};
use crate::verifier::InspectionVerifier;

/// Standard TLS port
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Fixed deadline covering TCP connect and TLS handshake together
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the chain probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Port to connect to
    pub port: u16,
    /// Deadline for the whole connect + handshake sequence
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_TLS_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// The certificate chain as presented by the peer, leaf first
#[derive(Debug, Clone)]
pub struct RawChain {
    certs: Vec<CertificateDer<'static>>,
}

impl RawChain {
    pub fn new(certs: Vec<CertificateDer<'static>>) -> Self {
        Self { certs }
    }

    pub fn certs(&self) -> &[CertificateDer<'static>] {
        &self.certs
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

/// Probe that retrieves the certificate chain a remote host presents
///
/// Stateless apart from its configuration: every call opens and closes
/// exactly one socket and performs no retries.
pub struct ChainProbe {
    config: ProbeConfig,
    tls_config: Arc<ClientConfig>,
}

impl ChainProbe {
    /// Create a new probe with the given configuration
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let tls_config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| ProbeError::Connection(format!("failed to build TLS client config: {e}")))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InspectionVerifier))
            .with_no_client_auth();

        Ok(Self {
            config,
            tls_config: Arc::new(tls_config),
        })
    }

    /// Retrieve the certificate chain presented by `host`
    ///
    /// The input may carry a leading `scheme://` and/or a trailing path;
    /// both are stripped before connecting. The normalized host is also
    /// presented as SNI so virtual hosts select the right certificate.
    #[instrument(skip(self))]
    pub async fn fetch(&self, host: &str) -> Result<RawChain> {
        let host = normalize_host(host)?;

        let server_name = ServerName::try_from(host.clone())
            .map_err(|_| ProbeError::Input(format!("invalid host name: {host}")))?;
        let addr = format!("{}:{}", host, self.config.port);

        debug!(%addr, "probing certificate chain");

        let certs = timeout(self.config.timeout, self.handshake(&addr, server_name))
            .await
            .map_err(|_| ProbeError::Timeout {
                host: host.clone(),
                timeout: self.config.timeout,
            })??;

        if certs.is_empty() {
            return Err(ProbeError::NoCertificate(host));
        }

        info!(%host, chain_length = certs.len(), "retrieved certificate chain");
        Ok(RawChain::new(certs))
    }

    /// Connect, complete the handshake, and copy out the peer's chain
    async fn handshake(
        &self,
        addr: &str,
        server_name: ServerName<'static>,
    ) -> Result<Vec<CertificateDer<'static>>> {
        let tcp_stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ProbeError::Connection(format!("failed to connect to {addr}: {e}")))?;

        let connector = TlsConnector::from(Arc::clone(&self.tls_config));
        let mut tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| ProbeError::Connection(format!("TLS handshake failed: {e}")))?;

        let certs = tls_stream
            .get_ref()
            .1
            .peer_certificates()
            .map(|certs| certs.to_vec())
            .unwrap_or_default();

        // No application data is exchanged; close as soon as the chain
        // is captured. Shutdown failure does not invalidate the result.
        let _ = tls_stream.shutdown().await;

        Ok(certs)
    }
}

/// Strip a leading `scheme://` and any trailing path/query from a host
/// input, e.g. `https://example.com/path` becomes `example.com`.
pub fn normalize_host(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let without_scheme = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed,
    };
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    if host.is_empty() {
        return Err(ProbeError::Input(format!("no host in input: {input:?}")));
    }

    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_path() {
        assert_eq!(normalize_host("https://example.com/").unwrap(), "example.com");
        assert_eq!(normalize_host("http://example.com").unwrap(), "example.com");
        assert_eq!(normalize_host("example.com").unwrap(), "example.com");
    }

    #[test]
    fn strips_deep_path_and_query() {
        assert_eq!(
            normalize_host("https://example.com/a/b?q=1#frag").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(normalize_host(""), Err(ProbeError::Input(_))));
        assert!(matches!(normalize_host("https://"), Err(ProbeError::Input(_))));
        assert!(matches!(normalize_host("   "), Err(ProbeError::Input(_))));
    }

    #[test]
    fn default_config_matches_standard_tls() {
        let config = ProbeConfig::default();
        assert_eq!(config.port, 443);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
