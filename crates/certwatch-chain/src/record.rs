//! Normalized certificate records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One certificate in an analyzed chain
///
/// Records are built fresh on every analysis, never mutated afterwards,
/// and never cached across calls. `days_remaining` is a point-in-time
/// value computed when the chain was analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// Stable handle for this certificate, same value as `fingerprint`
    pub id: String,

    /// Subject identity: CN, falling back to O, falling back to "Unknown"
    pub subject: String,

    /// Issuer identity, same fallback policy as `subject`
    pub issuer: String,

    /// Start of the validity window
    pub valid_from: DateTime<Utc>,

    /// End of the validity window
    pub valid_to: DateTime<Utc>,

    /// Whole days until `valid_to`, floored; negative once expired
    pub days_remaining: i64,

    /// Issuer-assigned serial number, opaque hex string
    pub serial_number: String,

    /// Hex-encoded SHA-256 digest of the DER encoding
    pub fingerprint: String,

    /// The issuer's record, absent for the terminal certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<CertificateRecord>>,
}

impl CertificateRecord {
    /// Iterate the chain from this record up through successive issuers
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            current: Some(self),
        }
    }

    /// Number of records reachable from this one, itself included
    pub fn chain_length(&self) -> usize {
        self.iter().count()
    }
}

/// Iterator over a record chain via `next` links
pub struct ChainIter<'a> {
    current: Option<&'a CertificateRecord>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a CertificateRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.current?;
        self.current = record.next.as_deref();
        Some(record)
    }
}
