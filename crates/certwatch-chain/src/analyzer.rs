//! Chain walk and derived-field computation

use std::collections::HashSet;

use certwatch_probe::RawChain;
use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;
use x509_parser::prelude::*;

use crate::error::{ChainError, Result};
use crate::record::CertificateRecord;

/// Hard cap on the number of certificates admitted from a single peer
pub const MAX_CHAIN_DEPTH: usize = 16;

/// Fixed day length so results are reproducible; calendar arithmetic
/// would make `days_remaining` depend on DST and leap handling
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Name used when a certificate carries neither a CN nor an O attribute
const UNKNOWN_NAME: &str = "Unknown";

/// Analyze a raw peer-provided chain into a linked record chain
///
/// Returns the leaf record; successive issuers are reachable through
/// `next`. The walk admits each certificate in presentation order and
/// stops at the first fingerprint it has already seen, so a self-signed
/// root (issuer identical to itself) or an engineered cycle among
/// distinct certificates both terminate it. A chain of length 1 is
/// valid output.
pub fn analyze(raw: &RawChain) -> Result<CertificateRecord> {
    analyze_at(raw, Utc::now())
}

fn analyze_at(raw: &RawChain, now: DateTime<Utc>) -> Result<CertificateRecord> {
    let mut parsed = Vec::new();
    let mut seen = HashSet::new();

    for der in raw.certs() {
        if parsed.len() >= MAX_CHAIN_DEPTH {
            debug!(depth = MAX_CHAIN_DEPTH, "chain walk hit depth cap");
            break;
        }

        let cert = parse_certificate(der.as_ref())?;
        if !seen.insert(cert.fingerprint.clone()) {
            debug!(fingerprint = %cert.fingerprint, "repeated fingerprint, terminating walk");
            break;
        }
        parsed.push(cert);
    }

    // Link records back to front so the leaf owns the whole chain.
    let mut next: Option<Box<CertificateRecord>> = None;
    for cert in parsed.into_iter().rev() {
        next = Some(Box::new(cert.into_record(next, now)));
    }

    match next {
        Some(leaf) => Ok(*leaf),
        None => Err(ChainError::EmptyChain),
    }
}

/// Validity and identity fields pulled out of one DER certificate
struct ParsedCertificate {
    fingerprint: String,
    subject: String,
    issuer: String,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    serial_number: String,
}

impl ParsedCertificate {
    fn into_record(
        self,
        next: Option<Box<CertificateRecord>>,
        now: DateTime<Utc>,
    ) -> CertificateRecord {
        CertificateRecord {
            id: self.fingerprint.clone(),
            subject: self.subject,
            issuer: self.issuer,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            days_remaining: days_remaining(self.valid_to, now),
            serial_number: self.serial_number,
            fingerprint: self.fingerprint,
            next,
        }
    }
}

/// Floored whole days between `now` and `valid_to`; negative once expired
fn days_remaining(valid_to: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (valid_to.timestamp_millis() - now.timestamp_millis()).div_euclid(MILLIS_PER_DAY)
}

fn parse_certificate(der: &[u8]) -> Result<ParsedCertificate> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| ChainError::MalformedCertificate(format!("failed to parse DER: {e:?}")))?;

    let valid_from = asn1_time_to_datetime(cert.validity().not_before)?;
    let valid_to = asn1_time_to_datetime(cert.validity().not_after)?;

    Ok(ParsedCertificate {
        fingerprint: hex::encode(Sha256::digest(der)),
        subject: display_name(cert.subject()),
        issuer: display_name(cert.issuer()),
        valid_from,
        valid_to,
        serial_number: cert.raw_serial_as_string(),
    })
}

/// CN, falling back to O, falling back to a literal "Unknown"
fn display_name(name: &X509Name) -> String {
    common_name(name)
        .or_else(|| organization(name))
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

fn common_name(name: &X509Name) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
}

fn organization(name: &X509Name) -> Option<String> {
    name.iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
}

fn asn1_time_to_datetime(time: ASN1Time) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(time.timestamp(), 0)
        .single()
        .ok_or_else(|| {
            ChainError::MalformedCertificate(format!("validity timestamp out of range: {time}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use rcgen::{
        BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    };
    use certwatch_probe::CertificateDer;

    fn self_signed(
        configure: impl FnOnce(&mut CertificateParams),
    ) -> CertificateDer<'static> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name = DistinguishedName::new();
        configure(&mut params);
        params.self_signed(&key).unwrap().der().clone()
    }

    fn with_common_name(cn: &str) -> CertificateDer<'static> {
        let cn = cn.to_string();
        self_signed(move |params| {
            params.distinguished_name.push(DnType::CommonName, cn.as_str());
        })
    }

    fn leaf_and_root() -> (CertificateDer<'static>, CertificateDer<'static>) {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::default();
        ca_params.distinguished_name = DistinguishedName::new();
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "Test Root CA");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();

        let leaf_key = KeyPair::generate().unwrap();
        let mut leaf_params = CertificateParams::new(vec!["leaf.test".to_string()]).unwrap();
        leaf_params.distinguished_name = DistinguishedName::new();
        leaf_params
            .distinguished_name
            .push(DnType::CommonName, "leaf.test");
        let leaf_cert = leaf_params.signed_by(&leaf_key, &ca_cert, &ca_key).unwrap();

        (leaf_cert.der().clone(), ca_cert.der().clone())
    }

    #[test]
    fn floor_semantics_near_day_boundary() {
        let now = Utc::now();
        let just_under = now + ChronoDuration::days(10) - ChronoDuration::seconds(1);
        let exactly = now + ChronoDuration::days(10);
        let just_over = now + ChronoDuration::days(10) + ChronoDuration::seconds(1);

        assert_eq!(days_remaining(just_under, now), 9);
        assert_eq!(days_remaining(exactly, now), 10);
        assert_eq!(days_remaining(just_over, now), 10);
    }

    #[test]
    fn expired_certificate_counts_negative_days() {
        let now = Utc::now();
        let past = now - ChronoDuration::hours(36);
        // True floor: one and a half days ago is -2, not -1
        assert_eq!(days_remaining(past, now), -2);
    }

    #[test]
    fn single_self_signed_certificate_is_a_valid_chain() {
        let der = with_common_name("solo.test");
        let raw = RawChain::new(vec![der]);

        let record = analyze(&raw).unwrap();
        assert_eq!(record.subject, "solo.test");
        assert_eq!(record.issuer, "solo.test");
        assert!(record.next.is_none());
        assert_eq!(record.chain_length(), 1);
    }

    #[test]
    fn leaf_links_to_issuer_record() {
        let (leaf, root) = leaf_and_root();
        let raw = RawChain::new(vec![leaf, root]);

        let record = analyze(&raw).unwrap();
        assert_eq!(record.subject, "leaf.test");
        assert_eq!(record.issuer, "Test Root CA");

        let parent = record.next.as_deref().expect("leaf should link to root");
        assert_eq!(parent.subject, "Test Root CA");
        assert!(parent.next.is_none());
        assert_ne!(record.fingerprint, parent.fingerprint);
    }

    #[test]
    fn duplicate_adjacent_certificate_terminates_walk() {
        let der = with_common_name("dup.test");
        let raw = RawChain::new(vec![der.clone(), der]);

        let record = analyze(&raw).unwrap();
        assert_eq!(record.chain_length(), 1);
        assert!(record.next.is_none());
    }

    #[test]
    fn cycle_among_distinct_certificates_terminates_walk() {
        let a = with_common_name("a.test");
        let b = with_common_name("b.test");
        let raw = RawChain::new(vec![a.clone(), b, a]);

        let record = analyze(&raw).unwrap();
        assert_eq!(record.chain_length(), 2);

        let fingerprints: Vec<_> = record.iter().map(|r| r.fingerprint.clone()).collect();
        let unique: std::collections::HashSet<_> = fingerprints.iter().collect();
        assert_eq!(unique.len(), fingerprints.len());
    }

    #[test]
    fn walk_depth_is_capped() {
        let certs: Vec<_> = (0..MAX_CHAIN_DEPTH + 4)
            .map(|i| with_common_name(&format!("cert-{i}.test")))
            .collect();
        let raw = RawChain::new(certs);

        let record = analyze(&raw).unwrap();
        assert_eq!(record.chain_length(), MAX_CHAIN_DEPTH);
    }

    #[test]
    fn falls_back_to_organization_then_unknown() {
        let with_org = self_signed(|params| {
            params
                .distinguished_name
                .push(DnType::OrganizationName, "Example Org");
        });
        let record = analyze(&RawChain::new(vec![with_org])).unwrap();
        assert_eq!(record.subject, "Example Org");
        assert_eq!(record.issuer, "Example Org");

        let nameless = self_signed(|_| {});
        let record = analyze(&RawChain::new(vec![nameless])).unwrap();
        assert_eq!(record.subject, "Unknown");
        assert_eq!(record.issuer, "Unknown");
    }

    #[test]
    fn expired_certificate_analyzes_with_negative_days() {
        let der = self_signed(|params| {
            params.distinguished_name.push(DnType::CommonName, "expired.test");
            let now = ::time::OffsetDateTime::now_utc();
            params.not_before = now - ::time::Duration::days(30);
            params.not_after = now - ::time::Duration::days(3);
        });
        let record = analyze(&RawChain::new(vec![der])).unwrap();
        assert!(record.days_remaining < 0);
    }

    #[test]
    fn garbage_der_is_rejected() {
        let raw = RawChain::new(vec![CertificateDer::from(vec![0u8; 16])]);
        assert!(matches!(
            analyze(&raw),
            Err(ChainError::MalformedCertificate(_))
        ));
    }

    #[test]
    fn empty_chain_is_rejected() {
        let raw = RawChain::new(Vec::new());
        assert!(matches!(analyze(&raw), Err(ChainError::EmptyChain)));
    }

    #[test]
    fn record_serializes_with_nested_chain() {
        let (leaf, root) = leaf_and_root();
        let record = analyze(&RawChain::new(vec![leaf, root])).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["subject"], "leaf.test");
        assert!(json["validTo"].is_string());
        assert!(json["daysRemaining"].is_i64());
        assert_eq!(json["next"]["subject"], "Test Root CA");
        // Terminal record omits `next` entirely
        assert!(json["next"].get("next").is_none());
        assert_eq!(json["id"], json["fingerprint"]);
    }
}
