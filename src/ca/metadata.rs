use chrono::{DateTime, Utc};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

use super::errors::{CaError, CaResult};

/// Validity window of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

/// Recovers the validity window of a PEM encoded X.509 certificate.
pub fn extract_validity(certificate_pem: &str) -> CaResult<Validity> {
    let (_, pem) = parse_x509_pem(certificate_pem.as_bytes())
        .map_err(|e| CaError::Parse(format!("invalid PEM: {e}")))?;
    if pem.label != "CERTIFICATE" {
        return Err(CaError::Parse(format!(
            "expected a CERTIFICATE block, found {}",
            pem.label
        )));
    }

    let (_, cert) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| CaError::Parse(format!("invalid X.509 certificate: {e}")))?;

    let validity = cert.validity();
    Ok(Validity {
        valid_from: to_utc(validity.not_before)?,
        valid_to: to_utc(validity.not_after)?,
    })
}

fn to_utc(time: ASN1Time) -> CaResult<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| CaError::Parse(format!("timestamp out of range: {time}")))
}
