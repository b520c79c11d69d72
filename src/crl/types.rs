use chrono::{DateTime, Utc};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

use super::errors::{CrlError, CrlResult};

/// A fetched Certificate Revocation List
#[derive(Debug, Clone)]
pub struct CrlData {
    /// The raw CRL data in DER format
    pub der_data: Vec<u8>,
    pub revoked_count: usize,
    pub this_update: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
}

impl CrlData {
    /// Create a CRL from DER or PEM data, rejecting anything that does not
    /// parse as an X.509 CRL.
    pub fn from_bytes(data: &[u8]) -> CrlResult<Self> {
        let der_data = if data.trim_ascii_start().starts_with(b"-----BEGIN") {
            let (_, pem) = parse_x509_pem(data)
                .map_err(|e| CrlError::Parse(format!("invalid PEM: {e}")))?;
            if pem.label != "X509 CRL" {
                return Err(CrlError::Parse(format!(
                    "expected an X509 CRL block, found {}",
                    pem.label
                )));
            }
            pem.contents
        } else {
            data.to_vec()
        };

        let (_, crl) = CertificateRevocationList::from_der(&der_data)
            .map_err(|e| CrlError::Parse(e.to_string()))?;

        let revoked_count = crl.iter_revoked_certificates().count();
        let this_update = to_utc(crl.last_update())?;
        let next_update = crl.next_update().map(to_utc).transpose()?;

        Ok(Self {
            der_data,
            revoked_count,
            this_update,
            next_update,
        })
    }
}

fn to_utc(time: ASN1Time) -> CrlResult<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| CrlError::Parse(format!("timestamp out of range: {time}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_der_and_pem() {
        let der = include_bytes!("../../tests/data/ca.crl.der");
        let pem = include_bytes!("../../tests/data/ca.crl.pem");

        let from_der = CrlData::from_bytes(der).unwrap();
        let from_pem = CrlData::from_bytes(pem).unwrap();

        assert_eq!(from_der.revoked_count, 2);
        assert_eq!(from_pem.der_data, from_der.der_data);
        assert_eq!(from_pem.this_update, from_der.this_update);
        assert!(from_der.next_update.is_some());
    }

    #[test]
    fn rejects_non_crl_data() {
        assert!(matches!(
            CrlData::from_bytes(b"<html>not found</html>"),
            Err(CrlError::Parse(_))
        ));
    }

    #[test]
    fn rejects_other_pem_blocks() {
        let pem = b"-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert!(matches!(CrlData::from_bytes(pem), Err(CrlError::Parse(_))));
    }
}
