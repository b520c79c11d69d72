//! VPN certificate authority.
//!
//! Keeps the root credential and every issued certificate/key pair in a
//! single credential directory and delegates all key generation and
//! signing to an external CA helper.
//!
//! # Features
//! - Bootstrap of a new root credential, or one-time import of a legacy
//!   easy-rsa CA (see [`migration`])
//! - Issuance of server certificates and time-bound client certificates
//! - Validity window extraction from the issued certificates

mod common_name;
mod errors;
pub mod invoker;
pub mod metadata;
pub mod migration;
mod native;
pub mod store;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

pub use common_name::CommonName;
pub use errors::{CaError, CaResult};
pub use invoker::{ExternalCaInvoker, ProcessRunner, ToolOutput, ToolRunner};
pub use metadata::{Validity, extract_validity};
pub use migration::LegacySource;
pub use native::VpnCa;
pub use store::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    Server,
    Client,
}

/// A request to issue a certificate/key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceRequest {
    pub kind: CertificateKind,
    pub common_name: CommonName,
    pub expires_at: Option<DateTime<Utc>>,
}

impl IssuanceRequest {
    pub fn server(common_name: CommonName) -> Self {
        Self {
            kind: CertificateKind::Server,
            common_name,
            expires_at: None,
        }
    }

    pub fn client(common_name: CommonName, expires_at: DateTime<Utc>) -> Self {
        Self {
            kind: CertificateKind::Client,
            common_name,
            expires_at: Some(expires_at),
        }
    }

    /// Checks the request against `now` and returns the expiry to hand to
    /// the CA helper, truncated to whole seconds.
    pub fn validate(&self, now: DateTime<Utc>) -> CaResult<Option<DateTime<Utc>>> {
        match (self.kind, self.expires_at) {
            (CertificateKind::Server, None) => Ok(None),
            (CertificateKind::Server, Some(_)) => Err(CaError::Validation(
                "server certificates do not take an expiry".into(),
            )),
            (CertificateKind::Client, None) => Err(CaError::Validation(
                "client certificates require an expiry".into(),
            )),
            (CertificateKind::Client, Some(expires_at)) => {
                let expires_at = expires_at.trunc_subsecs(0);
                if expires_at <= now {
                    return Err(CaError::Validation(
                        "certificate expiry is in the past".into(),
                    ));
                }
                Ok(Some(expires_at))
            }
        }
    }
}

/// A certificate/key pair issued by the CA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCredential {
    pub common_name: String,
    pub certificate: String,
    pub private_key: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub valid_from: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub valid_to: DateTime<Utc>,
}

/// The CA backends, selected at construction time.
#[derive(Debug)]
pub enum CertificateAuthority {
    /// Backed by the `vpn-ca` helper; initialises itself on first use.
    Native(VpnCa),
    /// Serves the root certificate straight from a legacy easy-rsa layout.
    /// It cannot issue; it only exists until the native CA has imported it.
    LegacyImport(LegacySource),
}

impl CertificateAuthority {
    pub async fn is_initialized(&self) -> bool {
        match self {
            CertificateAuthority::Native(ca) => ca.is_initialized().await,
            CertificateAuthority::LegacyImport(source) => source.is_complete().await,
        }
    }

    pub async fn root_certificate(&self) -> CaResult<String> {
        match self {
            CertificateAuthority::Native(ca) => ca.root_certificate().await,
            CertificateAuthority::LegacyImport(source) => source.read_root_certificate().await,
        }
    }

    pub async fn issue_server_certificate(
        &self,
        common_name: &CommonName,
    ) -> CaResult<IssuedCredential> {
        self.issue(IssuanceRequest::server(common_name.clone())).await
    }

    pub async fn issue_client_certificate(
        &self,
        common_name: &CommonName,
        expires_at: DateTime<Utc>,
    ) -> CaResult<IssuedCredential> {
        self.issue(IssuanceRequest::client(common_name.clone(), expires_at)).await
    }

    pub async fn issue(&self, request: IssuanceRequest) -> CaResult<IssuedCredential> {
        match self {
            CertificateAuthority::Native(ca) => ca.issue(request).await,
            CertificateAuthority::LegacyImport(_) => {
                request.validate(Utc::now())?;
                Err(CaError::Unsupported(
                    "the legacy CA is import-only and cannot issue certificates",
                ))
            }
        }
    }
}
