use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::common_name::CommonName;
use super::errors::{CaError, CaResult};

const ROOT_CERT: &str = "ca.crt";
const ROOT_KEY: &str = "ca.key";

/// On-disk credential directory.
///
/// ```text
/// ca.crt             root certificate
/// ca.key             root private key (traditional RSA encoding)
/// <commonName>.crt   issued certificate
/// <commonName>.key   issued private key
/// ```
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn root_cert_path(&self) -> PathBuf {
        self.dir.join(ROOT_CERT)
    }

    pub fn root_key_path(&self) -> PathBuf {
        self.dir.join(ROOT_KEY)
    }

    pub fn cert_path(&self, common_name: &CommonName) -> PathBuf {
        self.dir.join(format!("{common_name}.crt"))
    }

    pub fn key_path(&self, common_name: &CommonName) -> PathBuf {
        self.dir.join(format!("{common_name}.key"))
    }

    /// True iff both the root certificate and the root key are present.
    pub async fn is_initialized(&self) -> bool {
        let has_cert = fs::try_exists(self.root_cert_path()).await.unwrap_or(false);
        let has_key = fs::try_exists(self.root_key_path()).await.unwrap_or(false);
        has_cert && has_key
    }

    /// Creates the directory with owner-only permissions if it is missing.
    pub async fn create_dir(&self) -> CaResult<()> {
        if fs::try_exists(&self.dir).await.unwrap_or(false) {
            return Ok(());
        }

        info!(dir = %self.dir.display(), "Creating credential directory");
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder
            .create(&self.dir)
            .await
            .map_err(|e| CaError::io(&self.dir, e))
    }

    pub async fn read_root_certificate(&self) -> CaResult<String> {
        read_pem(&self.root_cert_path()).await
    }

    /// Reads the issued certificate and private key for `common_name`.
    pub async fn read_pair(&self, common_name: &CommonName) -> CaResult<(String, String)> {
        let certificate = read_pem(&self.cert_path(common_name)).await?;
        let private_key = read_pem(&self.key_path(common_name)).await?;
        Ok((certificate, private_key))
    }
}

/// Reads a PEM file with surrounding whitespace stripped.
pub(crate) async fn read_pem(path: &Path) -> CaResult<String> {
    debug!(path = %path.display(), "Reading PEM file");
    let data = fs::read_to_string(path)
        .await
        .map_err(|e| CaError::io(path, e))?;
    Ok(data.trim().to_string())
}
