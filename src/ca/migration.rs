//! One-time import of a root credential produced by the legacy easy-rsa
//! toolchain (`pki/ca.crt`, `pki/private/ca.key`).

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use super::errors::{CaError, CaResult};
use super::invoker::ExternalCaInvoker;
use super::store::{CredentialStore, read_pem};

/// Read-only legacy credential layout.
#[derive(Debug, Clone)]
pub struct LegacySource {
    data_dir: PathBuf,
}

impl LegacySource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cert_path(&self) -> PathBuf {
        self.data_dir.join("pki").join("ca.crt")
    }

    pub fn key_path(&self) -> PathBuf {
        self.data_dir.join("pki").join("private").join("ca.key")
    }

    /// A source only counts when both the certificate and the key exist.
    pub async fn is_complete(&self) -> bool {
        let has_cert = fs::try_exists(self.cert_path()).await.unwrap_or(false);
        let has_key = fs::try_exists(self.key_path()).await.unwrap_or(false);
        if has_cert != has_key {
            warn!(
                dir = %self.data_dir.display(),
                has_cert, has_key, "Ignoring incomplete legacy CA"
            );
        }
        has_cert && has_key
    }

    pub async fn read_root_certificate(&self) -> CaResult<String> {
        read_pem(&self.cert_path()).await
    }
}

/// Copies the legacy root certificate verbatim and re-encodes the legacy key
/// into the canonical store.
///
/// If the key conversion fails, the files this run created in the store are
/// removed again and the failure is returned as [`CaError::Migration`].
/// Files that were already present are left alone.
pub async fn migrate(
    source: &LegacySource,
    store: &CredentialStore,
    invoker: &ExternalCaInvoker,
) -> CaResult<()> {
    info!(
        from = %source.data_dir.display(),
        to = %store.dir().display(),
        "Migrating legacy CA"
    );

    let cert_dst = store.root_cert_path();
    let key_dst = store.root_key_path();
    let mut created = Vec::new();
    for path in [&cert_dst, &key_dst] {
        if !fs::try_exists(path).await.unwrap_or(false) {
            created.push(path.as_path());
        }
    }

    fs::copy(source.cert_path(), &cert_dst)
        .await
        .map_err(|e| CaError::Migration(Box::new(CaError::io(source.cert_path(), e))))?;

    if let Err(e) = invoker.convert_key(&source.key_path(), &key_dst).await {
        rollback(&created).await;
        return Err(CaError::Migration(Box::new(e)));
    }

    if !fs::try_exists(&key_dst).await.unwrap_or(false) {
        rollback(&created).await;
        return Err(CaError::Migration(Box::new(CaError::NotFound(key_dst.clone()))));
    }

    info!("Legacy CA migrated");
    Ok(())
}

async fn rollback(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => warn!(path = %path.display(), "Removed partially migrated file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Unable to remove partially migrated file"
            ),
        }
    }
}
