use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tokio::fs;
use tokio::time::timeout;
use tracing::info;

use super::errors::{CrlError, CrlResult};
use super::types::CrlData;

/// Produces a fresh CRL on every call.
#[async_trait]
pub trait CrlFetcher: Send + Sync + 'static {
    async fn fetch(&self) -> CrlResult<CrlData>;
}

/// Downloads the CRL from a fixed URL and stores it on disk.
#[derive(Debug, Clone)]
pub struct HttpCrlFetcher {
    client: Client,
    url: Url,
    path: PathBuf,
    request_timeout: Duration,
}

impl HttpCrlFetcher {
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// initialized
    pub fn new(url: &str, path: impl Into<PathBuf>, timeout_secs: u64) -> CrlResult<Self> {
        let url = Url::parse(url).map_err(|e| CrlError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CrlError::InvalidUrl(format!(
                "{url}: unsupported scheme {}",
                url.scheme()
            )));
        }

        let request_timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            url,
            path: path.into(),
            request_timeout,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CrlFetcher for HttpCrlFetcher {
    async fn fetch(&self) -> CrlResult<CrlData> {
        info!("Fetching CRL from: {}", self.url);

        let response = match timeout(
            self.request_timeout,
            self.client.get(self.url.clone()).send(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(CrlError::Timeout),
        };

        if !response.status().is_success() {
            return Err(CrlError::Status {
                url: self.url.to_string(),
                status: response.status(),
            });
        }

        let body = response.bytes().await?;
        let crl = CrlData::from_bytes(&body)?;

        write_atomic(&self.path, &crl.der_data).await?;

        info!(
            revoked = crl.revoked_count,
            path = %self.path.display(),
            "Successfully fetched CRL from {}",
            self.url
        );
        Ok(crl)
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> CrlResult<()> {
    let io_err = |source| CrlError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, data).await.map_err(io_err)?;
    fs::rename(&tmp, path).await.map_err(io_err)
}
