use std::sync::Arc;

use tracing::{error, info, instrument};

use super::errors::CrlResult;
use super::fetcher::CrlFetcher;
use super::types::CrlData;

/// Stateless CRL refresh trigger.
///
/// Callers are expected to have checked the `ca_crl_fetch` scope already.
#[derive(Clone)]
pub struct CrlRefresher {
    fetcher: Arc<dyn CrlFetcher>,
}

impl CrlRefresher {
    pub fn new(fetcher: Arc<dyn CrlFetcher>) -> Self {
        Self { fetcher }
    }

    /// Performs a fresh fetch; failures are returned unchanged.
    #[instrument(skip_all)]
    pub async fn refresh_crl(&self) -> CrlResult<CrlData> {
        info!("fetching CRL");
        match self.fetcher.fetch().await {
            Ok(crl) => {
                info!(revoked = crl.revoked_count, "CRL refreshed");
                Ok(crl)
            }
            Err(e) => {
                error!("CRL refresh failed: {e}");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for CrlRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrlRefresher").finish()
    }
}

/// Used when no CRL source is configured.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredFetcher;

#[async_trait::async_trait]
impl CrlFetcher for UnconfiguredFetcher {
    async fn fetch(&self) -> CrlResult<CrlData> {
        Err(super::errors::CrlError::NotConfigured)
    }
}
