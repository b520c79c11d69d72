use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::common_name::CommonName;
use super::errors::{CaError, CaResult};
use super::invoker::ExternalCaInvoker;
use super::metadata::extract_validity;
use super::migration::{LegacySource, migrate};
use super::store::CredentialStore;
use super::{IssuanceRequest, IssuedCredential};

/// CA backed by the external `vpn-ca` helper.
pub struct VpnCa {
    store: CredentialStore,
    invoker: ExternalCaInvoker,
    legacy: Option<LegacySource>,
    init_lock: Mutex<()>,
    issue_locks: DashMap<CommonName, Arc<Mutex<()>>>,
}

impl VpnCa {
    pub fn new(
        store: CredentialStore,
        invoker: ExternalCaInvoker,
        legacy: Option<LegacySource>,
    ) -> Self {
        Self {
            store,
            invoker,
            legacy,
            init_lock: Mutex::new(()),
            issue_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn invoker(&self) -> &ExternalCaInvoker {
        &self.invoker
    }

    pub async fn is_initialized(&self) -> bool {
        self.store.is_initialized().await
    }

    /// Makes sure a root credential exists, migrating a complete legacy CA
    /// or bootstrapping a new one. Concurrent callers are serialised.
    #[instrument(skip_all)]
    pub async fn ensure_initialized(&self) -> CaResult<()> {
        let _guard = self.init_lock.lock().await;

        if self.store.is_initialized().await {
            return Ok(());
        }

        self.store.create_dir().await?;

        if let Some(legacy) = &self.legacy {
            if legacy.is_complete().await {
                return migrate(legacy, &self.store, &self.invoker).await;
            }
            debug!(dir = %legacy.data_dir().display(), "No usable legacy CA found");
        }

        info!(dir = %self.store.dir().display(), "Bootstrapping new CA");
        self.invoker.bootstrap().await?;

        if !self.store.is_initialized().await {
            return Err(CaError::NotFound(self.store.root_key_path()));
        }
        Ok(())
    }

    pub async fn root_certificate(&self) -> CaResult<String> {
        self.ensure_initialized().await?;
        self.store.read_root_certificate().await
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

    /// Validates the request, runs the helper and reads the resulting pair
    /// back. Requests for the same common name are serialised.
    #[instrument(skip_all, fields(kind = ?request.kind, common_name = %request.common_name))]
    pub async fn issue(&self, request: IssuanceRequest) -> CaResult<IssuedCredential> {
        let not_after = request.validate(Utc::now())?;

        self.ensure_initialized().await?;

        let lock = self
            .issue_locks
            .entry(request.common_name.clone())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.issue_locked(&request.common_name, not_after).await
        };
        drop(lock);

        // only the map still holds the lock once nobody waits on it
        self.issue_locks
            .remove_if(&request.common_name, |_, lock| Arc::strong_count(lock) == 1);

        let credential = result?;
        info!(
            valid_from = %credential.valid_from,
            valid_to = %credential.valid_to,
            "Certificate issued"
        );
        Ok(credential)
    }

    /// Number of common names with an issuance in flight.
    pub fn pending_issuances(&self) -> usize {
        self.issue_locks.len()
    }

    async fn issue_locked(
        &self,
        common_name: &CommonName,
        not_after: Option<DateTime<Utc>>,
    ) -> CaResult<IssuedCredential> {
        match not_after {
            Some(not_after) => self.invoker.issue_client(common_name, not_after).await?,
            None => self.invoker.issue_server(common_name).await?,
        };
        self.read_credential(common_name).await
    }

    async fn read_credential(&self, common_name: &CommonName) -> CaResult<IssuedCredential> {
        let (certificate, private_key) = self.store.read_pair(common_name).await?;
        let validity = extract_validity(&certificate)?;

        Ok(IssuedCredential {
            common_name: common_name.to_string(),
            certificate,
            private_key,
            valid_from: validity.valid_from,
            valid_to: validity.valid_to,
        })
    }
}

impl std::fmt::Debug for VpnCa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VpnCa")
            .field("store", &self.store)
            .field("invoker", &self.invoker)
            .field("legacy", &self.legacy)
            .finish()
    }
}
