use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Context;

use crate::ca::{
    CertificateAuthority, CredentialStore, ExternalCaInvoker, LegacySource, ProcessRunner,
    ToolRunner, VpnCa,
};
use crate::config::{CaBackend, CaConfig, Config, CrlConfig};
use crate::crl::{CrlFetcher, CrlRefresher, HttpCrlFetcher, UnconfiguredFetcher};
use crate::server::AppState;
use crate::server::auth::TokenAuth;

/// Builds the native CA with real process invocation.
pub fn native_ca(config: &CaConfig) -> VpnCa {
    let runner: Arc<dyn ToolRunner> = Arc::new(ProcessRunner::new(Duration::from_secs(
        config.tool_timeout_secs,
    )));
    native_ca_with_runner(config, runner)
}

pub fn native_ca_with_runner(config: &CaConfig, runner: Arc<dyn ToolRunner>) -> VpnCa {
    let store = CredentialStore::new(&config.dir);
    let invoker = ExternalCaInvoker::new(
        runner,
        &config.vpn_ca_path,
        &config.openssl_path,
        &config.dir,
    );
    let legacy = config.legacy_dir.as_ref().map(LegacySource::new);
    VpnCa::new(store, invoker, legacy)
}

pub fn certificate_authority(config: &CaConfig) -> color_eyre::Result<CertificateAuthority> {
    match config.backend {
        CaBackend::Native => Ok(CertificateAuthority::Native(native_ca(config))),
        CaBackend::LegacyImport => {
            let dir = config.legacy_dir.as_ref().ok_or_else(|| {
                color_eyre::eyre::eyre!("ca.legacy_dir is required for the legacy_import backend")
            })?;
            tracing::warn!(
                dir = %dir.display(),
                "Serving the legacy CA read-only; issuance is disabled"
            );
            Ok(CertificateAuthority::LegacyImport(LegacySource::new(dir)))
        }
    }
}

pub fn crl_refresher(config: &CrlConfig) -> color_eyre::Result<CrlRefresher> {
    let fetcher: Arc<dyn CrlFetcher> = match &config.url {
        Some(url) => Arc::new(
            HttpCrlFetcher::new(url, &config.path, config.timeout_secs)
                .wrap_err("Failed to configure the CRL fetcher")?,
        ),
        None => {
            tracing::info!("No CRL URL configured, CRL refresh is disabled.");
            Arc::new(UnconfiguredFetcher)
        }
    };
    Ok(CrlRefresher::new(fetcher))
}

pub fn setup(config: &Config) -> color_eyre::Result<AppState> {
    let ca = certificate_authority(&config.ca)?;
    let crl = crl_refresher(&config.crl)?;
    let auth = TokenAuth::from_config(&config.api);

    Ok(AppState {
        ca: Arc::new(ca),
        crl,
        auth: Arc::new(auth),
    })
}
