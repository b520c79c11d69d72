//! Initialises the credential directory ahead of serving: imports a legacy
//! easy-rsa CA when one is present, otherwise bootstraps a new root.

use color_eyre::eyre::Context;
use vpn_ca_server::{config::Config, setup::native_ca, telemetry};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = Config::load()?;
    let ca = native_ca(&config.ca);

    if ca.is_initialized().await {
        tracing::info!(dir = %ca.store().dir().display(), "CA already initialized");
    }

    let root = ca
        .root_certificate()
        .await
        .wrap_err("Failed to initialize the CA")?;
    println!("{root}");
    Ok(())
}
