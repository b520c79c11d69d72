use vpn_ca_server::{
    config::Config,
    crl::CrlScheduler,
    server::Server,
    setup::setup,
    telemetry,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Loaded configuration: {:?}", config);

    let state = setup(&config)?;

    if let Some(secs) = config.crl.refresh_interval_secs {
        let _ = CrlScheduler::new(state.crl.clone(), secs).start();
    }

    let server = Server::new(state, &config.server).await?;
    server.run().await
}
