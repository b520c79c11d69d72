pub mod auth;
pub mod errors;
pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use color_eyre::eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::ca::CertificateAuthority;
use crate::config::ServerConfig;
use crate::crl::CrlRefresher;
use auth::TokenAuth;
use handlers::health::health_check;

#[derive(Debug, Clone)]
pub struct AppState {
    pub ca: Arc<CertificateAuthority>,
    pub crl: CrlRefresher,
    pub auth: Arc<TokenAuth>,
}

pub struct Server {
    router: Router,
    listener: TcpListener,
    port: u16,
}

impl Server {
    /// Binds the listener; the server only accepts connections once
    /// [`Server::run`] is awaited.
    pub async fn new(state: AppState, config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .wrap_err_with(|| format!("Binding TCP listener on {addr}"))?;
        let port = listener
            .local_addr()
            .context("Getting local address")?
            .port();

        Ok(Self {
            router: Self::router(state),
            listener,
            port,
        })
    }

    pub fn router(state: AppState) -> Router {
        let trace_layer =
            TraceLayer::new_for_http().make_span_with(|request: &'_ axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("request", method = %request.method(), uri)
            });

        Router::new()
            .route("/health", get(health_check))
            .route("/ca/root_certificate", get(handlers::ca::root_certificate))
            .route(
                "/ca/issue_server_certificate",
                post(handlers::ca::issue_server_certificate),
            )
            .route(
                "/ca/issue_client_certificate",
                post(handlers::ca::issue_client_certificate),
            )
            .route("/ca/crl/fetch", post(handlers::crl::refresh_crl))
            .layer(trace_layer)
            .with_state(state)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!("Server listening on port {}", self.port);
        axum::serve(self.listener, self.router)
            .await
            .context("Running server")
    }
}
