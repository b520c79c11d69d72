use axum::extract::State;
use serde::Serialize;

use crate::server::{AppState, responses::ApiResponse};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub ca_initialized: bool,
}

/// Liveness check. Never triggers CA initialisation.
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<Health> {
    ApiResponse::new(Health {
        status: "healthy",
        ca_initialized: state.ca.is_initialized().await,
    })
}
