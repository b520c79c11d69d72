use axum::extract::State;
use tracing::instrument;

use crate::server::auth::TokenInfo;
use crate::server::{AppState, errors::AppError, responses::ApiResponse};

pub const CRL_FETCH_SCOPE: &str = "ca_crl_fetch";

/// Triggers a fresh CRL fetch. Requires the `ca_crl_fetch` scope.
#[instrument(skip_all, fields(client = %token.client))]
pub async fn refresh_crl(
    State(state): State<AppState>,
    token: TokenInfo,
) -> Result<ApiResponse<()>, AppError> {
    token.require_scope(CRL_FETCH_SCOPE)?;
    state.crl.refresh_crl().await?;
    Ok(ApiResponse::ok())
}
