use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::ca::{CommonName, IssuedCredential};
use crate::server::auth::TokenInfo;
use crate::server::{AppState, errors::AppError, responses::ApiResponse};

#[derive(Debug, Serialize)]
pub struct RootCertificate {
    pub certificate: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerCertificateRequest {
    pub common_name: CommonName,
}

#[derive(Debug, Deserialize)]
pub struct ClientCertificateRequest {
    pub common_name: CommonName,
    pub expires_at: DateTime<Utc>,
}

#[instrument(skip_all, fields(client = %token.client))]
pub async fn root_certificate(
    State(state): State<AppState>,
    token: TokenInfo,
) -> Result<ApiResponse<RootCertificate>, AppError> {
    let certificate = state.ca.root_certificate().await?;
    Ok(ApiResponse::new(RootCertificate { certificate }))
}

#[instrument(skip_all, fields(client = %token.client))]
pub async fn issue_server_certificate(
    State(state): State<AppState>,
    token: TokenInfo,
    payload: Result<Json<ServerCertificateRequest>, JsonRejection>,
) -> Result<ApiResponse<IssuedCredential>, AppError> {
    let Json(request) = payload?;
    info!(common_name = %request.common_name, "Issuing server certificate");

    let credential = state
        .ca
        .issue_server_certificate(&request.common_name)
        .await?;
    Ok(ApiResponse::new(credential))
}

#[instrument(skip_all, fields(client = %token.client))]
pub async fn issue_client_certificate(
    State(state): State<AppState>,
    token: TokenInfo,
    payload: Result<Json<ClientCertificateRequest>, JsonRejection>,
) -> Result<ApiResponse<IssuedCredential>, AppError> {
    let Json(request) = payload?;
    info!(
        common_name = %request.common_name,
        expires_at = %request.expires_at,
        "Issuing client certificate"
    );

    let credential = state
        .ca
        .issue_client_certificate(&request.common_name, request.expires_at)
        .await?;
    Ok(ApiResponse::new(credential))
}
