use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::ca::CaError;
use crate::crl::CrlError;

use super::responses::ErrorBody;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("\"{0}\" scope required")]
    InsufficientScope(&'static str),
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Ca(#[from] CaError),
    #[error(transparent)]
    Crl(#[from] CrlError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InsufficientScope(_) => StatusCode::FORBIDDEN,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Ca(e) => match e {
                CaError::Validation(_) => StatusCode::BAD_REQUEST,
                CaError::NotFound(_) => StatusCode::NOT_FOUND,
                CaError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Crl(CrlError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Crl(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InsufficientScope(_) => "insufficient_scope",
            AppError::InvalidRequest(_) => "validation",
            AppError::Ca(e) => e.kind(),
            AppError::Crl(_) => "crl",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorBody {
            ok: false,
            error: self.to_string(),
            kind: self.kind(),
            output: match &self {
                AppError::Ca(e) => e.tool_output().map(str::to_owned),
                _ => None,
            },
        };
        (status, axum::Json(body)).into_response()
    }
}
