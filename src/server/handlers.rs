pub mod ca;
pub mod crl;
pub mod health;

use axum::extract::rejection::JsonRejection;

use crate::server::errors::AppError;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}
