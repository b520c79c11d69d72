use std::collections::HashSet;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::ApiConfig;

use super::{AppState, errors::AppError};

#[derive(Debug)]
struct Client {
    name: String,
    token: SecretString,
    scopes: HashSet<String>,
}

impl Client {
    fn matches(&self, token: &str) -> bool {
        let expected = self.token.expose_secret().as_bytes();
        !expected.is_empty() && bool::from(expected.ct_eq(token.as_bytes()))
    }
}

/// Static bearer tokens loaded from the `api.clients` configuration.
#[derive(Debug)]
pub struct TokenAuth {
    clients: Vec<Client>,
}

impl TokenAuth {
    pub fn from_config(config: &ApiConfig) -> Self {
        let clients = config
            .clients
            .iter()
            .map(|(name, client)| Client {
                name: name.clone(),
                token: client.token.clone(),
                scopes: client.scopes.iter().cloned().collect(),
            })
            .collect();
        Self { clients }
    }

    /// Compares the token against every configured client.
    fn lookup(&self, token: &str) -> Option<TokenInfo> {
        self.clients
            .iter()
            .fold(None, |found, c| match (found, c.matches(token)) {
                (None, true) => Some(c),
                (found, _) => found,
            })
            .map(|c| TokenInfo {
                client: c.name.clone(),
                scopes: c.scopes.clone(),
            })
    }
}

/// The authenticated API client making the request.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub client: String,
    scopes: HashSet<String>,
}

impl TokenInfo {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn require_scope(&self, scope: &'static str) -> Result<(), AppError> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            tracing::warn!(client = %self.client, scope, "Insufficient scope");
            Err(AppError::InsufficientScope(scope))
        }
    }
}

impl FromRequestParts<AppState> for TokenInfo {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        state.auth.lookup(token.trim()).ok_or(AppError::Unauthorized)
    }
}
