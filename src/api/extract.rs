//! Bearer token extraction

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::state::AppState;
use crate::auth::Claims;
use crate::error::AppError;

/// The caller behind a valid `Authorization: Bearer` token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub claims: Claims,
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("invalid or missing token".to_string())
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(unauthorized)?;

        let (scheme, token) = header.split_once(' ').ok_or_else(unauthorized)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(unauthorized());
        }

        let claims = state.auth.verify_token(token.trim()).map_err(|err| {
            tracing::debug!(error = %err, "bearer token rejected");
            unauthorized()
        })?;
        let user_id = claims.user_id()?;

        Ok(Self { user_id, claims })
    }
}
