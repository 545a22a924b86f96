//! OAuth2 endpoints

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::Form;
use axum::Json;

use crate::api::state::AppState;
use crate::auth::{OAuthError, TokenRequest, TokenResponse};

/// POST /token - password grant
///
/// Fields come from the form body; query parameters fill in anything the
/// body leaves out.
pub async fn token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenRequest>,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Json<TokenResponse>, OAuthError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "token request without form body");
            TokenRequest::default()
        }
    };

    let token = state.auth.password_grant(&state.store, form.or(query)).await?;
    Ok(Json(token))
}

/// GET /authorize - the authorization-code flow is not offered
pub async fn authorize() -> OAuthError {
    OAuthError::unsupported_response_type()
}
