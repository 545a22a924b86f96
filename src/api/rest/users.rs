//! User endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::json_body;
use crate::api::extract::AuthUser;
use crate::api::state::AppState;
use crate::error::{AppError, AppResult};
use crate::types::{RegisterUser, UserView};

/// POST /api/users - open registration
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let RegisterUser { username, password } = json_body(body)?;
    let username = username.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "username and password are required".to_string(),
        ));
    }
    if state.store.find_user(&username).is_some() {
        return Err(AppError::Conflict("user already exists".to_string()));
    }

    let password_hash = state.auth.hash_password(password).await?;
    let user = state.store.create_user(&username, password_hash)?;
    info!(user_id = user.id, username = %user.username, "user registered");

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// GET /api/users
pub async fn list_users(State(state): State<Arc<AppState>>, _user: AuthUser) -> Json<Vec<UserView>> {
    Json(state.store.list_users())
}

/// GET /api/users/me
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UserView>> {
    let user = state.store.get_user(user.user_id)?;
    Ok(Json(UserView::from(&user)))
}
