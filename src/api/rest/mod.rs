//! REST API module for HTTP endpoints
//!
//! - `POST /token`, `GET /authorize` - OAuth2
//! - `POST /api/users`, `GET /api/users`, `GET /api/users/me`
//! - `GET|POST /api/todos`, `PUT|DELETE /api/todos/:id`
//! - `GET /api/hubs` - subscriber counts per event hub

pub mod hubs;
pub mod oauth;
pub mod todos;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Unwrap a JSON body, reporting any rejection as a plain bad request
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "invalid request body");
        AppError::BadRequest("invalid body".to_string())
    })
}
