//! To-do endpoints
//!
//! Each successful mutation is announced on the matching event hub before
//! the response is returned.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::json_body;
use crate::api::extract::AuthUser;
use crate::api::state::AppState;
use crate::error::{AppError, AppResult};
use crate::hub::EventCategory;
use crate::types::{CreateTodo, DeletedTodo, Todo, UpdateTodo};

fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("invalid todo id".to_string()))
}

/// GET /api/todos
pub async fn list_todos(State(state): State<Arc<AppState>>, user: AuthUser) -> Json<Vec<Todo>> {
    Json(state.store.list_todos(user.user_id))
}

/// POST /api/todos
pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    body: Result<Json<CreateTodo>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Todo>)> {
    let body = json_body(body)?;
    let todo = state.store.create_todo(user.user_id, &body.title)?;
    info!(todo_id = todo.id, user_id = user.user_id, "todo created");

    state
        .hubs
        .publish(EventCategory::Created, serde_json::to_vec(&todo)?)
        .await;

    Ok((StatusCode::CREATED, Json(todo)))
}

/// PUT /api/todos/:id
pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateTodo>, JsonRejection>,
) -> AppResult<Json<Todo>> {
    let id = parse_id(&id)?;
    let patch = json_body(body)?;
    let todo = state.store.update_todo(user.user_id, id, patch)?;
    info!(todo_id = todo.id, user_id = user.user_id, "todo updated");

    state
        .hubs
        .publish(EventCategory::Updated, serde_json::to_vec(&todo)?)
        .await;

    Ok(Json(todo))
}

/// DELETE /api/todos/:id
pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    state.store.delete_todo(user.user_id, id)?;
    info!(todo_id = id, user_id = user.user_id, "todo deleted");

    state
        .hubs
        .publish(EventCategory::Deleted, serde_json::to_vec(&DeletedTodo { id })?)
        .await;

    Ok(StatusCode::NO_CONTENT)
}
