//! WebSocket upgrade handler

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::Response;

use crate::api::state::AppState;
use crate::error::{AppError, AppResult};
use crate::hub::EventCategory;

/// GET /ws/todos/:category
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> AppResult<Response> {
    let category: EventCategory = category
        .parse()
        .map_err(|err: crate::hub::HubError| AppError::NotFound(err.to_string()))?;

    Ok(state.hubs.hub(category).subscribe(upgrade)?)
}
