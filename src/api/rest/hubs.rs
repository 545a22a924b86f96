//! Event hub status

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HubStatus {
    pub name: &'static str,
    pub path: String,
    pub subscribers: usize,
}

/// GET /api/hubs
pub async fn hub_status(State(state): State<Arc<AppState>>) -> Json<Vec<HubStatus>> {
    let status = state
        .hubs
        .iter()
        .map(|(category, hub)| HubStatus {
            name: category.hub_name(),
            path: format!("/ws/todos/{}", category.path_segment()),
            subscribers: hub.subscriber_count(),
        })
        .collect();
    Json(status)
}
