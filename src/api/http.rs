//! HTTP server setup with Axum

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::{hubs, oauth, todos, users};
use super::state::AppState;
use super::websocket::handler::subscribe;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        // OAuth2
        .route("/authorize", get(oauth::authorize))
        .route("/token", post(oauth::token))
        // REST API
        .route("/api/users", post(users::register).get(users::list_users))
        .route("/api/users/me", get(users::current_user))
        .route("/api/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/api/todos/:id",
            put(todos::update_todo).delete(todos::delete_todo),
        )
        .route("/api/hubs", get(hubs::hub_status))
        // WebSocket endpoints, one per event category
        .route("/ws/todos/:category", get(subscribe))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
