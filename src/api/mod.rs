//! HTTP and WebSocket surface
//!
//! - `http`: router, CORS and request tracing
//! - `rest`: JSON endpoints for users, to-dos, tokens and hub status
//! - `websocket`: one subscribe endpoint per event category
//! - `extract`: bearer-token extractor for protected routes

pub mod extract;
pub mod http;
pub mod rest;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use state::AppState;
