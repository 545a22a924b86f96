//! WebSocket endpoints
//!
//! `GET /ws/todos/{created,updated,deleted}` upgrades the request and joins
//! the caller to that category's event hub. The server only pushes; anything
//! the client sends is treated as keepalive.

pub mod handler;
