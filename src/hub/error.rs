//! Error types for the event hubs

use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// An upgrade request that could not be turned into a WebSocket.
///
/// Raised before any hub state changes; the caller gets the rejection's
/// HTTP response.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("websocket handshake rejected: {0}")]
    Rejected(#[from] WebSocketUpgradeRejection),
}

impl IntoResponse for HandshakeError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(rejection) => rejection.into_response(),
        }
    }
}

/// A write to one subscriber failed. Never leaves the control loop.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),
    #[error("write timed out after {0:?}")]
    Timeout(Duration),
    #[error("subscriber disconnected")]
    Disconnected,
}

/// Errors raised by a hub handle
#[derive(Debug, Error)]
pub enum HubError {
    /// The control loop for this hub has terminated
    #[error("event hub '{0}' is not running")]
    Stopped(String),
    #[error("unknown event category '{0}'")]
    UnknownCategory(String),
}
