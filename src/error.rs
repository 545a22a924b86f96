//! Application error type
//!
//! Every fallible operation outside the hub control loop returns
//! [`AppResult`]. Handlers let `?` carry errors up to axum, where
//! [`AppError`] renders itself as a JSON body with a matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::hub::HandshakeError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Handshake(HandshakeError::Rejected(rejection)) => rejection.status(),
            Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::PasswordHash(_)
            | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code for the JSON body
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) | Self::Token(_) => "UNAUTHORIZED",
            Self::Conflict(_) => "CONFLICT",
            Self::Handshake(_) => "HANDSHAKE_FAILED",
            Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::PasswordHash(_)
            | Self::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        if let Self::Handshake(err) = self {
            return err.into_response();
        }

        let body = ErrorBody {
            error: if status.is_server_error() {
                "internal server error".to_string()
            } else {
                self.to_string()
            },
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
