//! OAuth2 password grant (RFC 6749 §4.3)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AuthService;
use crate::error::AppError;
use crate::store::Store;

/// Form fields of `POST /token`
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
}

impl TokenRequest {
    /// Fill fields missing here from `fallback`
    pub fn or(self, fallback: TokenRequest) -> TokenRequest {
        TokenRequest {
            grant_type: self.grant_type.or(fallback.grant_type),
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
            client_id: self.client_id.or(fallback.client_id),
            client_secret: self.client_secret.or(fallback.client_secret),
            scope: self.scope.or(fallback.scope),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Error body in the OAuth2 wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuthError {
    pub error: &'static str,
    pub error_description: String,
}

impl OAuthError {
    fn new(error: &'static str, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: description.into(),
        }
    }

    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new("invalid_request", description)
    }

    pub fn invalid_client() -> Self {
        Self::new("invalid_client", "client authentication failed")
    }

    pub fn invalid_grant() -> Self {
        Self::new("invalid_grant", "invalid username or password")
    }

    pub fn unsupported_grant_type() -> Self {
        Self::new("unsupported_grant_type", "only the password grant is supported")
    }

    pub fn unsupported_response_type() -> Self {
        Self::new(
            "unsupported_response_type",
            "authorization endpoint is not available; use the password grant",
        )
    }

    pub fn server_error() -> Self {
        Self::new("server_error", "internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            "invalid_client" => StatusCode::UNAUTHORIZED,
            "server_error" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AppError> for OAuthError {
    fn from(err: AppError) -> Self {
        tracing::error!(error = %err, "token request failed");
        Self::server_error()
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(&self)).into_response();
        if self.error == "invalid_client" {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Basic"),
            );
        }
        response
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, OAuthError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuthError::invalid_request(format!("missing {field}")))
}

impl AuthService {
    /// Exchange resource-owner credentials for an access token
    pub async fn password_grant(
        &self,
        store: &Store,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuthError> {
        let grant_type = required(request.grant_type, "grant_type")?;
        if grant_type != "password" {
            return Err(OAuthError::unsupported_grant_type());
        }

        let client_id = required(request.client_id, "client_id")?;
        let client_secret = request.client_secret.unwrap_or_default();
        if self.authenticate_client(&client_id, &client_secret).is_none() {
            warn!(client_id = %client_id, "client authentication failed");
            return Err(OAuthError::invalid_client());
        }

        let username = required(request.username, "username")?;
        let password = required(request.password, "password")?;

        let Some(user) = store.find_user(&username) else {
            warn!(username = %username, "token requested for unknown user");
            return Err(OAuthError::invalid_grant());
        };
        if !self
            .verify_password(password, user.password_hash.clone())
            .await?
        {
            warn!(username = %username, "password mismatch");
            return Err(OAuthError::invalid_grant());
        }

        let token = self.issue_token(&user, &client_id, request.scope)?;
        info!(user_id = user.id, client_id = %client_id, "access token issued");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_config;
    use tempfile::TempDir;

    async fn setup() -> (AuthService, Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("db.jsonl")).unwrap();
        let auth = AuthService::new(&test_config());
        let hash = auth.hash_password("pw".to_string()).await.unwrap();
        store.create_user("alice", hash).unwrap();
        (auth, store, dir)
    }

    fn request(password: &str) -> TokenRequest {
        TokenRequest {
            grant_type: Some("password".to_string()),
            username: Some("alice".to_string()),
            password: Some(password.to_string()),
            client_id: Some("hello-client".to_string()),
            client_secret: Some("super-secret".to_string()),
            scope: None,
        }
    }

    #[tokio::test]
    async fn test_password_grant_issues_token() {
        let (auth, store, _dir) = setup().await;
        let token = auth.password_grant(&store, request("pw")).await.unwrap();

        let claims = auth.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_password_grant_failures() {
        let (auth, store, _dir) = setup().await;

        let err = auth.password_grant(&store, request("nope")).await.unwrap_err();
        assert_eq!(err.error, "invalid_grant");

        let mut bad_client = request("pw");
        bad_client.client_secret = Some("wrong".to_string());
        let err = auth.password_grant(&store, bad_client).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let mut wrong_grant = request("pw");
        wrong_grant.grant_type = Some("client_credentials".to_string());
        let err = auth.password_grant(&store, wrong_grant).await.unwrap_err();
        assert_eq!(err.error, "unsupported_grant_type");

        let err = auth
            .password_grant(&store, TokenRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.error, "invalid_request");
    }
}
