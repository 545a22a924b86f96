//! Authentication
//!
//! Bearer tokens are HS256 JWTs issued through the OAuth2 password grant
//! (see [`oauth`]). Passwords are stored as bcrypt hashes; hashing runs on
//! the blocking pool so request tasks are not stalled.

pub mod oauth;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, OAuthClient};
use crate::error::{AppError, AppResult};
use crate::types::User;

pub use oauth::{OAuthError, TokenRequest, TokenResponse};

/// JWT claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    /// Client the token was issued to
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("token missing user".to_string()))
    }
}

/// Token issuer/verifier plus the registered clients
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clients: Vec<OAuthClient>,
    /// Access token lifetime in seconds
    pub access_token_ttl: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            clients: config.clients.clone(),
            access_token_ttl: config.access_token_ttl,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Look up a client by id and secret
    pub fn authenticate_client(&self, id: &str, secret: &str) -> Option<&OAuthClient> {
        self.clients
            .iter()
            .find(|client| client.id == id && client.secret == secret)
    }

    pub async fn hash_password(&self, password: String) -> AppResult<String> {
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))??;
        Ok(hashed)
    }

    /// Check a password against a stored hash; malformed hashes never match
    pub async fn verify_password(&self, password: String, hash: String) -> AppResult<bool> {
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?;
        Ok(verified.unwrap_or(false))
    }

    pub fn issue_token(
        &self,
        user: &User,
        client_id: &str,
        scope: Option<String>,
    ) -> AppResult<TokenResponse> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            client_id: client_id.to_string(),
            scope: scope.clone(),
            iat: now,
            exp: now + self.access_token_ttl,
        };
        let access_token = encode(&Header::default(), &claims, &self.encoding_key)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl,
            scope,
        })
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test-secret-that-is-long-enough-123456".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test config")
}
