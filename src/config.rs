//! Environment configuration
//!
//! ## Variables
//! - `PORT`: listen port (default 8080)
//! - `DB_PATH`: JSON Lines data file (default `app.db.jsonl`)
//! - `OAUTH2_CLIENTS`: comma-separated `id:secret:domain` entries
//! - `JWT_SECRET`: token signing key (generated per process when unset)
//! - `ACCESS_TOKEN_TTL_SECS`: access token lifetime (default 7200)
//! - `BCRYPT_COST`: password hashing cost (default bcrypt's)
//! - `HUB_QUEUE_CAPACITY`: publish queue size per hub (default 256)
//! - `HUB_WRITE_TIMEOUT_MS`: per-subscriber write bound (default 5000)
//! - `WS_IDLE_TIMEOUT_SECS`: drop silent subscribers (unset disables)
//! - `LOG_LEVEL`, `LOG_FORMAT` (`pretty` or `json`)

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use crate::error::{AppError, AppResult};
use crate::hub::HubConfig;

/// A registered OAuth2 client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClient {
    pub id: String,
    pub secret: String,
    pub domain: String,
}

impl OAuthClient {
    fn fallback() -> Self {
        Self {
            id: "hello-client".to_string(),
            secret: "super-secret".to_string(),
            domain: "http://localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub clients: Vec<OAuthClient>,
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was missing and a random key was generated
    pub jwt_secret_generated: bool,
    pub access_token_ttl: i64,
    pub bcrypt_cost: u32,
    pub hub: HubConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (jwt_secret, jwt_secret_generated) = match lookup("JWT_SECRET") {
            Some(secret) if secret.len() >= 32 => (secret, false),
            Some(_) => {
                return Err(AppError::Config(
                    "JWT_SECRET must be at least 32 characters".to_string(),
                ))
            }
            None => (generate_secret(), true),
        };

        let hub = HubConfig {
            queue_capacity: parse_var(&lookup, "HUB_QUEUE_CAPACITY", 256usize)?,
            write_timeout: Duration::from_millis(parse_var(&lookup, "HUB_WRITE_TIMEOUT_MS", 5000u64)?),
            idle_timeout: match lookup("WS_IDLE_TIMEOUT_SECS") {
                Some(raw) => Some(Duration::from_secs(parse_value("WS_IDLE_TIMEOUT_SECS", &raw)?)),
                None => None,
            },
        };
        if hub.queue_capacity == 0 {
            return Err(AppError::Config("HUB_QUEUE_CAPACITY must be positive".to_string()));
        }

        Ok(Self {
            port: parse_var(&lookup, "PORT", 8080u16)?,
            db_path: lookup("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("app.db.jsonl")),
            clients: parse_clients(lookup("OAUTH2_CLIENTS").as_deref()),
            jwt_secret,
            jwt_secret_generated,
            access_token_ttl: parse_var(&lookup, "ACCESS_TOKEN_TTL_SECS", 7200i64)?,
            bcrypt_cost: parse_var(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            hub,
            logging: LoggingConfig {
                level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                format: lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key}={raw:?}: {e}")))
}

/// Parse `id:secret:domain` entries; malformed ones are skipped
fn parse_clients(raw: Option<&str>) -> Vec<OAuthClient> {
    let clients: Vec<OAuthClient> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.trim().splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(secret), Some(domain)) if !id.is_empty() => Some(OAuthClient {
                    id: id.to_string(),
                    secret: secret.to_string(),
                    domain: domain.to_string(),
                }),
                _ => None,
            }
        })
        .collect();

    if clients.is_empty() {
        vec![OAuthClient::fallback()]
    } else {
        clients
    }
}

/// 256 random bits, hex encoded
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
