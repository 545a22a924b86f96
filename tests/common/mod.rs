//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use todo_hub::hub::{DeliveryError, Payload};
use todo_hub::{
    create_router, AppConfig, AppState, AuthService, EventHub, HubRuntime, HubSet, Store,
    Subscriber,
};

pub const CLIENT_ID: &str = "hello-client";
pub const CLIENT_SECRET: &str = "super-secret";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub runtime: HubRuntime,
    _dir: TempDir,
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("integration-test-secret-0123456789abcdef".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn setup() -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = test_config();

    let store = Arc::new(Store::open(dir.path().join("app.db.jsonl")).unwrap());
    let auth = Arc::new(AuthService::new(&config));
    let (hubs, runtime) = HubSet::start(&config.hub);
    let state = Arc::new(AppState::new(store, auth, hubs));

    TestApp {
        router: create_router(state.clone()),
        state,
        runtime,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };
        (status, value)
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/api/users",
            None,
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
    }

    pub async fn token(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let form = format!(
            "grant_type=password&username={username}&password={password}&client_id={CLIENT_ID}&client_secret={CLIENT_SECRET}"
        );
        self.send(form_request("/token", form)).await
    }

    /// Register `username` and return a bearer token for it
    pub async fn login(&self, username: &str) -> String {
        let (status, _) = self.register(username, "pw").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.token(username, "pw").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["access_token"].as_str().unwrap().to_string()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(uri: &str, form: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap()
}

/// An in-memory subscriber and the receiving end of its deliveries
pub fn channel_subscriber() -> (Subscriber, mpsc::Receiver<Payload>) {
    let (tx, rx) = mpsc::channel(64);
    (Subscriber::new(tx.sink_map_err(|_| DeliveryError::Disconnected)), rx)
}

pub async fn next_payload(rx: &mut mpsc::Receiver<Payload>) -> Value {
    let payload = tokio::time::timeout(Duration::from_secs(2), rx.next())
        .await
        .expect("no delivery within 2s")
        .expect("subscriber channel closed");
    serde_json::from_slice(payload.as_bytes()).unwrap()
}

/// Wait until `hub` reports `expected` members
pub async fn settle(hub: &EventHub, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while hub.subscriber_count() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{} never reached {expected} members", hub.name()));
}
