//! To-do Hub
//!
//! A multi-user to-do REST service that announces every mutation to live
//! WebSocket subscribers, one event hub per mutation kind.
//!
//! # Features
//!
//! - **Event hubs**: `todo:created`, `todo:updated` and `todo:deleted`, each
//!   driven by a single control loop that owns its membership
//! - **Ordered fan-out**: every subscriber sees a hub's events in publish order
//! - **Fault isolation**: a failed or stalled subscriber is evicted without
//!   disturbing the others
//! - **OAuth2 password grant** with HS256 bearer tokens
//! - **Durable storage** in a JSON Lines file with atomic rewrites
//!
//! # Modules
//!
//! - `hub`: event hubs, subscriber lifecycle, WebSocket plumbing
//! - `api`: axum router, REST handlers, WebSocket endpoints
//! - `auth`: client authentication, password hashing, tokens
//! - `store`: users and to-dos
//! - `types`: wire and storage records
//! - `config`: environment configuration
//! - `error`: application error type
//! - `utils`: atomic file writes
//!
//! # Example
//!
//! ```no_run
//! use todo_hub::hub::{EventCategory, HubConfig, HubSet};
//!
//! # async fn demo() {
//! let (hubs, runtime) = HubSet::start(&HubConfig::default());
//! hubs.publish(EventCategory::Created, r#"{"id":1,"title":"x"}"#).await;
//! runtime.shutdown().await;
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod hub;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::{create_router, AppState};
pub use auth::AuthService;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use hub::{
    EventCategory, EventHub, HubConfig, HubRuntime, HubSet, Payload, Subscriber, SubscriberId,
};
pub use store::Store;
pub use types::{CreateTodo, DeletedTodo, Todo, UpdateTodo, User, UserView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported at startup
pub const NAME: &str = env!("CARGO_PKG_NAME");
