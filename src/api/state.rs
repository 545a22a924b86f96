//! Shared application state

use std::sync::Arc;

use crate::auth::AuthService;
use crate::hub::HubSet;
use crate::store::Store;

/// Handles every request needs
pub struct AppState {
    pub store: Arc<Store>,
    pub auth: Arc<AuthService>,
    /// Event hubs the mutation handlers publish to
    pub hubs: HubSet,
}

impl AppState {
    pub fn new(store: Arc<Store>, auth: Arc<AuthService>, hubs: HubSet) -> Self {
        Self { store, auth, hubs }
    }
}
