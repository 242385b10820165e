//! Shared application state for Axum routers.

use std::sync::Arc;

use roster_storage::RosterStore;

use crate::config::ApiConfig;

/// The store every handler talks to, whichever backend is configured.
pub type SharedStore = Arc<dyn RosterStore>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: Arc<ApiConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(store: SharedStore, config: ApiConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }
}

crate::impl_from_ref!(SharedStore, store);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(std::time::Instant, start_time);
