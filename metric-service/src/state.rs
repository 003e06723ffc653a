//! Application state shared across handlers.

use std::sync::Arc;

use common::config::AppConfig;
use common::models::Catalog;

use crate::connection_manager::ConnectionManager;

/// Shared handler state: the immutable catalog plus the per-alias
/// connection cache, both constructed once at startup and injected.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub catalog: Arc<Catalog>,
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    /// Creates application state from a loaded configuration and catalog.
    pub fn new(config: AppConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog: Arc::new(catalog),
            connections: Arc::new(ConnectionManager::new()),
        }
    }
}
