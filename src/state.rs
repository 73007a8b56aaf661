use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::DocumentStore;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable: both members are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        Self { store, config: Arc::new(config) }
    }
}
