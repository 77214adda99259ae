use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: aqualog_db::DbPool,
    /// Server configuration (accessed by auth middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Domain event bus; one fact published per successful transition.
    pub event_bus: Arc<aqualog_events::EventBus>,
}
