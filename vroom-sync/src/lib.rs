//! vroom-sync library interface
//!
//! Exposes the synchronization core and the HTTP boundary for integration testing

pub mod api;
pub mod classify;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, SyncError};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::SyncEngine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    /// Base for absolute item URLs; request `Host` is used when absent
    pub public_url: Option<String>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<SyncEngine>, public_url: Option<String>) -> Self {
        Self {
            engine,
            public_url,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::sync_routes())
        .merge(api::library_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
