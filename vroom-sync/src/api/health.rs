//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when upstream is unreachable
    pub status: String,
    /// Module name ("vroom-sync")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Git commit and cargo profile of this build
    pub build: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub upstream: UpstreamHealth,
    /// Completion time of the last full pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pass_at: Option<DateTime<Utc>>,
    /// Last error message if any (for diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let upstream = match state.engine.upstream().version().await {
        Ok(version) => UpstreamHealth {
            reachable: true,
            version: Some(version),
            error: None,
        },
        Err(e) => UpstreamHealth {
            reachable: false,
            version: None,
            error: Some(e.to_string()),
        },
    };

    Json(HealthResponse {
        status: if upstream.reachable { "ok" } else { "degraded" }.to_string(),
        module: "vroom-sync".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: format!("{} ({})", env!("VROOM_GIT_HASH"), env!("VROOM_BUILD_PROFILE")),
        uptime_seconds,
        upstream,
        last_pass_at: state.engine.last_pass_at().await,
        last_error: state.engine.last_error().await,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
