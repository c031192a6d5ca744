//! Synchronization trigger endpoint

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::{FetchPath, LoadReport, PassReport};
use crate::{ApiResult, AppState};

/// Pass summary returned by POST /sync
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub catalog: LoadReport,
    pub views: Vec<ViewSummary>,
    pub pruned: usize,
}

/// Outcome of one view within the pass
#[derive(Debug, Serialize)]
pub struct ViewSummary {
    pub view_key: String,
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<FetchPath>,
    pub fetched: usize,
    pub inserted: usize,
    pub moved: usize,
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PassReport> for SyncResponse {
    fn from(report: PassReport) -> Self {
        let views = report
            .views
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(diff) => ViewSummary {
                    view_key: outcome.view_key,
                    name: outcome.display_name,
                    ok: true,
                    path: Some(diff.path),
                    fetched: diff.fetched,
                    inserted: diff.inserted().len(),
                    moved: diff.moved().len(),
                    removed: diff.removed().len(),
                    error: None,
                },
                Err(e) => ViewSummary {
                    view_key: outcome.view_key,
                    name: outcome.display_name,
                    ok: false,
                    path: None,
                    fetched: 0,
                    inserted: 0,
                    moved: 0,
                    removed: 0,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        Self {
            started_at: report.started_at,
            finished_at: report.finished_at,
            catalog: report.catalog,
            views,
            pruned: report.pruned,
        }
    }
}

/// POST /sync
///
/// Runs one pass and returns its summary.
///
/// **Errors:**
/// - 409 Conflict: a pass is already running
/// - 502 Bad Gateway: upstream request failed
pub async fn trigger_sync(State(state): State<AppState>) -> ApiResult<Json<SyncResponse>> {
    info!("Synchronization pass requested");
    let report = state.engine.run_pass().await?;
    Ok(Json(report.into()))
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new().route("/sync", post(trigger_sync))
}
