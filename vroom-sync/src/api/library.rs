//! Library endpoints
//!
//! Serves the latest projection with item paths resolved to absolute URLs,
//! against the configured public URL or else the request `Host` header.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::classify::Identity;
use crate::models::{FilterMode, LibrarySection};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub sections: Vec<SectionResponse>,
}

#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub key: String,
    pub name: String,
    pub items: Vec<ItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub mode: FilterMode,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

/// GET /library
pub async fn get_library(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<LibraryResponse>> {
    let base = base_url(&state, &headers)?;
    let library = state.engine.library().await;

    Ok(Json(LibraryResponse {
        sections: library
            .sections
            .iter()
            .map(|section| resolve_section(&base, section))
            .collect(),
    }))
}

/// GET /library/:key
pub async fn get_section(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<SectionResponse>> {
    let base = base_url(&state, &headers)?;
    let library = state.engine.library().await;

    library
        .sections
        .iter()
        .find(|s| s.view_key == key)
        .map(|section| Json(resolve_section(&base, section)))
        .ok_or_else(|| ApiError::NotFound(format!("view {}", key)))
}

fn base_url(state: &AppState, headers: &HeaderMap) -> ApiResult<String> {
    if let Some(public) = &state.public_url {
        return Ok(public.trim_end_matches('/').to_string());
    }

    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(|host| format!("http://{}", host))
        .ok_or_else(|| ApiError::BadRequest("Missing Host header".to_string()))
}

fn resolve_section(base: &str, section: &LibrarySection) -> SectionResponse {
    SectionResponse {
        key: section.view_key.clone(),
        name: section.name.clone(),
        items: section
            .items
            .iter()
            .map(|item| ItemResponse {
                id: item.id.clone(),
                mode: item.mode,
                url: format!("{}/{}", base, item.path),
                identity: item.identity.clone(),
            })
            .collect(),
    }
}

/// Build library routes
pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/library", get(get_library))
        .route("/library/:key", get(get_section))
}
