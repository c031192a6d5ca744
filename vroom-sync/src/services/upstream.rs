//! Upstream query capability consumed by the catalog and the synchronizer
//!
//! The upstream has no push/subscribe mechanism: only bulk query-by-filter
//! and query-by-id. Every method is a blocking network call and the only
//! place a pass may suspend.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{FilterMode, Item, SavedFilter};

/// Upstream client errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication rejected ({0})")]
    Auth(u16),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Translated query criteria for one view
///
/// `find_filter` carries sort/direction/paging, `object_filter` the structured
/// criteria (sent as `scene_filter` or `image_filter`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemQuery {
    pub find_filter: Value,
    pub object_filter: Value,
}

/// Upstream catalog API
///
/// Ordering contract: `fetch_item_ids` and `fetch_items` return the same order
/// for equivalent criteria, and `fetch_items_by_ids` returns records in the
/// relative order of the requested ids. The synchronizer verifies the last
/// assumption instead of trusting it.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Upstream server version (connectivity and auth probe)
    async fn version(&self) -> Result<String, UpstreamError>;

    /// All saved filters of one mode, in upstream order
    async fn fetch_filters(&self, mode: FilterMode) -> Result<Vec<SavedFilter>, UpstreamError>;

    /// Ordered ids matching the criteria (id-only projection)
    async fn fetch_item_ids(
        &self,
        mode: FilterMode,
        query: &ItemQuery,
    ) -> Result<Vec<String>, UpstreamError>;

    /// Ordered full records matching the criteria
    async fn fetch_items(
        &self,
        mode: FilterMode,
        query: &ItemQuery,
    ) -> Result<Vec<Item>, UpstreamError>;

    /// Full records for an explicit id list
    async fn fetch_items_by_ids(
        &self,
        mode: FilterMode,
        ids: &[String],
    ) -> Result<Vec<Item>, UpstreamError>;
}
