//! Views derived from active saved filters

use super::{FilterMode, SavedFilter};
use serde::Serialize;

/// A named, ordered projection of upstream items backed by one saved filter
///
/// Key, display name and rank are fixed at creation. A later catalog load that
/// sees the same filter again only replaces the backing filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    /// Mode letter + ":" + filter id, e.g. `s:42`
    pub key: String,
    /// Filter name with the active prefix stripped
    pub display_name: String,
    /// Position key in the catalog (the filter's numeric id)
    pub sort_rank: u64,
    pub mode: FilterMode,
    /// Backing filter from the latest catalog load
    #[serde(skip)]
    pub filter: SavedFilter,
    /// Explicit ordered id list; when non-empty it replaces the filter criteria
    pub id_override: Vec<String>,
}

impl View {
    /// Create a view for an active filter
    pub fn new(filter: SavedFilter, display_name: impl Into<String>) -> Self {
        Self {
            key: Self::key_for(filter.mode, filter.id),
            display_name: display_name.into(),
            sort_rank: filter.id,
            mode: filter.mode,
            filter,
            id_override: Vec::new(),
        }
    }

    /// Attach an explicit id list
    pub fn with_id_override(mut self, ids: Vec<String>) -> Self {
        self.id_override = ids;
        self
    }

    /// View key for a filter
    pub fn key_for(mode: FilterMode, filter_id: u64) -> String {
        format!("{}:{}", mode.letter(), filter_id)
    }
}
