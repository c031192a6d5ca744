//! Projected library structure handed to the service boundary

use super::FilterMode;
use crate::classify::Identity;
use serde::Serialize;

/// All views in catalog order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Library {
    pub sections: Vec<LibrarySection>,
}

/// One view's current membership
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibrarySection {
    pub view_key: String,
    pub name: String,
    pub items: Vec<ItemRef>,
}

/// Lightweight reference to an item
///
/// `path` is relative (`scene/12`); the boundary resolves it to an absolute URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRef {
    pub id: String,
    pub mode: FilterMode,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

impl Library {
    /// Total number of item references across sections
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}
