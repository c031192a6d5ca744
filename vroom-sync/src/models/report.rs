//! Results returned by catalog loads, view syncs and whole passes

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SyncError;

/// Which branch of the fetch algorithm served a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPath {
    /// Full records by filter criteria (no reusable state)
    Cold,
    /// Id-only query plus targeted fetch of unknown ids
    Warm,
    /// Full records by the view's explicit id list
    IdOverride,
}

/// One positional change applied to a view's membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum MemberChange {
    /// Id was not in the view; inserted at `at`
    Inserted { id: String, at: usize },
    /// Id was in the view at working position `from`; moved to `to`
    Moved { id: String, from: usize, to: usize },
    /// Id already at `at`; attributes refreshed only
    Refreshed { id: String, at: usize },
    /// Id did not reappear in the latest fetch
    Removed { id: String },
}

/// Structured diff of one view sync
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewDiff {
    pub view_key: String,
    pub path: FetchPath,
    /// Number of full records fetched from upstream for this view
    pub fetched: usize,
    pub changes: Vec<MemberChange>,
}

impl ViewDiff {
    pub fn inserted(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                MemberChange::Inserted { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn moved(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                MemberChange::Moved { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn refreshed(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                MemberChange::Refreshed { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                MemberChange::Removed { id } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True when the membership order or content changed
    pub fn is_reordered(&self) -> bool {
        self.changes
            .iter()
            .any(|c| !matches!(c, MemberChange::Refreshed { .. }))
    }
}

/// Outcome of one catalog load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Filters returned by upstream across all modes
    pub total_filters: usize,
    /// Filters without an active prefix, or explicitly ignored
    pub ignored: usize,
    /// Keys of views created by this load
    pub added: Vec<String>,
    /// Keys of existing views whose filter criteria changed upstream
    pub updated: Vec<String>,
    /// Keys of views whose filter was absent from this load
    pub dropped: Vec<String>,
    /// Keys seen more than once in this load (first seen wins)
    pub duplicates: Vec<String>,
}

/// Per-view result within a pass
#[derive(Debug)]
pub struct ViewOutcome {
    pub view_key: String,
    pub display_name: String,
    pub result: Result<ViewDiff, SyncError>,
}

/// Result of one full synchronization pass
#[derive(Debug)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub catalog: LoadReport,
    pub views: Vec<ViewOutcome>,
    /// Items dropped from the store because no view refers to them
    pub pruned: usize,
}

impl PassReport {
    /// Views whose update was aborted
    pub fn failures(&self) -> impl Iterator<Item = &ViewOutcome> {
        self.views.iter().filter(|v| v.result.is_err())
    }
}
