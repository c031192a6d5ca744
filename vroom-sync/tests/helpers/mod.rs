//! Test Helper Utilities
//!
//! Shared utilities for testing vroom-sync: an in-memory upstream that records
//! every call and can be told to misbehave.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use vroom_common::config::CatalogConfig;
use vroom_sync::classify::IdentityClassifier;
use vroom_sync::models::{FilterMode, Item, SavedFilter, View};
use vroom_sync::services::{
    ItemQuery, LibraryProjector, SyncEngine, Upstream, UpstreamError, ViewCatalog,
};

/// Criteria clause the fake uses to look up a filter's result list
pub const RESULT_KEY: &str = "fake_result";

/// One recorded upstream call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Version,
    Filters(FilterMode),
    /// Id-only query for the given result key
    Ids(String),
    /// Full-record query for the given result key
    Items(String),
    ByIds(FilterMode, Vec<String>),
}

#[derive(Default)]
struct FakeState {
    filters: HashMap<FilterMode, Vec<SavedFilter>>,
    items: HashMap<(FilterMode, String), Value>,
    results: HashMap<String, Vec<String>>,
    calls: Vec<Call>,
    offline: bool,
    reverse_by_ids: bool,
    drop_last_by_id: bool,
}

/// In-memory upstream
#[derive(Default)]
pub struct FakeUpstream {
    state: Mutex<FakeState>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved filter resolved through `set_result` under its view key
    pub fn add_filter(&self, mode: FilterMode, id: u64, name: &str) {
        self.add_saved_filter(saved_filter(mode, id, name));
    }

    pub fn add_saved_filter(&self, filter: SavedFilter) {
        let mut state = self.state.lock().unwrap();
        state.filters.entry(filter.mode).or_default().push(filter);
    }

    pub fn remove_filter(&self, mode: FilterMode, id: u64) {
        let mut state = self.state.lock().unwrap();
        if let Some(list) = state.filters.get_mut(&mode) {
            list.retain(|f| f.id != id);
        }
    }

    /// Point a stored filter's criteria at the result list `result_key`
    pub fn set_filter_criteria(&self, mode: FilterMode, id: u64, result_key: &str) {
        let mut state = self.state.lock().unwrap();
        let filter = state
            .filters
            .get_mut(&mode)
            .and_then(|list| list.iter_mut().find(|f| f.id == id))
            .unwrap_or_else(|| panic!("no filter {} in {:?}", id, mode));
        let mut criteria = Map::new();
        criteria.insert(RESULT_KEY.to_string(), json!(result_key));
        filter.object_filter = Some(Value::Object(criteria));
    }

    /// Upstream record with a single file at `path`
    pub fn add_item(&self, mode: FilterMode, id: &str, title: &str, path: &str) {
        let files_key = match mode {
            FilterMode::Scenes => "files",
            FilterMode::Images => "visual_files",
        };
        let mut record = Map::new();
        record.insert("id".to_string(), json!(id));
        record.insert("title".to_string(), json!(title));
        record.insert(files_key.to_string(), json!([{ "path": path }]));
        self.state
            .lock()
            .unwrap()
            .items
            .insert((mode, id.to_string()), Value::Object(record));
    }

    /// Scenes `ids`, titled `title <id>`, filed as `<id>.mp4`
    pub fn add_scenes(&self, ids: &[&str]) {
        for id in ids {
            self.add_item(FilterMode::Scenes, id, &format!("title {}", id), &format!("/vr/{}.mp4", id));
        }
    }

    /// Ordered ids returned for the filter with view key `key`
    pub fn set_result(&self, key: &str, ids: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .results
            .insert(key.to_string(), ids.iter().map(|s| s.to_string()).collect());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Every request fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// By-id lookups return records in reverse request order
    pub fn set_reverse_by_ids(&self, reverse: bool) {
        self.state.lock().unwrap().reverse_by_ids = reverse;
    }

    /// By-id lookups silently omit the last requested record
    pub fn set_drop_last_by_id(&self, drop: bool) {
        self.state.lock().unwrap().drop_last_by_id = drop;
    }

    fn record(&self, call: Call) -> Result<std::sync::MutexGuard<'_, FakeState>, UpstreamError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.offline {
            return Err(UpstreamError::Network("connection refused".to_string()));
        }
        Ok(state)
    }
}

fn result_key(query: &ItemQuery) -> String {
    query
        .object_filter
        .get(RESULT_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn to_item(mode: FilterMode, record: &Value) -> Item {
    Item::from_json(mode, record.clone()).unwrap()
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn version(&self) -> Result<String, UpstreamError> {
        self.record(Call::Version)?;
        Ok("v0.27.2".to_string())
    }

    async fn fetch_filters(&self, mode: FilterMode) -> Result<Vec<SavedFilter>, UpstreamError> {
        let state = self.record(Call::Filters(mode))?;
        Ok(state.filters.get(&mode).cloned().unwrap_or_default())
    }

    async fn fetch_item_ids(
        &self,
        _mode: FilterMode,
        query: &ItemQuery,
    ) -> Result<Vec<String>, UpstreamError> {
        let key = result_key(query);
        let state = self.record(Call::Ids(key.clone()))?;
        Ok(state.results.get(&key).cloned().unwrap_or_default())
    }

    async fn fetch_items(
        &self,
        mode: FilterMode,
        query: &ItemQuery,
    ) -> Result<Vec<Item>, UpstreamError> {
        let key = result_key(query);
        let state = self.record(Call::Items(key.clone()))?;
        let ids = state.results.get(&key).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| state.items.get(&(mode, id.clone())))
            .map(|record| to_item(mode, record))
            .collect())
    }

    async fn fetch_items_by_ids(
        &self,
        mode: FilterMode,
        ids: &[String],
    ) -> Result<Vec<Item>, UpstreamError> {
        let state = self.record(Call::ByIds(mode, ids.to_vec()))?;
        let mut items: Vec<Item> = ids
            .iter()
            .filter_map(|id| state.items.get(&(mode, id.clone())))
            .map(|record| to_item(mode, record))
            .collect();
        if state.reverse_by_ids {
            items.reverse();
        }
        if state.drop_last_by_id {
            items.pop();
        }
        Ok(items)
    }
}

/// Saved filter whose criteria point at the fake result list for its view key
pub fn saved_filter(mode: FilterMode, id: u64, name: &str) -> SavedFilter {
    let mut criteria = Map::new();
    criteria.insert(RESULT_KEY.to_string(), json!(View::key_for(mode, id)));
    SavedFilter {
        id,
        mode,
        name: name.to_string(),
        find_filter: Some(json!({"sort": "date", "direction": "DESC"})),
        object_filter: Some(Value::Object(criteria)),
        ui_options: None,
    }
}

/// View over `saved_filter(mode, id, ..)`
pub fn test_view(mode: FilterMode, id: u64) -> View {
    View::new(saved_filter(mode, id, &format!("VR | view {}", id)), format!("view {}", id))
}

/// Catalog with the default `VR`/`HereSphere` prefixes
pub fn test_catalog() -> ViewCatalog {
    ViewCatalog::new(&CatalogConfig::default()).unwrap()
}

pub fn test_classifier() -> IdentityClassifier {
    IdentityClassifier::new(&["mp4", "m4v", "mkv", "avi", "webm", "wmv", "mov"]).unwrap()
}

/// Engine over the given fake with default catalog settings
pub fn test_engine(fake: &Arc<FakeUpstream>) -> SyncEngine {
    let upstream: Arc<dyn Upstream> = fake.clone();
    SyncEngine::new(upstream, test_catalog(), LibraryProjector::new(test_classifier()))
}

pub fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
