//! Shared item store and per-view memberships
//!
//! One owner for all mutable sync state. Scene and image ids are independent
//! upstream sequences, so items are keyed by `(mode, id)`.
//!
//! Items written since the last [`ItemStore::begin_pass`] are "fresh". Only
//! fresh items are reused by the warm path; anything older is fetched again.

use std::collections::{HashMap, HashSet};

use crate::models::{FilterMode, Item, View};

type ItemKey = (FilterMode, String);

/// Items by id plus each view's ordered member ids
#[derive(Debug, Default)]
pub struct ItemStore {
    items: HashMap<ItemKey, Item>,
    fresh: HashSet<ItemKey>,
    memberships: HashMap<String, Vec<String>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: FilterMode, id: &str) -> Option<&Item> {
        self.items.get(&(mode, id.to_string()))
    }

    pub fn contains(&self, mode: FilterMode, id: &str) -> bool {
        self.items.contains_key(&(mode, id.to_string()))
    }

    /// Insert or replace an item (latest fetch wins) and mark it fresh
    pub fn upsert(&mut self, item: Item) {
        let key = (item.mode, item.id.clone());
        self.fresh.insert(key.clone());
        self.items.insert(key, item);
    }

    /// Start a new pass: every stored item becomes stale
    pub fn begin_pass(&mut self) {
        self.fresh.clear();
    }

    /// True when the item was fetched during the current pass
    pub fn is_fresh(&self, mode: FilterMode, id: &str) -> bool {
        self.fresh.contains(&(mode, id.to_string()))
    }

    /// True when no item of this mode has been fetched during the current pass
    pub fn is_empty_for(&self, mode: FilterMode) -> bool {
        !self.fresh.iter().any(|(m, _)| *m == mode)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Ordered member ids of a view (empty for a view never synced)
    pub fn membership(&self, view_key: &str) -> &[String] {
        self.memberships
            .get(view_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_membership(&mut self, view_key: &str, ids: Vec<String>) {
        self.memberships.insert(view_key.to_string(), ids);
    }

    /// Forget a view's membership; its items stay in the store
    pub fn remove_view(&mut self, view_key: &str) -> Option<Vec<String>> {
        self.memberships.remove(view_key)
    }

    /// Drop items no membership of `views` refers to
    ///
    /// Returns the number of items removed.
    pub fn prune(&mut self, views: &[View]) -> usize {
        let referenced: HashSet<ItemKey> = views
            .iter()
            .flat_map(|view| {
                self.membership(&view.key)
                    .iter()
                    .map(move |id| (view.mode, id.clone()))
            })
            .collect();

        let before = self.items.len();
        self.items.retain(|key, _| referenced.contains(key));
        self.fresh.retain(|key| referenced.contains(key));
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SavedFilter;
    use serde_json::json;

    fn item(mode: FilterMode, id: &str, title: &str) -> Item {
        Item::from_json(mode, json!({"id": id, "title": title})).unwrap()
    }

    #[test]
    fn test_upsert_replaces() {
        let mut store = ItemStore::new();
        store.upsert(item(FilterMode::Scenes, "1", "old"));
        store.upsert(item(FilterMode::Scenes, "1", "new"));

        assert_eq!(store.item_count(), 1);
        assert_eq!(store.get(FilterMode::Scenes, "1").unwrap().title(), Some("new"));
    }

    #[test]
    fn test_modes_are_separate() {
        let mut store = ItemStore::new();
        store.upsert(item(FilterMode::Scenes, "7", "scene"));

        assert!(store.contains(FilterMode::Scenes, "7"));
        assert!(!store.contains(FilterMode::Images, "7"));
        assert!(!store.is_empty_for(FilterMode::Scenes));
        assert!(store.is_empty_for(FilterMode::Images));
    }

    #[test]
    fn test_membership_lifecycle() {
        let mut store = ItemStore::new();
        assert!(store.membership("s:1").is_empty());

        store.upsert(item(FilterMode::Scenes, "1", "a"));
        store.set_membership("s:1", vec!["1".to_string()]);
        assert_eq!(store.membership("s:1"), ["1".to_string()]);

        assert_eq!(store.remove_view("s:1"), Some(vec!["1".to_string()]));
        assert!(store.membership("s:1").is_empty());
        assert!(store.contains(FilterMode::Scenes, "1"));
    }

    #[test]
    fn test_begin_pass_makes_items_stale() {
        let mut store = ItemStore::new();
        store.upsert(item(FilterMode::Scenes, "1", "a"));
        assert!(store.is_fresh(FilterMode::Scenes, "1"));

        store.begin_pass();
        assert!(!store.is_fresh(FilterMode::Scenes, "1"));
        assert!(store.is_empty_for(FilterMode::Scenes));
        // Stale items are still stored
        assert!(store.contains(FilterMode::Scenes, "1"));

        store.upsert(item(FilterMode::Scenes, "1", "b"));
        assert!(!store.is_empty_for(FilterMode::Scenes));
    }

    fn view(mode: FilterMode, id: u64) -> View {
        let filter = SavedFilter {
            id,
            mode,
            name: format!("VR | {}", id),
            find_filter: None,
            object_filter: None,
            ui_options: None,
        };
        View::new(filter, id.to_string())
    }

    #[test]
    fn test_prune_drops_unreferenced_items() {
        let mut store = ItemStore::new();
        for id in ["1", "2", "3"] {
            store.upsert(item(FilterMode::Scenes, id, id));
        }
        store.upsert(item(FilterMode::Images, "1", "image"));
        store.set_membership("s:1", vec!["1".to_string()]);
        store.set_membership("s:2", vec!["1".to_string(), "3".to_string()]);
        // Membership of a view not passed to prune does not count
        store.set_membership("s:9", vec!["2".to_string()]);

        let removed = store.prune(&[view(FilterMode::Scenes, 1), view(FilterMode::Scenes, 2)]);

        assert_eq!(removed, 2);
        assert!(store.contains(FilterMode::Scenes, "1"));
        assert!(store.contains(FilterMode::Scenes, "3"));
        assert!(!store.contains(FilterMode::Scenes, "2"));
        assert!(!store.contains(FilterMode::Images, "1"));
        assert_eq!(store.item_count(), 2);
    }
}
