//! Incremental view synchronization
//!
//! Each view is fetched one of three ways:
//! - id override: full records for the configured id list
//! - cold: full records by criteria, when nothing of the view's mode has been
//!   fetched yet in this pass
//! - warm: ids by criteria, then full records only for ids not already
//!   fetched in this pass
//!
//! The fetch result is validated completely before anything is written, so a
//! failed view leaves both the store and its previous membership intact.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::criteria;
use super::item_store::ItemStore;
use super::upstream::{ItemQuery, Upstream};
use crate::error::SyncError;
use crate::models::{FetchPath, Item, MemberChange, View, ViewDiff};

const NONE_MARKER: &str = "(none)";

/// Fetch result awaiting commit
struct Fetched {
    path: FetchPath,
    /// New membership, in upstream order
    ids: Vec<String>,
    /// Full records to write into the store
    items: Vec<Item>,
}

/// Per-view fetch and reconcile
pub struct ViewSynchronizer {
    upstream: Arc<dyn Upstream>,
}

impl ViewSynchronizer {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Bring one view's membership up to date
    pub async fn sync_view(&self, view: &View, store: &mut ItemStore) -> Result<ViewDiff, SyncError> {
        let fetched = self.fetch(view, store).await?;

        let fetched_count = fetched.items.len();
        for item in fetched.items {
            store.upsert(item);
        }

        let changes = reconcile(store.membership(&view.key), &fetched.ids);
        store.set_membership(&view.key, fetched.ids);

        let diff = ViewDiff {
            view_key: view.key.clone(),
            path: fetched.path,
            fetched: fetched_count,
            changes,
        };

        info!(
            view = %view.key,
            path = ?diff.path,
            fetched = diff.fetched,
            members = store.membership(&view.key).len(),
            inserted = diff.inserted().len(),
            moved = diff.moved().len(),
            removed = diff.removed().len(),
            "View synchronized"
        );

        Ok(diff)
    }

    async fn fetch(&self, view: &View, store: &ItemStore) -> Result<Fetched, SyncError> {
        if !view.id_override.is_empty() {
            return self.fetch_override(view).await;
        }

        let query = criteria::translate(&view.filter).map_err(|source| SyncError::Criteria {
            view: view.key.clone(),
            source,
        })?;

        if store.is_empty_for(view.mode) {
            let items = self.upstream.fetch_items(view.mode, &query).await?;
            debug!(view = %view.key, count = items.len(), "Cold fetch");
            return Ok(Fetched {
                path: FetchPath::Cold,
                ids: items.iter().map(|i| i.id.clone()).collect(),
                items,
            });
        }

        self.fetch_warm(view, &query, store).await
    }

    /// Full records for the override list, in override order
    ///
    /// Ids upstream does not return are left out of the membership.
    async fn fetch_override(&self, view: &View) -> Result<Fetched, SyncError> {
        let mut by_id: HashMap<String, Item> = self
            .upstream
            .fetch_items_by_ids(view.mode, &view.id_override)
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let mut ids = Vec::with_capacity(view.id_override.len());
        let mut items = Vec::with_capacity(view.id_override.len());
        for id in &view.id_override {
            match by_id.remove(id) {
                Some(item) => {
                    ids.push(id.clone());
                    items.push(item);
                }
                None => warn!(view = %view.key, id = %id, "Override id not returned by upstream"),
            }
        }

        Ok(Fetched {
            path: FetchPath::IdOverride,
            ids,
            items,
        })
    }

    async fn fetch_warm(
        &self,
        view: &View,
        query: &ItemQuery,
        store: &ItemStore,
    ) -> Result<Fetched, SyncError> {
        let ids = self.upstream.fetch_item_ids(view.mode, query).await?;

        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| !store.is_fresh(view.mode, id))
            .cloned()
            .collect();

        debug!(
            view = %view.key,
            total = ids.len(),
            unknown = unknown.len(),
            "Warm fetch"
        );

        if unknown.is_empty() {
            return Ok(Fetched {
                path: FetchPath::Warm,
                ids,
                items: Vec::new(),
            });
        }

        let items = self.upstream.fetch_items_by_ids(view.mode, &unknown).await?;
        check_order(&view.key, &unknown, &items)?;

        Ok(Fetched {
            path: FetchPath::Warm,
            ids,
            items,
        })
    }
}

/// Records fetched by id must come back exactly in request order
fn check_order(view_key: &str, requested: &[String], returned: &[Item]) -> Result<(), SyncError> {
    let len = requested.len().max(returned.len());

    for position in 0..len {
        let expected = requested.get(position).map(String::as_str);
        let found = returned.get(position).map(|item| item.id.as_str());

        if expected != found {
            let err = SyncError::OrderingViolation {
                view: view_key.to_string(),
                position,
                expected: expected.unwrap_or(NONE_MARKER).to_string(),
                found: found.unwrap_or(NONE_MARKER).to_string(),
            };
            warn!(view = %view_key, error = %err, "Rejected out-of-order id fetch");
            return Err(err);
        }
    }

    Ok(())
}

/// Positional diff from `previous` to `next`
///
/// Walks `next` against a working copy of `previous`: an id already at its
/// position is refreshed, an id found later is moved up, anything else is
/// inserted. Whatever remains past the end of `next` is removed.
pub fn reconcile(previous: &[String], next: &[String]) -> Vec<MemberChange> {
    let mut working = previous.to_vec();
    let mut changes = Vec::with_capacity(next.len());

    for (i, id) in next.iter().enumerate() {
        if working.get(i) == Some(id) {
            changes.push(MemberChange::Refreshed { id: id.clone(), at: i });
            continue;
        }

        let later = working
            .get(i..)
            .and_then(|rest| rest.iter().position(|w| w == id))
            .map(|offset| i + offset);

        match later {
            Some(from) => {
                let moved = working.remove(from);
                working.insert(i, moved);
                changes.push(MemberChange::Moved {
                    id: id.clone(),
                    from,
                    to: i,
                });
            }
            None => {
                working.insert(i.min(working.len()), id.clone());
                changes.push(MemberChange::Inserted { id: id.clone(), at: i });
            }
        }
    }

    if working.len() > next.len() {
        changes.extend(
            working
                .drain(next.len()..)
                .map(|id| MemberChange::Removed { id }),
        );
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterMode;
    use serde_json::json;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn item(id: &str) -> Item {
        Item::from_json(FilterMode::Scenes, json!({ "id": id })).unwrap()
    }

    #[test]
    fn test_reconcile_from_empty() {
        let changes = reconcile(&[], &ids(&["A", "B"]));
        assert_eq!(
            changes,
            vec![
                MemberChange::Inserted { id: "A".to_string(), at: 0 },
                MemberChange::Inserted { id: "B".to_string(), at: 1 },
            ]
        );
    }

    #[test]
    fn test_reconcile_reorder_insert_remove() {
        let changes = reconcile(&ids(&["A", "B", "C"]), &ids(&["B", "D", "A"]));
        assert_eq!(
            changes,
            vec![
                MemberChange::Moved { id: "B".to_string(), from: 1, to: 0 },
                MemberChange::Inserted { id: "D".to_string(), at: 1 },
                MemberChange::Refreshed { id: "A".to_string(), at: 2 },
                MemberChange::Removed { id: "C".to_string() },
            ]
        );
    }

    #[test]
    fn test_reconcile_unchanged() {
        let list = ids(&["A", "B", "C"]);
        let changes = reconcile(&list, &list);
        assert!(changes.iter().all(|c| matches!(c, MemberChange::Refreshed { .. })));
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn test_reconcile_to_empty() {
        let changes = reconcile(&ids(&["A", "B"]), &[]);
        assert_eq!(
            changes,
            vec![
                MemberChange::Removed { id: "A".to_string() },
                MemberChange::Removed { id: "B".to_string() },
            ]
        );
    }

    #[test]
    fn test_check_order_accepts_request_order() {
        assert!(check_order("s:1", &ids(&["X", "Y"]), &[item("X"), item("Y")]).is_ok());
    }

    #[test]
    fn test_check_order_rejects_swapped() {
        let err = check_order("s:1", &ids(&["X", "Y"]), &[item("Y"), item("X")]).unwrap_err();
        match err {
            SyncError::OrderingViolation { view, position, expected, found } => {
                assert_eq!(view, "s:1");
                assert_eq!(position, 0);
                assert_eq!(expected, "X");
                assert_eq!(found, "Y");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_order_rejects_missing_and_extra() {
        let missing = check_order("s:1", &ids(&["X", "Y"]), &[item("X")]).unwrap_err();
        assert!(matches!(
            missing,
            SyncError::OrderingViolation { position: 1, ref found, .. } if found == NONE_MARKER
        ));

        let extra = check_order("s:1", &ids(&["X"]), &[item("X"), item("Z")]).unwrap_err();
        assert!(matches!(
            extra,
            SyncError::OrderingViolation { position: 1, ref expected, .. } if expected == NONE_MARKER
        ));
    }
}
