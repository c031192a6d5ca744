//! Library projection
//!
//! Pure: turns the catalog's views and the store into the served structure.

use tracing::trace;

use super::item_store::ItemStore;
use crate::classify::IdentityClassifier;
use crate::models::{ItemRef, Library, LibrarySection, View};

pub struct LibraryProjector {
    classifier: IdentityClassifier,
}

impl LibraryProjector {
    pub fn new(classifier: IdentityClassifier) -> Self {
        Self { classifier }
    }

    /// One section per view, in catalog order
    pub fn project(&self, views: &[View], store: &ItemStore) -> Library {
        let sections = views
            .iter()
            .map(|view| LibrarySection {
                view_key: view.key.clone(),
                name: view.display_name.clone(),
                items: store
                    .membership(&view.key)
                    .iter()
                    .map(|id| self.item_ref(view, id, store))
                    .collect(),
            })
            .collect();

        Library { sections }
    }

    fn item_ref(&self, view: &View, id: &str, store: &ItemStore) -> ItemRef {
        let identity = store
            .get(view.mode, id)
            .and_then(|item| item.primary_path())
            .and_then(|path| match self.classifier.classify(path) {
                Ok(identity) => identity,
                Err(e) => {
                    trace!(view = %view.key, id, error = %e, "Unclassifiable path");
                    None
                }
            });

        ItemRef {
            id: id.to_string(),
            mode: view.mode,
            path: format!("{}/{}", view.mode.path_segment(), id),
            identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterMode, Item, SavedFilter};
    use serde_json::json;

    fn view(id: u64, mode: FilterMode, name: &str) -> View {
        View::new(
            SavedFilter {
                id,
                mode,
                name: format!("VR | {}", name),
                find_filter: None,
                object_filter: None,
                ui_options: None,
            },
            name,
        )
    }

    fn projector() -> LibraryProjector {
        LibraryProjector::new(IdentityClassifier::new(&["mp4"]).unwrap())
    }

    #[test]
    fn test_sections_follow_views_and_membership() {
        let mut store = ItemStore::new();
        store.upsert(
            Item::from_json(
                FilterMode::Scenes,
                json!({"id": "2", "files": [{"path": "/vr/cafr333.mp4"}]}),
            )
            .unwrap(),
        );
        store.upsert(Item::from_json(FilterMode::Scenes, json!({"id": "1"})).unwrap());
        store.set_membership("s:5", vec!["2".to_string(), "1".to_string()]);

        let views = vec![view(5, FilterMode::Scenes, "Recent"), view(9, FilterMode::Images, "Pics")];
        let library = projector().project(&views, &store);

        assert_eq!(library.sections.len(), 2);
        assert_eq!(library.sections[0].name, "Recent");
        let paths: Vec<&str> = library.sections[0].items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["scene/2", "scene/1"]);
        assert_eq!(
            library.sections[0].items[0].identity.as_ref().map(|i| i.studio.as_str()),
            Some("CAFR")
        );
        assert!(library.sections[0].items[1].identity.is_none());
        assert!(library.sections[1].items.is_empty());
        assert_eq!(library.item_count(), 2);
    }

    #[test]
    fn test_projection_is_pure() {
        let mut store = ItemStore::new();
        store.upsert(Item::from_json(FilterMode::Images, json!({"id": "3"})).unwrap());
        store.set_membership("i:1", vec!["3".to_string()]);
        let views = vec![view(1, FilterMode::Images, "Pics")];

        let p = projector();
        let first = p.project(&views, &store);
        let second = p.project(&views, &store);
        assert_eq!(first, second);
        assert_eq!(first.sections[0].items[0].path, "image/3");
    }
}
