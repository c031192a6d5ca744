//! Scene and image records

use super::FilterMode;
use serde::Serialize;
use serde_json::{Map, Value};

/// A scene or image record from upstream
///
/// `attributes` keeps every field exactly as returned, in upstream order
/// (including `id`). Items are refreshed in place on every fetch; there is
/// no versioning, the latest fetch wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: String,
    pub mode: FilterMode,
    pub attributes: Map<String, Value>,
}

impl Item {
    /// Build an item from a GraphQL result object
    ///
    /// Returns `None` unless the value is an object with a string or numeric `id`.
    pub fn from_json(mode: FilterMode, value: Value) -> Option<Self> {
        let Value::Object(attributes) = value else {
            return None;
        };

        let id = match attributes.get("id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        Some(Self {
            id,
            mode,
            attributes,
        })
    }

    /// Item title, if set
    pub fn title(&self) -> Option<&str> {
        self.attributes
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Path of the primary file
    ///
    /// Scenes list their files under `files`, images under `visual_files`.
    pub fn primary_path(&self) -> Option<&str> {
        let files_key = match self.mode {
            FilterMode::Scenes => "files",
            FilterMode::Images => "visual_files",
        };

        self.attributes
            .get(files_key)
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .and_then(|file| file.get("path"))
            .and_then(Value::as_str)
    }
}
