//! Saved filters as stored upstream

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kind of object a saved filter selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterMode {
    Scenes,
    Images,
}

impl FilterMode {
    /// Upstream enum value (`SCENES`, `IMAGES`)
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Scenes => "SCENES",
            FilterMode::Images => "IMAGES",
        }
    }

    /// Single-letter prefix used in view keys
    pub fn letter(&self) -> char {
        match self {
            FilterMode::Scenes => 's',
            FilterMode::Images => 'i',
        }
    }

    /// Path segment used in projected item references
    pub fn path_segment(&self) -> &'static str {
        match self {
            FilterMode::Scenes => "scene",
            FilterMode::Images => "image",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = vroom_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCENES" => Ok(FilterMode::Scenes),
            "IMAGES" => Ok(FilterMode::Images),
            other => Err(vroom_common::Error::InvalidInput(format!(
                "Unsupported filter mode: {}",
                other
            ))),
        }
    }
}

/// A saved filter as returned by `findSavedFilters`
///
/// `find_filter` and `object_filter` are kept opaque here; they are only
/// interpreted when translated into a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    /// Numeric filter id (GraphQL sends it as a string)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    pub mode: FilterMode,
    pub name: String,
    /// Sort, direction, free-text query and paging
    #[serde(default)]
    pub find_filter: Option<Value>,
    /// Structured criteria
    #[serde(default)]
    pub object_filter: Option<Value>,
    #[serde(default)]
    pub ui_options: Option<Value>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid filter id: {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_string_id() {
        let filter: SavedFilter = serde_json::from_value(json!({
            "id": "42",
            "mode": "SCENES",
            "name": "VR | Recent",
            "find_filter": {"sort": "date", "direction": "DESC"},
            "object_filter": {},
            "ui_options": null,
        }))
        .unwrap();

        assert_eq!(filter.id, 42);
        assert_eq!(filter.mode, FilterMode::Scenes);
        assert_eq!(filter.name, "VR | Recent");
    }

    #[test]
    fn test_deserialize_numeric_id_and_missing_criteria() {
        let filter: SavedFilter =
            serde_json::from_value(json!({"id": 7, "mode": "IMAGES", "name": "x"})).unwrap();

        assert_eq!(filter.id, 7);
        assert!(filter.find_filter.is_none());
        assert!(filter.object_filter.is_none());
    }

    #[test]
    fn test_reject_non_numeric_id() {
        let result: Result<SavedFilter, _> =
            serde_json::from_value(json!({"id": "abc", "mode": "SCENES", "name": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_parsing_and_letters() {
        assert_eq!("scenes".parse::<FilterMode>().unwrap(), FilterMode::Scenes);
        assert_eq!(" IMAGES ".parse::<FilterMode>().unwrap(), FilterMode::Images);
        assert!("PERFORMERS".parse::<FilterMode>().is_err());
        assert_eq!(FilterMode::Scenes.letter(), 's');
        assert_eq!(FilterMode::Images.letter(), 'i');
    }
}
