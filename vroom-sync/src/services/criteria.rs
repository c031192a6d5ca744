//! Saved-filter criteria translation
//!
//! Saved filters store their criteria in the shape the upstream UI edits
//! (`{modifier, value: {items, excluded, depth}}`), which the query API does not
//! accept as-is. Translation rewrites the known clause shapes and passes every
//! other clause through untouched. A clause that cannot be rewritten faithfully
//! is an error: dropping it would silently widen the result set.

use serde_json::{json, Map, Value};
use thiserror::Error;

use super::upstream::ItemQuery;
use crate::models::SavedFilter;

/// Criteria translation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("clause {clause}: unsupported modifier {modifier:?}")]
    UnsupportedModifier { clause: String, modifier: String },

    #[error("clause {clause}: missing {field}")]
    MissingField { clause: String, field: String },

    #[error("clause {clause}: {reason}")]
    Invalid { clause: String, reason: String },

    #[error("{0} is not a JSON object")]
    NotAnObject(String),
}

/// Hierarchical clauses rewritten to `{modifier, depth, value, excludes}`
const HIERARCHICAL_CLAUSES: [&str; 2] = ["tags", "performer_tags"];

/// Boolean clauses stored as `{modifier: EQUALS, value}`
const EQUALS_CLAUSES: [&str; 2] = ["is_missing", "has_markers"];

/// Numeric clauses whose value is wrapped as `{value: N}`
const WRAPPED_NUMBER_CLAUSES: [&str; 4] = ["file_count", "performer_count", "rating100", "o_counter"];

/// Translate a saved filter into a query for the whole result set
pub fn translate(filter: &SavedFilter) -> Result<ItemQuery, CriteriaError> {
    Ok(ItemQuery {
        find_filter: find_filter(filter.find_filter.as_ref())?,
        object_filter: object_filter(filter.object_filter.as_ref())?,
    })
}

/// Copy the find filter, forcing a single unbounded page
pub fn find_filter(saved: Option<&Value>) -> Result<Value, CriteriaError> {
    let mut find = match saved {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(CriteriaError::NotAnObject("find_filter".to_string())),
    };

    find.insert("page".to_string(), json!(1));
    find.insert("per_page".to_string(), json!(-1));
    Ok(Value::Object(find))
}

/// Rewrite the structured criteria into query-API shape
pub fn object_filter(saved: Option<&Value>) -> Result<Value, CriteriaError> {
    let mut flt = match saved {
        None | Some(Value::Null) => return Ok(Value::Object(Map::new())),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(CriteriaError::NotAnObject("object_filter".to_string())),
    };

    for clause in HIERARCHICAL_CLAUSES {
        if let Some(original) = flt.get(clause) {
            let rewritten = hierarchical(clause, original)?;
            flt.insert(clause.to_string(), rewritten);
        }
    }

    if let Some(original) = flt.get("studios") {
        let rewritten = studios(original)?;
        flt.insert("studios".to_string(), rewritten);
    }

    for clause in EQUALS_CLAUSES {
        if let Some(original @ Value::Object(_)) = flt.get(clause) {
            let value = equals_value(clause, original)?.clone();
            flt.insert(clause.to_string(), value);
        }
    }

    if let Some(original) = flt.get("performer_favorite") {
        let value = equals_value("performer_favorite", original)?;
        let favorite = matches!(value, Value::Bool(true)) || value.as_str() == Some("true");
        flt.insert("performer_favorite".to_string(), Value::Bool(favorite));
    }

    for clause in WRAPPED_NUMBER_CLAUSES {
        if let Some(Value::Object(criterion)) = flt.get_mut(clause) {
            let inner = criterion
                .get("value")
                .and_then(|v| v.get("value"))
                .cloned();
            if let Some(inner) = inner {
                criterion.insert("value".to_string(), inner);
            }
        }
    }

    Ok(Value::Object(flt))
}

fn hierarchical(clause: &str, original: &Value) -> Result<Value, CriteriaError> {
    let modifier = field(clause, original, "modifier")?.clone();
    let value = field(clause, original, "value")?;
    let depth = field(clause, value, "depth")?.clone();

    let mut rewritten = Map::new();
    rewritten.insert("depth".to_string(), depth);
    rewritten.insert("modifier".to_string(), modifier);
    if let Some(items) = value.get("items") {
        rewritten.insert("value".to_string(), ids_of(clause, items)?);
    }
    if let Some(excluded) = value.get("excluded") {
        rewritten.insert("excludes".to_string(), ids_of(clause, excluded)?);
    }
    Ok(Value::Object(rewritten))
}

fn studios(original: &Value) -> Result<Value, CriteriaError> {
    let clause = "studios";

    let modifier = field(clause, original, "modifier")?;
    if modifier.as_str() != Some("INCLUDES") {
        return Err(CriteriaError::UnsupportedModifier {
            clause: clause.to_string(),
            modifier: modifier_name(modifier),
        });
    }

    let value = original
        .get("value")
        .filter(|v| v.is_object())
        .ok_or_else(|| missing(clause, "value"))?;

    let depth = value.get("depth").ok_or_else(|| missing(clause, "depth"))?;
    if depth.as_i64() != Some(0) {
        return Err(CriteriaError::Invalid {
            clause: clause.to_string(),
            reason: format!("depth must be 0, got {}", depth),
        });
    }

    match value.get("excluded") {
        Some(Value::Array(excluded)) if excluded.is_empty() => {}
        _ => {
            return Err(CriteriaError::Invalid {
                clause: clause.to_string(),
                reason: "excluded must be an empty list".to_string(),
            })
        }
    }

    let items = value.get("items").ok_or_else(|| missing(clause, "items"))?;

    Ok(json!({
        "depth": depth,
        "modifier": modifier,
        "excludes": [],
        "value": ids_of(clause, items)?,
    }))
}

/// Unwrap `{modifier: EQUALS, value}` to `value`
fn equals_value<'a>(clause: &str, original: &'a Value) -> Result<&'a Value, CriteriaError> {
    let modifier = field(clause, original, "modifier")?;
    if modifier.as_str() != Some("EQUALS") {
        return Err(CriteriaError::UnsupportedModifier {
            clause: clause.to_string(),
            modifier: modifier_name(modifier),
        });
    }
    field(clause, original, "value")
}

fn ids_of(clause: &str, items: &Value) -> Result<Value, CriteriaError> {
    let items = items.as_array().ok_or_else(|| CriteriaError::Invalid {
        clause: clause.to_string(),
        reason: "item list is not an array".to_string(),
    })?;

    items
        .iter()
        .map(|item| item.get("id").cloned().ok_or_else(|| missing(clause, "item id")))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn field<'a>(clause: &str, value: &'a Value, name: &str) -> Result<&'a Value, CriteriaError> {
    value.get(name).ok_or_else(|| missing(clause, name))
}

fn missing(clause: &str, field: &str) -> CriteriaError {
    CriteriaError::MissingField {
        clause: clause.to_string(),
        field: field.to_string(),
    }
}

fn modifier_name(modifier: &Value) -> String {
    modifier
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| modifier.to_string())
}
