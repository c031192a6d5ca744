//! Filter catalog
//!
//! Classifies saved filters by name prefix (`VR | Favorites` is active,
//! `Favorites` is not) and keeps the active views ordered by filter id.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use tracing::{debug, info, warn};
use vroom_common::config::CatalogConfig;
use vroom_common::{Error, Result};

use super::upstream::{Upstream, UpstreamError};
use crate::models::{FilterMode, LoadReport, SavedFilter, View};

/// Classification of one saved filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClass {
    Active { display_name: String },
    Ignored,
}

/// Ordered set of active views
pub struct ViewCatalog {
    prefix_pattern: Regex,
    ignored: HashSet<String>,
    modes: Vec<FilterMode>,
    id_overrides: BTreeMap<String, Vec<String>>,
    views: Vec<View>,
}

impl ViewCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        if config.active_prefixes.is_empty() {
            return Err(Error::Config("catalog.active_prefixes is empty".to_string()));
        }

        let alternatives: Vec<String> = config
            .active_prefixes
            .iter()
            .map(|p| regex::escape(p.trim()))
            .collect();
        let prefix_pattern = Regex::new(&format!(r"(?i)^({})\s*\|\s*(.+)$", alternatives.join("|")))
            .map_err(|e| Error::Config(format!("Invalid active prefix: {}", e)))?;

        let modes = config
            .modes
            .iter()
            .map(|m| m.parse())
            .collect::<Result<Vec<FilterMode>>>()?;

        Ok(Self {
            prefix_pattern,
            ignored: config.ignored_filters.iter().cloned().collect(),
            modes,
            id_overrides: config.id_overrides.clone(),
            views: Vec::new(),
        })
    }

    /// Active views in ascending filter-id order
    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn get(&self, key: &str) -> Option<&View> {
        self.views.iter().find(|v| v.key == key)
    }

    /// Match a filter name against the active prefixes
    pub fn classify(&self, filter: &SavedFilter) -> FilterClass {
        let display_name = match self.prefix_pattern.captures(&filter.name) {
            Some(caps) => caps[2].trim_end().to_string(),
            None => return FilterClass::Ignored,
        };
        if display_name.is_empty() {
            return FilterClass::Ignored;
        }
        FilterClass::Active { display_name }
    }

    /// Fetch all saved filters and update the view list
    ///
    /// Views already present keep their display name and position but pick up
    /// the latest filter criteria. Views whose filter is absent from this load
    /// are dropped. Nothing changes if any fetch fails.
    pub async fn load(&mut self, upstream: &dyn Upstream) -> std::result::Result<LoadReport, UpstreamError> {
        let mut filters = Vec::new();
        for mode in &self.modes {
            filters.extend(upstream.fetch_filters(*mode).await?);
        }

        let mut report = LoadReport {
            total_filters: filters.len(),
            ..LoadReport::default()
        };
        let mut seen = HashSet::new();

        for filter in filters {
            let display_name = match self.classify(&filter) {
                FilterClass::Active { display_name } => display_name,
                FilterClass::Ignored => {
                    report.ignored += 1;
                    continue;
                }
            };

            if self.ignored.contains(&filter.name) {
                debug!(name = %filter.name, "Skipping ignored filter");
                report.ignored += 1;
                continue;
            }

            let key = View::key_for(filter.mode, filter.id);
            if !seen.insert(key.clone()) {
                warn!(view = %key, name = %filter.name, "Duplicate view key, keeping first");
                report.duplicates.push(key);
                continue;
            }

            if let Some(existing) = self.views.iter_mut().find(|v| v.key == key) {
                if existing.filter != filter {
                    debug!(view = %key, "Filter changed upstream, refreshing criteria");
                    existing.filter = filter;
                    report.updated.push(key);
                }
                continue;
            }

            let mut view = View::new(filter, display_name);
            if let Some(ids) = self.id_overrides.get(&key) {
                view = view.with_id_override(ids.clone());
            }
            info!(view = %key, name = %view.display_name, "Added view");
            self.insert_ordered(view);
            report.added.push(key);
        }

        let before: Vec<String> = self.views.iter().map(|v| v.key.clone()).collect();
        self.views.retain(|v| seen.contains(&v.key));
        for key in before.into_iter().filter(|k| !seen.contains(k)) {
            info!(view = %key, "Dropped view, filter no longer present");
            report.dropped.push(key);
        }

        Ok(report)
    }

    /// Insert before the first view with a larger filter id, else append
    fn insert_ordered(&mut self, view: View) {
        let position = self
            .views
            .iter()
            .position(|existing| existing.sort_rank > view.sort_rank)
            .unwrap_or(self.views.len());
        self.views.insert(position, view);
    }
}
