//! Per-query set of filter values the user has removed

use std::collections::BTreeMap;

use tracing::debug;

use super::types::{AppliedFilters, FilterCategory, FilterGroup};

/// Values excluded from the current query's results, per category
///
/// Values keep insertion order and never repeat. The store is cleared when a
/// new manual query starts and survives pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExclusionStore {
    excluded: BTreeMap<FilterCategory, Vec<String>>,
}

impl FilterExclusionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exclusion. Returns `false` if the value was already excluded.
    pub fn exclude(&mut self, category: FilterCategory, value: impl Into<String>) -> bool {
        let value = value.into();
        let values = self.excluded.entry(category).or_default();
        if values.contains(&value) {
            debug!(category = %category, value = %value, "Filter value already excluded");
            return false;
        }
        values.push(value);
        true
    }

    #[must_use]
    pub fn is_excluded(&self, category: FilterCategory, value: &str) -> bool {
        self.excluded
            .get(&category)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Drop every exclusion.
    pub fn reset_all(&mut self) {
        self.excluded.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.excluded.values().all(Vec::is_empty)
    }

    /// Excluded values for one category, in the order they were added
    #[must_use]
    pub fn values(&self, category: FilterCategory) -> &[String] {
        self.excluded
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Remove excluded values from backend-reported filters.
    ///
    /// Matching is by exact string. Categories left with no values are
    /// dropped, and unknown categories pass through untouched.
    #[must_use]
    pub fn filter_visible(&self, applied: &AppliedFilters) -> AppliedFilters {
        applied
            .groups()
            .iter()
            .filter_map(|group| {
                let values: Vec<String> = match group.known_category() {
                    Some(category) => group
                        .values
                        .iter()
                        .filter(|value| !self.is_excluded(category, value))
                        .cloned()
                        .collect(),
                    None => group.values.clone(),
                };
                (!values.is_empty()).then(|| FilterGroup::new(group.category.clone(), values))
            })
            .collect()
    }

    /// Exclusions as the JSON object sent in the `excludedFilters` query parameter
    ///
    /// Returns `None` when nothing is excluded so the parameter is omitted.
    pub fn to_query_json(&self) -> Result<Option<String>, serde_json::Error> {
        if self.is_empty() {
            return Ok(None);
        }
        let wire: BTreeMap<&'static str, &[String]> = self
            .excluded
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(category, values)| (category.as_str(), values.as_slice()))
            .collect();
        serde_json::to_string(&wire).map(Some)
    }
}
