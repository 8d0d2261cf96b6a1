//! Request and configuration types exchanged with the backend

use serde::{Deserialize, Serialize};

/// One page of one query, as sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub query: String,
    /// Zero-based
    pub page: u32,
    pub size: u32,
    /// JSON snapshot of the exclusions at request time, omitted when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_filters: Option<String>,
}

impl PageRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, page: u32, size: u32) -> Self {
        Self {
            query: query.into(),
            page,
            size,
            excluded_filters: None,
        }
    }

    #[must_use]
    pub fn with_excluded_filters(mut self, json: Option<String>) -> Self {
        self.excluded_filters = json;
        self
    }

    /// Query pairs in the order the backend documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.query.clone()),
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ];
        if let Some(json) = &self.excluded_filters {
            pairs.push(("excludedFilters", json.clone()));
        }
        pairs
    }
}

/// Response of the remote configuration endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(default)]
    pub default_page_size: Option<u32>,
    /// Highest result offset the backend will serve
    #[serde(default)]
    pub max_results_limit: Option<u32>,
}
