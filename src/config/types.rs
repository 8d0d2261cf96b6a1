//! Core configuration types for the search session client

use serde::{Deserialize, Serialize};

use crate::highlight::HighlightMarker;

/// Client-side configuration for talking to a search backend
///
/// Built with [`ClientConfig::builder`]. Everything except the base URL has
/// a default from `utils::constants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend origin, e.g. `http://localhost:8080/`.
    ///
    /// **INVARIANT:** parses as an absolute http(s) URL (checked in builder).
    pub(crate) base_url: String,
    pub(crate) config_path: String,
    pub(crate) stream_path: String,
    pub(crate) search_path: String,

    /// Page size used when the backend never reports `defaultPageSize`
    pub(crate) fallback_page_size: u32,

    pub(crate) highlight_marker: HighlightMarker,

    /// Bound on the one-time config fetch. Streams have no local timeout.
    pub(crate) config_timeout_secs: u64,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) user_agent: String,
}
