//! Getter methods for `ClientConfig`

use std::time::Duration;

use url::Url;

use super::types::ClientConfig;
use crate::highlight::HighlightMarker;

impl ClientConfig {
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    #[must_use]
    pub fn stream_path(&self) -> &str {
        &self.stream_path
    }

    #[must_use]
    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    #[must_use]
    pub fn fallback_page_size(&self) -> u32 {
        self.fallback_page_size
    }

    #[must_use]
    pub fn highlight_marker(&self) -> &HighlightMarker {
        &self.highlight_marker
    }

    #[must_use]
    pub fn config_timeout(&self) -> Duration {
        Duration::from_secs(self.config_timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Resolve an absolute endpoint path against the base URL.
    ///
    /// Absolute paths replace any path on the base URL, so endpoints always
    /// live at the origin root.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(path)
    }
}
