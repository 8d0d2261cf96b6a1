//! Type-safe builder for `ClientConfig` using the typestate pattern
//!
//! The base URL is the only required field; `build()` is not callable until
//! it has been set.

use anyhow::{Result, anyhow, bail};
use std::marker::PhantomData;
use url::Url;

use super::types::ClientConfig;
use crate::highlight::HighlightMarker;
use crate::utils::{
    CLIENT_USER_AGENT, CONFIG_FETCH_TIMEOUT_SECS, CONFIG_PATH, CONNECT_TIMEOUT_SECS,
    FALLBACK_PAGE_SIZE, ONE_SHOT_SEARCH_PATH, STREAM_SEARCH_PATH,
};

// Type states for the builder
pub struct WithBaseUrl;

pub struct ClientConfigBuilder<State = ()> {
    pub(crate) base_url: Option<String>,
    pub(crate) config_path: String,
    pub(crate) stream_path: String,
    pub(crate) search_path: String,
    pub(crate) fallback_page_size: u32,
    pub(crate) highlight_marker: HighlightMarker,
    pub(crate) config_timeout_secs: u64,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) user_agent: String,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ClientConfigBuilder<()> {
    fn default() -> Self {
        Self {
            base_url: None,
            config_path: CONFIG_PATH.to_string(),
            stream_path: STREAM_SEARCH_PATH.to_string(),
            search_path: ONE_SHOT_SEARCH_PATH.to_string(),
            fallback_page_size: FALLBACK_PAGE_SIZE,
            highlight_marker: HighlightMarker::default(),
            config_timeout_secs: CONFIG_FETCH_TIMEOUT_SECS,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            user_agent: CLIENT_USER_AGENT.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl ClientConfig {
    /// Create a builder for configuring a `ClientConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ClientConfigBuilder<()> {
        ClientConfigBuilder::default()
    }
}

impl ClientConfigBuilder<()> {
    /// Set the backend origin. A missing scheme defaults to `http://`.
    pub fn base_url(self, url: impl Into<String>) -> ClientConfigBuilder<WithBaseUrl> {
        let url_string = url.into();
        let normalized_url =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("http://{url_string}")
            };

        ClientConfigBuilder {
            base_url: Some(normalized_url),
            config_path: self.config_path,
            stream_path: self.stream_path,
            search_path: self.search_path,
            fallback_page_size: self.fallback_page_size,
            highlight_marker: self.highlight_marker,
            config_timeout_secs: self.config_timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
            user_agent: self.user_agent,
            _phantom: PhantomData,
        }
    }
}

// Build method only available once the base URL is set
impl ClientConfigBuilder<WithBaseUrl> {
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| anyhow!("base_url is required"))?;
        let parsed =
            Url::parse(&base_url).map_err(|e| anyhow!("Invalid base URL '{base_url}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Base URL must use http or https: {base_url}");
        }
        if parsed.cannot_be_a_base() {
            bail!("Base URL cannot carry endpoint paths: {base_url}");
        }

        for (name, path) in [
            ("config_path", &self.config_path),
            ("stream_path", &self.stream_path),
            ("search_path", &self.search_path),
        ] {
            if !path.starts_with('/') {
                bail!("{name} must start with '/': {path}");
            }
        }

        if self.fallback_page_size == 0 {
            bail!("fallback_page_size must be at least 1");
        }
        if self.highlight_marker.open.is_empty() || self.highlight_marker.close.is_empty() {
            bail!("highlight marker delimiters must not be empty");
        }

        Ok(ClientConfig {
            base_url: parsed.to_string(),
            config_path: self.config_path,
            stream_path: self.stream_path,
            search_path: self.search_path,
            fallback_page_size: self.fallback_page_size,
            highlight_marker: self.highlight_marker,
            config_timeout_secs: self.config_timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
            user_agent: self.user_agent,
        })
    }
}

// Optional settings, available in any state
impl<State> ClientConfigBuilder<State> {
    #[must_use]
    pub fn config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = path.into();
        self
    }

    #[must_use]
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    #[must_use]
    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.search_path = path.into();
        self
    }

    /// Page size used until, or instead of, the backend's `defaultPageSize`
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_search_session::config::ClientConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = ClientConfig::builder()
    ///     .base_url("http://localhost:8080")
    ///     .fallback_page_size(25)
    ///     .build()?;
    /// assert_eq!(config.fallback_page_size(), 25);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn fallback_page_size(mut self, size: u32) -> Self {
        self.fallback_page_size = size;
        self
    }

    #[must_use]
    pub fn highlight_marker(mut self, marker: HighlightMarker) -> Self {
        self.highlight_marker = marker;
        self
    }

    #[must_use]
    pub fn config_timeout_secs(mut self, secs: u64) -> Self {
        self.config_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}
