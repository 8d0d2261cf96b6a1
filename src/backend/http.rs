//! HTTP implementation of the backend boundary
//!
//! Three endpoints, all `GET`:
//! - config: `{ defaultPageSize, maxResultsLimit }`
//! - stream: `text/event-stream` of `exact`, then `complete` (or `error`) batches
//! - one-shot: a single JSON batch without `resultType`

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};
use url::Url;

use super::SearchBackend;
use super::types::{PageRequest, RemoteConfig};
use crate::config::ClientConfig;
use crate::stream::{
    MessageStream, ResultBatch, ResultKind, SearchError, SearchResult, decode_event_stream,
};

/// Search backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpBackend {
    /// Build the HTTP client from the configuration.
    ///
    /// Only a connect timeout is set on the client. Streams may legitimately
    /// stay open for as long as the backend takes.
    pub fn new(config: ClientConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent())
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> SearchResult<Url> {
        self.config
            .endpoint(path)
            .map_err(|e| SearchError::Transport(format!("invalid endpoint '{path}': {e}")))
    }

    /// URL for a page request against one of the search endpoints
    pub fn search_url(&self, path: &str, request: &PageRequest) -> SearchResult<Url> {
        let mut url = self.endpoint(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in request.query_pairs() {
                pairs.append_pair(name, &value);
            }
        }
        Ok(url)
    }

    /// Fetch the remote configuration once.
    ///
    /// Every failure, including a non-2xx status or an unparseable body,
    /// comes back as `ConfigUnavailable`.
    pub async fn fetch_remote_config(&self) -> SearchResult<RemoteConfig> {
        let url = self
            .endpoint(self.config.config_path())
            .map_err(|e| SearchError::ConfigUnavailable(e.to_string()))?;

        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.config_timeout())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SearchError::ConfigUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::ConfigUnavailable(format!(
                "config request failed with status: {}",
                response.status()
            )));
        }

        let config: RemoteConfig = response
            .json()
            .await
            .map_err(|e| SearchError::ConfigUnavailable(e.to_string()))?;
        info!(
            url = %url,
            default_page_size = ?config.default_page_size,
            max_results_limit = ?config.max_results_limit,
            "Remote configuration loaded"
        );
        Ok(config)
    }

    /// Open the event stream for a page request.
    pub async fn open_event_stream(&self, request: &PageRequest) -> SearchResult<MessageStream> {
        let url = self.search_url(self.config.stream_path(), request)?;
        debug!(url = %url, "Opening search stream");

        let response = self
            .client
            .get(url)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .send()
            .await?;
        let response = check_status(response)?;

        Ok(decode_event_stream(response.bytes_stream()))
    }

    /// Run a page request against the one-shot endpoint.
    ///
    /// The response is a single batch. It is tagged `Complete` here so callers
    /// can treat it like the terminal message of a stream.
    pub async fn search_once(&self, request: &PageRequest) -> SearchResult<ResultBatch> {
        let url = self.search_url(self.config.search_path(), request)?;
        debug!(url = %url, "Running one-shot search");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = check_status(response)?;

        let body = response.text().await?;
        let mut batch: ResultBatch = serde_json::from_str(&body)?;
        if batch.result_type.is_none() {
            batch.result_type = Some(ResultKind::Complete);
        }
        Ok(batch)
    }
}

fn check_status(response: Response) -> SearchResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(status = %status, url = %response.url(), "Search request rejected");
    Err(SearchError::Transport(format!(
        "search request failed with status: {status}"
    )))
}

impl SearchBackend for HttpBackend {
    fn fetch_config(&self) -> BoxFuture<'static, SearchResult<RemoteConfig>> {
        let backend = self.clone();
        async move { backend.fetch_remote_config().await }.boxed()
    }

    fn open_stream(&self, request: PageRequest) -> BoxFuture<'static, SearchResult<MessageStream>> {
        let backend = self.clone();
        async move { backend.open_event_stream(&request).await }.boxed()
    }
}
