//! Backend boundary
//!
//! The controller only ever talks to a [`SearchBackend`]: one call for the
//! remote configuration and one to open a result stream. [`HttpBackend`] is
//! the real implementation; tests script their own.

pub mod http;
pub mod types;

use futures::future::BoxFuture;

use crate::stream::{MessageStream, SearchResult};

pub use http::HttpBackend;
pub use types::{PageRequest, RemoteConfig};

/// Source of remote configuration and streaming search results
///
/// Returned futures are `'static` so the controller can hold them across
/// its own `&mut self` calls and sessions can own them on spawned tasks.
pub trait SearchBackend: Send + Sync + 'static {
    /// Fetch `{ defaultPageSize, maxResultsLimit }`.
    fn fetch_config(&self) -> BoxFuture<'static, SearchResult<RemoteConfig>>;

    /// Open the event stream for one page request.
    ///
    /// The returned stream yields one raw JSON payload per event. Dropping it
    /// closes the connection.
    fn open_stream(&self, request: PageRequest) -> BoxFuture<'static, SearchResult<MessageStream>>;
}

