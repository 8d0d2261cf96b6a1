//! Shared configuration constants for the search session client
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Endpoint serving the backend's remote configuration
pub const CONFIG_PATH: &str = "/api/config";

/// Endpoint producing the `text/event-stream` of result batches
pub const STREAM_SEARCH_PATH: &str = "/api/search/stream";

/// Endpoint returning a single JSON result batch
pub const ONE_SHOT_SEARCH_PATH: &str = "/api/search";

/// Page size used when the backend never reported one
///
/// The server's own default is 20; the client falls back to a smaller
/// page so a misconfigured deployment still paginates.
pub const FALLBACK_PAGE_SIZE: u32 = 10;

/// Timeout for the one-time `GET /api/config` request (seconds)
///
/// Only the config fetch is bounded. Streaming searches run until the
/// backend completes them or the controller cancels them.
pub const CONFIG_FETCH_TIMEOUT_SECS: u64 = 10;

/// TCP connect timeout applied to every backend request (seconds)
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Opening delimiter inserted around highlighted spans
pub const HIGHLIGHT_OPEN: &str = "<mark>";

/// Closing delimiter inserted around highlighted spans
pub const HIGHLIGHT_CLOSE: &str = "</mark>";

/// Terms of this many characters or fewer are never highlighted
pub const MIN_HIGHLIGHT_TERM_CHARS: usize = 1;

/// User agent sent with every backend request
pub const CLIENT_USER_AGENT: &str = concat!("kodegen-search-session/", env!("CARGO_PKG_VERSION"));

/// Heading label used when a result carries no proposition type
pub const DEFAULT_ITEM_KIND: &str = "PROJETO";

/// Author line used when a result carries no author
pub const UNKNOWN_AUTHOR: &str = "Não informado";

/// Separator between keywords in a result's keyword field
pub const KEYWORD_SEPARATOR: char = '|';

/// Shown for any transport, backend, or payload failure
pub const MSG_SEARCH_FAILED: &str = "Ocorreu um erro ao realizar a busca. Tente novamente.";

/// Shown when a new query completes with nothing to render
pub const MSG_NO_RESULTS: &str = "Nenhum resultado encontrado para sua busca.";

/// Shown when a pagination request completes empty and nothing is rendered
pub const MSG_NO_MORE_RESULTS: &str = "Não há mais resultados disponíveis.";
