//! Error types for search sessions
//!
//! Every failure a session can hit lands in [`SearchError`]. None of them are
//! fatal to the controller: visible kinds turn into one generic message and
//! the rest are logged and absorbed.

use thiserror::Error;

use crate::utils::MSG_SEARCH_FAILED;

/// Result type alias for search session operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Error types for search session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Query was empty after trimming
    #[error("Invalid search query: {0}")]
    Validation(String),

    /// Remote configuration could not be fetched or parsed
    #[error("Remote configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// Connection-level failure, including a stream that ended early
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Backend sent an explicit error batch
    #[error("Backend reported an error: {0}")]
    Backend(String),

    /// Inbound message could not be parsed as a result batch
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(error: reqwest::Error) -> Self {
        SearchError::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(error: serde_json::Error) -> Self {
        SearchError::MalformedPayload(error.to_string())
    }
}

impl SearchError {
    /// Check if the user should see a message for this error
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            SearchError::Transport(_) | SearchError::Backend(_) | SearchError::MalformedPayload(_)
        )
    }

    /// Generic, retry-inviting message for visible errors
    #[must_use]
    pub fn user_message(&self) -> Option<&'static str> {
        self.is_user_visible().then_some(MSG_SEARCH_FAILED)
    }

    /// Check if resubmitting the same request may succeed
    ///
    /// Nothing is retried automatically. This only informs the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Transport(_) | SearchError::Backend(_))
    }
}
