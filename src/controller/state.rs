//! Session state owned by the controller

use crate::backend::PageRequest;
use crate::filters::AppliedFilters;
use crate::stream::{SessionHandle, SessionId};

/// Coarse controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    /// Nothing requested yet, or a search was cancelled before any result
    #[default]
    Idle,
    /// A request is parked until remote configuration arrives
    AwaitingConfig,
    /// A session is streaming
    Loading,
    /// Last session completed
    Loaded,
    /// Last session failed
    Errored,
}

/// A request parked before the page size was known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredSearch {
    pub query: String,
    pub page: u32,
    pub is_new_request: bool,
}

/// The session currently allowed to touch state
#[derive(Debug)]
pub struct ActiveSearch {
    pub(crate) handle: SessionHandle,
    pub(crate) request: PageRequest,
    pub(crate) is_new_request: bool,
    /// Rendered count and `has_more` before this request, restored if a
    /// pagination request is abandoned
    pub(crate) rendered_at_start: usize,
    pub(crate) has_more_at_start: bool,
}

impl ActiveSearch {
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.handle.id()
    }

    #[must_use]
    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    #[must_use]
    pub fn is_new_request(&self) -> bool {
        self.is_new_request
    }
}

/// Everything the controller knows about the current search
#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) phase: SearchPhase,
    pub(crate) current_query: Option<String>,
    pub(crate) page_index: u32,
    pub(crate) has_more: bool,
    pub(crate) is_loading: bool,
    /// Items currently handed to the presenter
    pub(crate) rendered_count: usize,
    pub(crate) config_loaded: bool,
    pub(crate) page_size: Option<u32>,
    pub(crate) max_results_limit: Option<u32>,
    pub(crate) pending_request: Option<DeferredSearch>,
    pub(crate) active: Option<ActiveSearch>,
    /// Backend-reported filters of the current query, before exclusion
    pub(crate) applied_filters: Option<AppliedFilters>,
    /// Chips currently shown after exclusion
    pub(crate) visible_chip_count: usize,
}

impl SessionState {
    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    #[must_use]
    pub fn current_query(&self) -> Option<&str> {
        self.current_query.as_deref()
    }

    #[must_use]
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.rendered_count
    }

    #[must_use]
    pub fn config_loaded(&self) -> bool {
        self.config_loaded
    }

    #[must_use]
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    #[must_use]
    pub fn max_results_limit(&self) -> Option<u32> {
        self.max_results_limit
    }

    #[must_use]
    pub fn pending_request(&self) -> Option<&DeferredSearch> {
        self.pending_request.as_ref()
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveSearch> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(ActiveSearch::id)
    }

    #[must_use]
    pub fn visible_chip_count(&self) -> usize {
        self.visible_chip_count
    }

    /// The "load more" affordance is enabled exactly when this holds.
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading
    }
}
