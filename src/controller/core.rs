//! Search session controller
//!
//! Owns [`SessionState`], the exclusion store, and the single active session.
//! User actions and session events are the only inputs; the [`Presenter`] is
//! the only output. Every session event is checked against the active
//! session id before it may touch state.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::presenter::{LoadingPhase, Presenter, RenderedItem};
use super::state::{ActiveSearch, DeferredSearch, SearchPhase, SessionState};
use crate::backend::{PageRequest, RemoteConfig, SearchBackend};
use crate::filters::{AppliedFilters, FilterCategory, FilterExclusionStore};
use crate::highlight::{HighlightMarker, Highlighter};
use crate::stream::{
    ResultBatch, SearchError, SearchResult, SessionEvent, SessionId, SessionUpdate, StreamSession,
};
use crate::utils::{FALLBACK_PAGE_SIZE, MSG_NO_MORE_RESULTS, MSG_NO_RESULTS};

/// Inputs from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Submit(String),
    NextPage,
    /// Scroll sentinel became visible; same guard as `NextPage`
    VisibilityTrigger,
    RemoveFilter {
        category: FilterCategory,
        value: String,
    },
    Cancel,
    Quit,
}

/// Top-level search state machine
pub struct SearchSessionController<B, P> {
    backend: Arc<B>,
    presenter: P,
    state: SessionState,
    filters: FilterExclusionStore,
    marker: HighlightMarker,
    fallback_page_size: u32,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    next_session: u64,
}

impl<B, P> SearchSessionController<B, P>
where
    B: SearchBackend,
    P: Presenter,
{
    #[must_use]
    pub fn new(backend: Arc<B>, presenter: P) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            presenter,
            state: SessionState::default(),
            filters: FilterExclusionStore::new(),
            marker: HighlightMarker::default(),
            fallback_page_size: FALLBACK_PAGE_SIZE,
            events_tx,
            events_rx,
            next_session: 0,
        }
    }

    #[must_use]
    pub fn with_highlight_marker(mut self, marker: HighlightMarker) -> Self {
        self.marker = marker;
        self
    }

    /// Page size used when the backend reports none. Zero is ignored.
    #[must_use]
    pub fn with_fallback_page_size(mut self, size: u32) -> Self {
        if size > 0 {
            self.fallback_page_size = size;
        }
        self
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn filters(&self) -> &FilterExclusionStore {
        &self.filters
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Page size sent with the next request
    #[must_use]
    pub fn effective_page_size(&self) -> u32 {
        self.state.page_size.unwrap_or(self.fallback_page_size)
    }

    /// Start a new top-level query.
    ///
    /// Resets page, `has_more`, exclusions, and chips. An empty query is
    /// rejected with [`SearchError::Validation`] and changes nothing.
    pub fn submit_manual_query(&mut self, query: &str) -> SearchResult<()> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring empty query");
            return Err(SearchError::Validation("query is empty".to_string()));
        }

        info!(query = %query, "Manual query submitted");
        self.state.current_query = Some(query.to_string());
        self.state.page_index = 0;
        self.state.has_more = false;
        self.filters.reset_all();
        self.state.applied_filters = None;
        self.state.visible_chip_count = 0;
        self.presenter.render_filters(&AppliedFilters::new());

        self.execute_search(query.to_string(), 0, true);
        Ok(())
    }

    /// Request the next page. Returns `false` when the guard refuses.
    pub fn load_next_page(&mut self) -> bool {
        if !self.state.can_load_more() {
            debug!(
                has_more = self.state.has_more,
                loading = self.state.is_loading,
                "Next page not available"
            );
            return false;
        }
        let Some(query) = self.state.current_query.clone() else {
            return false;
        };

        let next_page = self.state.page_index + 1;
        if let Some(limit) = self.state.max_results_limit {
            let offset = u64::from(next_page) * u64::from(self.effective_page_size());
            if offset >= u64::from(limit) {
                info!(limit, offset, "Result limit reached, no further pages");
                self.state.has_more = false;
                self.presenter.set_load_more(false);
                self.presenter
                    .set_end_of_results(self.state.rendered_count > 0);
                return false;
            }
        }

        self.state.page_index = next_page;
        self.execute_search(query, next_page, false);
        true
    }

    /// Visibility sentinel fired. Same guard as [`Self::load_next_page`].
    pub fn on_visibility_trigger(&mut self) -> bool {
        self.load_next_page()
    }

    /// Hide one chip value and refresh the current query from page 0.
    ///
    /// Exclusions are kept, unlike a manual query. The refresh runs even when
    /// the value was already excluded. Returns whether the exclusion is new.
    pub fn remove_filter_value(&mut self, category: FilterCategory, value: &str) -> bool {
        let added = self.filters.exclude(category, value);
        if added {
            info!(category = %category, value = %value, "Filter value excluded");
        }
        self.render_visible_filters();

        if let Some(query) = self.state.current_query.clone() {
            self.state.page_index = 0;
            self.state.has_more = false;
            self.execute_search(query, 0, true);
        }
        added
    }

    /// Cancel the running session, if any. Never shows a message.
    pub fn cancel_active_search(&mut self) {
        if let Some(active) = self.state.active.take() {
            info!(session = %active.id(), "Search cancelled");
            self.abandon(active);
        }
        self.state.is_loading = false;
        self.presenter.set_loading(None);
        if self.state.phase == SearchPhase::Loading {
            self.state.phase = if self.state.rendered_count > 0 {
                SearchPhase::Loaded
            } else {
                SearchPhase::Idle
            };
        }
        self.presenter.set_load_more(self.state.can_load_more());
    }

    /// Record the outcome of the remote configuration fetch.
    ///
    /// Only the first call counts. A failure still marks configuration as
    /// loaded so searches fall back to the default page size. The parked
    /// request, if any, runs now.
    pub fn apply_remote_config(&mut self, result: SearchResult<RemoteConfig>) {
        if self.state.config_loaded {
            debug!("Remote configuration already applied");
            return;
        }
        match result {
            Ok(config) => {
                self.state.page_size = config.default_page_size.filter(|size| *size > 0);
                self.state.max_results_limit = config.max_results_limit;
                info!(
                    page_size = self.effective_page_size(),
                    max_results_limit = ?config.max_results_limit,
                    "Remote configuration applied"
                );
            }
            Err(e) => {
                warn!(
                    error = %e,
                    fallback_page_size = self.fallback_page_size,
                    "Remote configuration unavailable, using fallback page size"
                );
            }
        }
        self.state.config_loaded = true;

        if let Some(pending) = self.state.pending_request.take() {
            debug!(query = %pending.query, page = pending.page, "Running deferred search");
            self.execute_search(pending.query, pending.page, pending.is_new_request);
        }
    }

    /// Fetch and apply remote configuration.
    pub async fn load_remote_config(&mut self) {
        let result = self.backend.fetch_config().await;
        self.apply_remote_config(result);
    }

    fn execute_search(&mut self, query: String, page: u32, is_new_request: bool) {
        if !self.state.config_loaded {
            let deferred = DeferredSearch {
                query,
                page,
                is_new_request,
            };
            if let Some(previous) = self.state.pending_request.replace(deferred) {
                debug!(query = %previous.query, "Deferred search replaced");
            }
            self.state.phase = SearchPhase::AwaitingConfig;
            return;
        }

        if let Some(previous) = self.state.active.take() {
            debug!(session = %previous.id(), "Superseding active session");
            previous.handle.cancel();
        }

        let excluded_filters = match self.filters.to_query_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Could not encode excluded filters, sending none");
                None
            }
        };
        let request = PageRequest::new(query, page, self.effective_page_size())
            .with_excluded_filters(excluded_filters);

        if is_new_request {
            self.presenter.truncate_results(0);
            self.state.rendered_count = 0;
            self.presenter.set_end_of_results(false);
        }
        self.presenter.hide_error();
        self.presenter.set_loading(Some(LoadingPhase::Searching));
        self.state.is_loading = true;
        self.presenter.set_load_more(false);
        self.state.phase = SearchPhase::Loading;

        let id = self.next_session_id();
        let has_more_at_start = self.state.has_more;
        let handle = StreamSession::open(
            self.backend.as_ref(),
            request.clone(),
            id,
            self.events_tx.clone(),
        );
        self.state.active = Some(ActiveSearch {
            handle,
            request,
            is_new_request,
            rendered_at_start: self.state.rendered_count,
            has_more_at_start,
        });
    }

    fn next_session_id(&mut self) -> SessionId {
        self.next_session += 1;
        SessionId::new(self.next_session)
    }

    /// Apply one session event, dropping it unless it comes from the active
    /// session.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        let active_id = self.state.active_session();
        if active_id != Some(event.session) {
            debug!(
                session = %event.session,
                active = ?active_id.map(|id| id.to_string()),
                "Dropping event from stale session"
            );
            return;
        }

        match event.update {
            SessionUpdate::Partial(batch) => self.apply_exact(batch),
            SessionUpdate::Completed(batch) => self.apply_complete(batch),
            SessionUpdate::Failed(error) => self.apply_failure(error),
        }
    }

    /// Wait for the next session event and apply it.
    ///
    /// Returns the id of the session the event came from.
    pub async fn process_next_event(&mut self) -> Option<SessionId> {
        let event = self.events_rx.recv().await?;
        let session = event.session;
        self.handle_session_event(event);
        Some(session)
    }

    fn apply_exact(&mut self, batch: ResultBatch) {
        let Some(active) = self.state.active.take() else {
            return;
        };
        self.update_filters_from(&active, &batch);
        self.render_batch(&active, &batch);
        self.state.has_more = self.has_more_within_limit(&active, batch.has_more);
        self.presenter
            .set_loading(Some(LoadingPhase::SemanticPending));
        debug!(
            session = %active.id(),
            items = batch.items.len(),
            has_more = batch.has_more,
            "Exact results rendered"
        );
        self.state.active = Some(active);
    }

    fn apply_complete(&mut self, batch: ResultBatch) {
        let Some(active) = self.state.active.take() else {
            return;
        };
        self.update_filters_from(&active, &batch);
        self.render_batch(&active, &batch);

        self.state.has_more = self.has_more_within_limit(&active, batch.has_more);
        self.state.is_loading = false;
        self.state.phase = SearchPhase::Loaded;
        self.presenter.set_loading(None);

        if batch.items.is_empty() {
            if active.is_new_request {
                if self.state.visible_chip_count == 0 {
                    self.presenter.show_error(MSG_NO_RESULTS);
                }
            } else if self.state.rendered_count == 0 {
                self.presenter.show_error(MSG_NO_MORE_RESULTS);
            }
        }
        self.presenter.set_load_more(self.state.can_load_more());
        self.presenter
            .set_end_of_results(!self.state.has_more && self.state.rendered_count > 0);
        self.presenter
            .show_summary(self.state.rendered_count, batch.total_elements);

        info!(
            session = %active.id(),
            query = %active.request.query,
            page = active.request.page,
            items = batch.items.len(),
            rendered = self.state.rendered_count,
            has_more = self.state.has_more,
            "Search completed"
        );
    }

    fn apply_failure(&mut self, error: SearchError) {
        let Some(active) = self.state.active.take() else {
            return;
        };
        warn!(session = %active.id(), error = %error, "Search failed");
        self.abandon(active);
        self.state.is_loading = false;
        self.state.phase = SearchPhase::Errored;
        self.presenter.set_loading(None);
        if let Some(message) = error.user_message() {
            self.presenter.show_error(message);
        }
        self.presenter.set_load_more(self.state.can_load_more());
    }

    /// Close a session that will not complete.
    ///
    /// Rendered items always stay. A pagination request that rendered
    /// nothing gives back its page so the next "load more" asks for it again.
    fn abandon(&mut self, active: ActiveSearch) {
        active.handle.cancel();
        if active.is_new_request || self.state.rendered_count != active.rendered_at_start {
            return;
        }
        self.state.page_index = active.request.page.saturating_sub(1);
        self.state.has_more = active.has_more_at_start;
    }

    /// Render `batch`. A new query replaces what this request showed so far;
    /// pagination appends.
    fn render_batch(&mut self, active: &ActiveSearch, batch: &ResultBatch) {
        if active.is_new_request && self.state.rendered_count != active.rendered_at_start {
            self.presenter.truncate_results(active.rendered_at_start);
            self.state.rendered_count = active.rendered_at_start;
        }
        if batch.items.is_empty() {
            return;
        }

        let highlighter = Highlighter::for_batch(
            batch.highlight_terms(),
            &active.request.query,
            self.marker.clone(),
        );
        let start = self.state.rendered_count;
        let rendered: Vec<RenderedItem> = batch
            .items
            .iter()
            .enumerate()
            .map(|(offset, item)| RenderedItem::project(item, start + offset + 1, &highlighter))
            .collect();
        self.presenter.render_results(&rendered);
        self.state.rendered_count += rendered.len();
    }

    /// The backend's `hasMore`, unless the next page would start at or past
    /// `maxResultsLimit`.
    fn has_more_within_limit(&self, active: &ActiveSearch, has_more: bool) -> bool {
        let Some(limit) = self.state.max_results_limit else {
            return has_more;
        };
        let next_offset = (u64::from(active.request.page) + 1) * u64::from(active.request.size);
        has_more && next_offset < u64::from(limit)
    }

    fn update_filters_from(&mut self, active: &ActiveSearch, batch: &ResultBatch) {
        if !active.is_new_request {
            return;
        }
        if let Some(applied) = &batch.applied_filters {
            self.state.applied_filters = Some(applied.clone());
            self.render_visible_filters();
        }
    }

    fn render_visible_filters(&mut self) {
        let visible = match &self.state.applied_filters {
            Some(applied) => self.filters.filter_visible(applied),
            None => return,
        };
        self.state.visible_chip_count = visible.value_count();
        self.presenter.render_filters(&visible);
    }

    /// Apply one user command. Returns `false` for [`UserCommand::Quit`].
    pub fn dispatch(&mut self, command: UserCommand) -> bool {
        match command {
            UserCommand::Submit(query) => {
                if let Err(e) = self.submit_manual_query(&query) {
                    debug!(error = %e, "Query rejected");
                }
            }
            UserCommand::NextPage => {
                self.load_next_page();
            }
            UserCommand::VisibilityTrigger => {
                self.on_visibility_trigger();
            }
            UserCommand::RemoveFilter { category, value } => {
                self.remove_filter_value(category, &value);
            }
            UserCommand::Cancel => self.cancel_active_search(),
            UserCommand::Quit => return false,
        }
        true
    }

    /// Drive the controller until `Quit` or until the command channel closes.
    ///
    /// Remote configuration is fetched concurrently, so commands that arrive
    /// before it resolves go through the deferred-request slot.
    pub async fn run(mut self, mut commands: mpsc::Receiver<UserCommand>) -> Self {
        let mut config_fetch = self.backend.fetch_config();

        loop {
            tokio::select! {
                result = &mut config_fetch, if !self.state.config_loaded => {
                    self.apply_remote_config(result);
                }
                Some(event) = self.events_rx.recv() => {
                    self.handle_session_event(event);
                }
                command = commands.recv() => {
                    let keep_going = match command {
                        Some(command) => self.dispatch(command),
                        None => false,
                    };
                    if !keep_going {
                        break;
                    }
                }
            }
        }

        if let Some(active) = self.state.active.take() {
            active.handle.cancel();
        }
        self.state.is_loading = false;
        self
    }
}
