pub mod backend;
pub mod config;
pub mod controller;
pub mod filters;
pub mod highlight;
pub mod stream;
pub mod text;
pub mod utils;

pub use backend::{HttpBackend, PageRequest, RemoteConfig, SearchBackend};
pub use config::ClientConfig;
pub use controller::{
    LoadingPhase, Presenter, RenderedItem, SearchPhase, SearchSessionController, SessionState,
    UserCommand,
};
pub use filters::{AppliedFilters, FilterCategory, FilterExclusionStore, FilterGroup};
pub use highlight::{HighlightMarker, Highlighter};
pub use stream::{
    MessageStream, ResultBatch, ResultItem, ResultKind, SearchError, SearchResult, SessionEvent,
    SessionHandle, SessionId, SessionUpdate, StreamSession,
};
pub use text::strip_diacritics;
