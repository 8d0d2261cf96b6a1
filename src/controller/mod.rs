//! Search session controller and the presentation boundary it drives

pub mod core;
pub mod presenter;
pub mod state;

pub use self::core::{SearchSessionController, UserCommand};
pub use presenter::{LoadingPhase, Presenter, RenderedItem};
pub use state::{ActiveSearch, DeferredSearch, SearchPhase, SessionState};
