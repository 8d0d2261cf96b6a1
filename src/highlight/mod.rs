//! Accent-insensitive, offset-preserving text highlighting

mod folded;
pub mod highlighter;

pub use highlighter::{HighlightMarker, Highlighter};
