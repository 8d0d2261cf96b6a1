//! Text normalization used as a comparison key for highlighting

pub mod normalize;

pub use normalize::{is_diacritic, push_stripped, strip_diacritics};
