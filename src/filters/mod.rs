//! Filter chips: categories, backend-applied filters, and user exclusions

pub mod store;
pub mod types;

pub use store::FilterExclusionStore;
pub use types::{AppliedFilters, FilterCategory, FilterGroup, UnknownCategory};
