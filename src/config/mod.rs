//! Configuration module for the search session client
//!
//! This module provides the `ClientConfig` struct and its type-safe builder
//! with validation and defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{ClientConfigBuilder, WithBaseUrl};
pub use types::ClientConfig;
