//! Shared types, error model, and configuration for contentgraph.
//!
//! This crate is the foundation depended on by all other contentgraph crates.
//! It provides:
//! - [`ContentGraphError`] — the unified error type
//! - Domain types ([`ContentItem`], [`FieldValue`], [`RawItem`], [`RawSection`])
//! - Configuration ([`AppConfig`], [`QueryOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ContentConfig, EnrichmentSettings, NavigationConfig, QueryOptions, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ContentGraphError, Result};
pub use types::{ContentItem, FieldMap, FieldValue, RawItem, RawSection};
