//! Content query and navigation engines for contentgraph.
//!
//! This crate ties loaded items, the markdown compiler, collection queries and
//! the documentation navigation index together:
//! - [`store`] — compiled item set and the entry point for queries
//! - [`query`] — chainable, lazily evaluated collection builder
//! - [`enrichment`] — named and direct item transforms
//! - [`navigation`] — ordered sections, selection state, doc URLs

pub mod enrichment;
pub mod loader;
pub mod navigation;
pub mod query;
pub mod store;

pub use enrichment::{EnrichFn, EnrichStep, EnrichmentRegistry, enricher};
pub use loader::{ContentLoader, JsonFileLoader};
pub use navigation::{
    DocPath, Document, NavigationIndex, Section, build_doc_url, parse_doc_url, slugify,
};
pub use query::{Collection, Entry, Group, SortDirection};
pub use store::{ContentStore, compile_item};
