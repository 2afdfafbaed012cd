//! Content store: the compiled item set every query starts from.
//!
//! The store is an explicit handle. Callers hold it and pass it where queries
//! are needed; there is no process-wide "last loaded" content.

use std::sync::Arc;

use tracing::{debug, instrument};

use contentgraph_shared::{ContentItem, QueryOptions, RawItem, Result};

use crate::enrichment::EnrichmentRegistry;
use crate::loader::ContentLoader;
use crate::query::Collection;

/// Compile a raw item's body and attach its metadata.
pub fn compile_item(raw: RawItem) -> ContentItem {
    let data = raw.metadata();
    let content = contentgraph_markdown::to_html(&raw.body);

    ContentItem {
        id: raw.id,
        slug: raw.slug,
        collection: raw.collection,
        content,
        data,
    }
}

/// Loaded, compiled items plus the enrichment registry queries resolve against.
#[derive(Debug, Clone)]
pub struct ContentStore {
    items: Arc<[ContentItem]>,
    registry: Arc<EnrichmentRegistry>,
    options: QueryOptions,
}

impl ContentStore {
    /// Wrap already-compiled items.
    pub fn new(items: Vec<ContentItem>, registry: EnrichmentRegistry) -> Self {
        Self {
            items: items.into(),
            registry: Arc::new(registry),
            options: QueryOptions::default(),
        }
    }

    /// Compile raw items in load order.
    #[instrument(skip_all, fields(raw = raw.len()))]
    pub fn from_raw(raw: Vec<RawItem>, registry: EnrichmentRegistry) -> Self {
        let items: Vec<ContentItem> = raw.into_iter().map(compile_item).collect();
        debug!(items = items.len(), "content compiled");
        Self::new(items, registry)
    }

    /// Pull raw items from `loader` and compile them.
    pub fn load(loader: &dyn ContentLoader, registry: EnrichmentRegistry) -> Result<Self> {
        Ok(Self::from_raw(loader.load()?, registry))
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn registry(&self) -> &EnrichmentRegistry {
        &self.registry
    }

    /// Distinct collection names in first-seen order.
    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for item in self.items.iter() {
            if !names.contains(&item.collection.as_str()) {
                names.push(&item.collection);
            }
        }
        names
    }

    /// Start a query over a snapshot of one collection.
    pub fn collection(&self, name: &str) -> Collection {
        let snapshot: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|item| item.collection == name)
            .cloned()
            .collect();

        if snapshot.is_empty() {
            debug!(collection = name, "collection is empty or unknown");
        }

        Collection::new(name, snapshot, Arc::clone(&self.registry)).with_options(&self.options)
    }
}
