//! Enrichment steps: item-to-item transforms run after filtering and limiting.
//!
//! A step is either a name looked up in an [`EnrichmentRegistry`] or a direct
//! transform. Each item's steps run strictly in order; chains for different
//! items run concurrently and their results keep the input order.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use contentgraph_shared::{ContentItem, QueryOptions};

/// Name of the built-in reading time step.
pub const READ_TIME: &str = "readTime";

/// Name of the built-in word count step.
pub const WORD_COUNT: &str = "wordCount";

/// Future returned by an enrichment transform.
pub type EnrichFuture = BoxFuture<'static, ContentItem>;

/// A shareable, possibly suspending item transform.
pub type EnrichFn = Arc<dyn Fn(ContentItem) -> EnrichFuture + Send + Sync>;

/// Wrap an async closure as an [`EnrichFn`].
pub fn enricher<F, Fut>(f: F) -> EnrichFn
where
    F: Fn(ContentItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ContentItem> + Send + 'static,
{
    Arc::new(move |item| f(item).boxed())
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One entry of a collection's enrichment pipeline.
#[derive(Clone)]
pub enum EnrichStep {
    /// Resolved against the registry when the collection materializes.
    Named(String),
    Direct(EnrichFn),
}

impl fmt::Debug for EnrichStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Direct(_) => f.write_str("Direct(..)"),
        }
    }
}

impl From<&str> for EnrichStep {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for EnrichStep {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<EnrichFn> for EnrichStep {
    fn from(f: EnrichFn) -> Self {
        Self::Direct(f)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name to transform lookup for [`EnrichStep::Named`] steps.
#[derive(Clone, Default)]
pub struct EnrichmentRegistry {
    steps: HashMap<String, EnrichFn>,
}

impl fmt::Debug for EnrichmentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentRegistry")
            .field("steps", &self.names())
            .finish()
    }
}

impl EnrichmentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `readTime` and `wordCount`.
    pub fn with_builtins(options: &QueryOptions) -> Self {
        let mut registry = Self::new();
        let words_per_minute = options.words_per_minute.max(1) as usize;

        registry.register(
            READ_TIME,
            enricher(move |item| async move { read_time(&item, words_per_minute) }),
        );
        registry.register(WORD_COUNT, enricher(|item| async move { word_count(&item) }));
        registry
    }

    /// Register (or replace) a named step.
    pub fn register(&mut self, name: impl Into<String>, step: EnrichFn) {
        self.steps.insert(name.into(), step);
    }

    pub fn get(&self, name: &str) -> Option<&EnrichFn> {
        self.steps.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run `steps` over one item, each step receiving the previous output.
    ///
    /// Named steps missing from the registry are skipped.
    pub async fn run_chain(&self, mut item: ContentItem, steps: &[EnrichStep]) -> ContentItem {
        for step in steps {
            let transform = match step {
                EnrichStep::Named(name) => match self.get(name) {
                    Some(f) => f,
                    None => {
                        warn!(step = %name, item = %item.id, "enrichment step not registered, skipping");
                        continue;
                    }
                },
                EnrichStep::Direct(f) => f,
            };
            item = transform(item).await;
        }
        item
    }

    /// Run the chain for every item concurrently. Output order matches input order.
    pub async fn enrich_all(&self, items: Vec<ContentItem>, steps: &[EnrichStep]) -> Vec<ContentItem> {
        if steps.is_empty() {
            return items;
        }
        debug!(items = items.len(), steps = steps.len(), "running enrichment");
        join_all(items.into_iter().map(|item| self.run_chain(item, steps))).await
    }
}

// ---------------------------------------------------------------------------
// Built-in transforms
// ---------------------------------------------------------------------------

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Attach `wordCount`: whitespace-separated words in `content`.
pub fn word_count(item: &ContentItem) -> ContentItem {
    let words = count_words(&item.content);
    item.with_field(WORD_COUNT, words as f64)
}

/// Attach `readTime`: minutes rounded up, as a display string.
pub fn read_time(item: &ContentItem, words_per_minute: usize) -> ContentItem {
    let words = count_words(&item.content);
    let minutes = words.div_ceil(words_per_minute.max(1));
    item.with_field(READ_TIME, format!("{minutes} min read"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use contentgraph_shared::FieldValue;

    use super::*;

    fn item(id: &str, content: &str) -> ContentItem {
        ContentItem::new(id, id, "docs", content).with_field("title", "T")
    }

    fn builtins() -> EnrichmentRegistry {
        EnrichmentRegistry::with_builtins(&QueryOptions::default())
    }

    #[test]
    fn word_count_keeps_original_fields() {
        let original = item("a", "a b c");
        let enriched = word_count(&original);

        assert_eq!(enriched.get(WORD_COUNT), Some(FieldValue::Number(3.0)));
        assert_eq!(enriched.title(), Some("T"));
        assert_eq!(enriched.content, "a b c");
        assert!(original.field(WORD_COUNT).is_none());
    }

    #[test]
    fn read_time_rounds_up() {
        let words = vec!["w"; 201].join(" ");
        let enriched = read_time(&item("a", &words), 200);
        assert_eq!(enriched.get(READ_TIME), Some(FieldValue::from("2 min read")));

        let enriched = read_time(&item("b", "one two"), 200);
        assert_eq!(enriched.get(READ_TIME), Some(FieldValue::from("1 min read")));

        let enriched = read_time(&item("c", ""), 200);
        assert_eq!(enriched.get(READ_TIME), Some(FieldValue::from("0 min read")));
    }

    #[test]
    fn builtins_are_registered() {
        assert_eq!(builtins().names(), vec![READ_TIME, WORD_COUNT]);
    }

    #[tokio::test]
    async fn chain_runs_in_order_and_skips_unknown_names() {
        let registry = builtins();
        let double = enricher(|item: ContentItem| async move {
            let n = item.field(WORD_COUNT).and_then(FieldValue::as_number).unwrap_or(0.0);
            item.with_field("doubled", n * 2.0)
        });

        let steps = vec![
            EnrichStep::from(WORD_COUNT),
            EnrichStep::from("noSuchStep"),
            EnrichStep::Direct(double),
        ];
        let out = registry.run_chain(item("a", "x y"), &steps).await;

        assert_eq!(out.get("doubled"), Some(FieldValue::Number(4.0)));
        assert!(out.get("noSuchStep").is_none());
    }

    #[tokio::test]
    async fn enrich_all_preserves_input_order() {
        let registry = EnrichmentRegistry::new();
        let finished = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&finished);

        // Earlier items sleep longer, so completion order is reversed.
        let slow = enricher(move |item: ContentItem| {
            let log = Arc::clone(&log);
            async move {
                let delay = match item.id.as_str() {
                    "a" => 30,
                    "b" => 15,
                    _ => 0,
                };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                log.lock().unwrap().push(item.id.clone());
                item.with_field("done", true)
            }
        });

        let items = vec![item("a", ""), item("b", ""), item("c", "")];
        let out = registry.enrich_all(items, &[EnrichStep::Direct(slow)]).await;

        let ids: Vec<&str> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(out.iter().all(|i| i.get("done") == Some(FieldValue::Bool(true))));
        assert_eq!(*finished.lock().unwrap(), vec!["c", "b", "a"]);
    }
}
