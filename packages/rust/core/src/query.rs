//! Lazy, chainable collection queries.
//!
//! A [`Collection`] owns a snapshot of items and accumulates a query
//! specification. Nothing runs until a terminal call: [`Collection::all`],
//! [`Collection::first`], [`Collection::count`] or
//! [`Collection::group_by_section`]. Terminal calls take `&self` and never
//! touch the snapshot, so one built query can be read any number of times.
//!
//! Stage order is fixed: filter, sort, limit, enrichment, projection.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use contentgraph_shared::{ContentItem, FieldMap, FieldValue, QueryOptions, RawSection};

use crate::enrichment::{EnrichStep, EnrichmentRegistry};

/// Item predicate used by [`Collection::filter`].
pub type Predicate = Box<dyn Fn(&ContentItem) -> bool + Send + Sync>;

// ---------------------------------------------------------------------------
// Sort spec
// ---------------------------------------------------------------------------

/// Sort direction. Descending unless stated otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
struct SortSpec {
    field: String,
    direction: SortDirection,
}

/// Present values compare with [`FieldValue::compare`], flipped for
/// descending. Absent values sort last in either direction.
fn compare_keys(a: Option<&FieldValue>, b: Option<&FieldValue>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.compare(b),
            SortDirection::Desc => b.compare(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

/// One materialized result: the full item, or only the projected fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Item(ContentItem),
    Fields(FieldMap),
}

impl Entry {
    /// Field lookup that works for both shapes.
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        match self {
            Self::Item(item) => item.get(field),
            Self::Fields(fields) => fields.get(field).cloned(),
        }
    }

    pub fn as_item(&self) -> Option<&ContentItem> {
        match self {
            Self::Item(item) => Some(item),
            Self::Fields(_) => None,
        }
    }

    pub fn into_item(self) -> Option<ContentItem> {
        match self {
            Self::Item(item) => Some(item),
            Self::Fields(_) => None,
        }
    }
}

/// Items sharing the first slug segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: String,
    pub title: String,
    pub items: Vec<ContentItem>,
}

impl From<Group> for RawSection {
    fn from(group: Group) -> Self {
        Self {
            id: Some(group.key),
            title: Some(group.title),
            items: group.items,
            ..Self::default()
        }
    }
}

/// `getting-started` -> `Getting Started`.
pub fn title_from_key(key: &str) -> String {
    key.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.as_str())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A chainable query over a fixed snapshot of items.
///
/// Chaining methods consume and return the builder, so a query is fully
/// assembled before it can be read.
pub struct Collection {
    name: String,
    items: Arc<[ContentItem]>,
    registry: Arc<EnrichmentRegistry>,
    default_group: String,
    filters: Vec<Predicate>,
    sort: Option<SortSpec>,
    limit: Option<usize>,
    fields: Option<Vec<String>>,
    steps: Vec<EnrichStep>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("items", &self.items.len())
            .field("filters", &self.filters.len())
            .field("sort", &self.sort)
            .field("limit", &self.limit)
            .field("fields", &self.fields)
            .field("steps", &self.steps)
            .finish()
    }
}

impl Collection {
    pub fn new(
        name: impl Into<String>,
        items: impl Into<Arc<[ContentItem]>>,
        registry: Arc<EnrichmentRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            items: items.into(),
            registry,
            default_group: QueryOptions::default().default_group,
            filters: Vec::new(),
            sort: None,
            limit: None,
            fields: None,
            steps: Vec::new(),
        }
    }

    /// Apply runtime options (currently the default group key).
    pub fn with_options(mut self, options: &QueryOptions) -> Self {
        self.default_group = options.default_group.clone();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a predicate. All predicates must pass.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ContentItem) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Box::new(predicate));
        self
    }

    /// Keep items whose `field` equals `value`.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let field = field.into();
        let value = value.into();
        self.filter(move |item| item.get(&field).as_ref() == Some(&value))
    }

    /// Sort descending by `field`, replacing any earlier sort.
    pub fn sort(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortDirection::default())
    }

    /// Sort by `field` in `direction`, replacing any earlier sort.
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Project results down to `fields`, replacing any earlier projection.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Append an enrichment step (a registry name or a direct transform).
    pub fn enrich(mut self, step: impl Into<EnrichStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    // -----------------------------------------------------------------------
    // Terminal operations
    // -----------------------------------------------------------------------

    /// Materialize every stage.
    #[instrument(skip_all, fields(collection = %self.name))]
    pub async fn all(&self) -> Vec<Entry> {
        self.materialize(self.limit).await
    }

    /// The first result. Overrides any limit with one, so only that item is
    /// enriched.
    pub async fn first(&self) -> Option<Entry> {
        self.materialize(Some(1)).await.into_iter().next()
    }

    /// Number of results. Runs the whole pipeline, enrichment included.
    pub async fn count(&self) -> usize {
        self.materialize(self.limit).await.len()
    }

    /// Partition filtered, sorted and limited items by first slug segment.
    ///
    /// Enrichment and projection do not apply here.
    pub fn group_by_section(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();

        for item in self.select(self.limit) {
            let key = match item.slug.split_once('/') {
                Some((head, _)) => head.to_string(),
                None => self.default_group.clone(),
            };
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.items.push(item),
                None => groups.push(Group {
                    title: title_from_key(&key),
                    key,
                    items: vec![item],
                }),
            }
        }

        debug!(collection = %self.name, groups = groups.len(), "grouped collection");
        groups
    }

    async fn materialize(&self, limit: Option<usize>) -> Vec<Entry> {
        let selected = self.select(limit);
        let enriched = self.registry.enrich_all(selected, &self.steps).await;

        let entries: Vec<Entry> = match &self.fields {
            Some(fields) => enriched
                .iter()
                .map(|item| Entry::Fields(project(item, fields)))
                .collect(),
            None => enriched.into_iter().map(Entry::Item).collect(),
        };

        debug!(results = entries.len(), "collection materialized");
        entries
    }

    /// Filter, sort, limit.
    fn select(&self, limit: Option<usize>) -> Vec<ContentItem> {
        let mut selected: Vec<&ContentItem> = self
            .items
            .iter()
            .filter(|item| self.filters.iter().all(|pred| pred(*item)))
            .collect();

        if let Some(spec) = &self.sort {
            let mut keyed: Vec<(Option<FieldValue>, &ContentItem)> = selected
                .into_iter()
                .map(|item| (item.get(&spec.field), item))
                .collect();
            // `sort_by` is stable: equal keys keep snapshot order.
            keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), spec.direction));
            selected = keyed.into_iter().map(|(_, item)| item).collect();
        }

        if let Some(limit) = limit {
            selected.truncate(limit);
        }

        selected.into_iter().cloned().collect()
    }
}

fn project(item: &ContentItem, fields: &[String]) -> FieldMap {
    fields
        .iter()
        .filter_map(|name| item.get(name).map(|value| (name.clone(), value)))
        .collect()
}
