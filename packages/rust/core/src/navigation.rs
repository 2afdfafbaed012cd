//! Documentation navigation index.
//!
//! Orders raw sections and their documents into a deterministic hierarchy,
//! tracks the currently selected section and document, and walks
//! previous/next links across section boundaries.
//!
//! Ordering rules:
//! - documents: intro first, then explicit `order` ascending (documents with
//!   an order before those without), then title
//! - sections: explicit order ascending (same rule), then sections that have
//!   an intro document, then title

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use contentgraph_shared::{ContentItem, FieldValue, RawSection};

/// Path prefix of every documentation URL.
pub const DOCS_ROOT: &str = "/documentation";

/// Slug a section or document is given when nothing usable can be derived.
const FALLBACK_SECTION_SLUG: &str = "section";
const FALLBACK_DOCUMENT_SLUG: &str = "untitled";

// ---------------------------------------------------------------------------
// Slugs and URLs
// ---------------------------------------------------------------------------

/// Lowercase, drop everything but word characters, whitespace and hyphens,
/// then hyphenate. Repeated hyphens collapse to one and leading or trailing
/// hyphens are removed, so `-foo-` becomes `foo`.
pub fn slugify(text: &str) -> String {
    static STRIP_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid regex"));
    static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    static HYPHEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

    let lowered = text.to_lowercase();
    let stripped = STRIP_RE.replace_all(&lowered, "");
    let hyphenated = SPACE_RE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHEN_RE.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// `/documentation/{section}` or `/documentation/{section}/{doc}`.
///
/// A document slug of `index` addresses the section itself.
pub fn build_doc_url(section_slug: &str, doc_slug: Option<&str>) -> String {
    match doc_slug {
        None | Some("index") => format!("{DOCS_ROOT}/{section_slug}"),
        Some(doc) => format!("{DOCS_ROOT}/{section_slug}/{doc}"),
    }
}

/// Section and document slugs recovered from a documentation path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocPath {
    pub section_slug: Option<String>,
    pub doc_slug: Option<String>,
}

/// Inverse of [`build_doc_url`]. Paths of any other shape yield empty slugs.
pub fn parse_doc_url(path: &str) -> DocPath {
    static DOC_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^/documentation/([^/]+)(?:/([^/]+))?$").expect("valid regex")
    });

    match DOC_URL_RE.captures(path) {
        Some(caps) => DocPath {
            section_slug: caps.get(1).map(|m| m.as_str().to_string()),
            doc_slug: caps.get(2).map(|m| m.as_str().to_string()),
        },
        None => DocPath::default(),
    }
}

/// First non-empty slug among `candidates`, else `fallback`.
fn first_slug<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>, fallback: &str) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(slugify)
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

// ---------------------------------------------------------------------------
// Documents and sections
// ---------------------------------------------------------------------------

/// A content item placed in a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub item: ContentItem,
    /// Slug used in URLs, derived from the last path segment.
    pub display_slug: String,
    pub section_slug: String,
    pub is_intro: bool,
}

impl Document {
    fn new(item: ContentItem, section_slug: &str) -> Self {
        let source = if item.slug.is_empty() {
            item.id.as_str()
        } else {
            item.slug.as_str()
        };
        let last_segment = source.rsplit('/').next();
        let display_slug = first_slug([last_segment, item.title()], FALLBACK_DOCUMENT_SLUG);
        let is_intro = is_intro(&item);

        Self {
            item,
            display_slug,
            section_slug: section_slug.to_string(),
            is_intro,
        }
    }

    pub fn title(&self) -> &str {
        self.item.title().unwrap_or_default()
    }

    /// Explicit numeric `order`, if any.
    pub fn order(&self) -> Option<f64> {
        self.item.field("order").and_then(FieldValue::as_number)
    }

    pub fn url(&self) -> String {
        build_doc_url(&self.section_slug, Some(&self.display_slug))
    }
}

/// `intro: true`, or a `tags` field containing `intro`.
fn is_intro(item: &ContentItem) -> bool {
    let flagged = item.field("intro").and_then(FieldValue::as_bool) == Some(true);
    let tagged = match item.field("tags") {
        Some(FieldValue::List(tags)) => tags.iter().any(|t| t == "intro"),
        Some(FieldValue::String(tag)) => tag == "intro",
        _ => false,
    };
    flagged || tagged
}

/// A top-level navigation group with its ordered documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    pub has_intro: bool,
    pub documents: Vec<Document>,
}

impl Section {
    fn from_raw(raw: RawSection) -> Self {
        let order = raw.explicit_order();
        let slug = first_slug(
            [raw.title.as_deref(), raw.id.as_deref()],
            FALLBACK_SECTION_SLUG,
        );

        let mut documents: Vec<Document> = raw
            .items
            .into_iter()
            .map(|item| Document::new(item, &slug))
            .collect();
        documents.sort_by(compare_documents);
        let has_intro = documents.iter().any(|d| d.is_intro);

        let id = raw.id.unwrap_or_else(|| slug.clone());
        let title = raw.title.unwrap_or_else(|| id.clone());

        Self {
            id,
            title,
            slug,
            order,
            has_intro,
            documents,
        }
    }

    pub fn url(&self) -> String {
        build_doc_url(&self.slug, None)
    }

    pub fn document(&self, slug: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.display_slug == slug)
    }
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

/// Case-insensitive first, then exact, so the order is total.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// `None` when neither side has an explicit order.
fn compare_explicit_order(a: Option<f64>, b: Option<f64>) -> Option<Ordering> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.total_cmp(&b)),
        (Some(_), None) => Some(Ordering::Less),
        (None, Some(_)) => Some(Ordering::Greater),
        (None, None) => None,
    }
}

fn compare_documents(a: &Document, b: &Document) -> Ordering {
    match (a.is_intro, b.is_intro) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    compare_explicit_order(a.order(), b.order())
        .unwrap_or_else(|| compare_titles(a.title(), b.title()))
}

fn compare_sections(a: &Section, b: &Section) -> Ordering {
    if let Some(ordering) = compare_explicit_order(a.order, b.order) {
        return ordering;
    }
    b.has_intro
        .cmp(&a.has_intro)
        .then_with(|| compare_titles(&a.title, &b.title))
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Ordered sections plus the current selection.
///
/// Selection is plain mutable state; actions need `&mut self`.
#[derive(Debug, Clone)]
pub struct NavigationIndex {
    sections: Vec<Section>,
    current_section: Option<usize>,
    current_document: Option<Document>,
}

impl NavigationIndex {
    /// Build and order the hierarchy. Selection starts on the first section
    /// and its first document.
    #[instrument(skip_all, fields(sections = raw.len()))]
    pub fn new(raw: Vec<RawSection>) -> Self {
        let mut sections: Vec<Section> = raw.into_iter().map(Section::from_raw).collect();
        sections.sort_by(compare_sections);

        let current_section = (!sections.is_empty()).then_some(0);
        let current_document = sections
            .first()
            .and_then(|s| s.documents.first())
            .cloned();

        debug!(
            documents = sections.iter().map(|s| s.documents.len()).sum::<usize>(),
            "navigation index built"
        );

        Self {
            sections,
            current_section,
            current_document,
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn current_section(&self) -> Option<&Section> {
        self.current_section.and_then(|i| self.sections.get(i))
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.current_document.as_ref()
    }

    /// Select a section and its first document. Returns `false` (and leaves
    /// the selection alone) when no section has this slug.
    pub fn select_section(&mut self, slug: &str) -> bool {
        let Some(index) = self.section_index(slug) else {
            debug!(slug, "select_section: no such section");
            return false;
        };
        self.current_section = Some(index);
        self.current_document = self.sections[index].documents.first().cloned();
        true
    }

    /// Select a document, and its section when that section is known.
    pub fn select_document(&mut self, document: &Document) {
        self.current_document = Some(document.clone());
        match self.section_index(&document.section_slug) {
            Some(index) => self.current_section = Some(index),
            None => debug!(section = %document.section_slug, "select_document: section not found, keeping current"),
        }
    }

    pub fn section_by_slug(&self, slug: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.slug == slug)
    }

    pub fn document_by_slug(&self, section_slug: &str, doc_slug: &str) -> Option<&Document> {
        self.section_by_slug(section_slug)?.document(doc_slug)
    }

    /// Resolve a `/documentation/...` path. A bare section path resolves to
    /// the section's first document.
    pub fn resolve_url(&self, path: &str) -> Option<&Document> {
        let DocPath {
            section_slug,
            doc_slug,
        } = parse_doc_url(path);
        let section = self.section_by_slug(section_slug.as_deref()?)?;
        match doc_slug.as_deref() {
            None | Some("index") => section.documents.first(),
            Some(doc) => section.document(doc),
        }
    }

    /// The following document: next in the same section, else the first of
    /// the next section.
    pub fn next_document(&self, document: &Document) -> Option<&Document> {
        let (section_index, doc_index) = self.position(document)?;
        if let Some(next) = self.sections[section_index].documents.get(doc_index + 1) {
            return Some(next);
        }
        self.sections.get(section_index + 1)?.documents.first()
    }

    /// The preceding document: previous in the same section, else the last of
    /// the previous section.
    pub fn previous_document(&self, document: &Document) -> Option<&Document> {
        let (section_index, doc_index) = self.position(document)?;
        if doc_index > 0 {
            return self.sections[section_index].documents.get(doc_index - 1);
        }
        let previous = section_index.checked_sub(1)?;
        self.sections.get(previous)?.documents.last()
    }

    fn section_index(&self, slug: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.slug == slug)
    }

    /// Located by item identity; display slugs can repeat within a section.
    fn position(&self, document: &Document) -> Option<(usize, usize)> {
        let section_index = self.section_index(&document.section_slug)?;
        let doc_index = self.sections[section_index]
            .documents
            .iter()
            .position(|d| d.item.id == document.item.id && d.item.slug == document.item.slug)?;
        Some((section_index, doc_index))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
