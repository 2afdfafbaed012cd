//! Core domain types for contentgraph content items.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ContentGraphError, Result};

/// Open metadata of an item: field name to value. A missing key is an absent field.
pub type FieldMap = BTreeMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// The closed set of value kinds an item field can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert a JSON value into a field value.
    ///
    /// Returns `None` for `null`, objects, and arrays holding anything other
    /// than strings.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Total order over present values.
    ///
    /// Values of the same kind compare naturally (numbers via `f64::total_cmp`).
    /// Values of different kinds order by kind: bool < number < string < list.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::String(_) => 2,
            Self::List(_) => 3,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

// ---------------------------------------------------------------------------
// ContentItem
// ---------------------------------------------------------------------------

/// A loaded document with identity, compiled body, and open metadata.
///
/// Items are immutable once loaded; enrichment builds new values with
/// [`ContentItem::with_field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    /// Forward-slash path without leading or trailing slash (e.g. `guide/setup`).
    pub slug: String,
    pub collection: String,
    /// Compiled markup.
    pub content: String,
    /// Additional named fields (title, order, tags, ...).
    #[serde(flatten)]
    pub data: FieldMap,
}

impl ContentItem {
    pub fn new(
        id: impl Into<String>,
        slug: impl Into<String>,
        collection: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            collection: collection.into(),
            content: content.into(),
            data: FieldMap::new(),
        }
    }

    /// Look up any field by name, including the identity fields.
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::from(self.id.as_str())),
            "slug" => Some(FieldValue::from(self.slug.as_str())),
            "collection" => Some(FieldValue::from(self.collection.as_str())),
            "content" => Some(FieldValue::from(self.content.as_str())),
            _ => self.data.get(field).cloned(),
        }
    }

    /// Look up a metadata field without cloning.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.data.get(name)
    }

    /// Return a copy of this item carrying one more (or a replaced) field.
    pub fn with_field(&self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let mut next = self.clone();
        next.data.insert(name.into(), value.into());
        next
    }

    /// The `title` field, when present as a string.
    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(FieldValue::as_str)
    }
}

// ---------------------------------------------------------------------------
// RawItem
// ---------------------------------------------------------------------------

/// An item as handed over by an external loader, before its body is compiled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub id: String,
    pub slug: String,
    pub collection: String,
    /// Front-matter record; anything other than an object is treated as empty.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Raw markdown body.
    #[serde(default)]
    pub body: String,
}

impl RawItem {
    /// An item needs a non-empty `id` and `collection`. The slug may be empty.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ContentGraphError::validation(format!(
                "item with slug '{}' has an empty id",
                self.slug
            )));
        }
        if self.collection.trim().is_empty() {
            return Err(ContentGraphError::validation(format!(
                "item '{}' has an empty collection",
                self.id
            )));
        }
        Ok(())
    }

    /// Convert the raw front-matter into a [`FieldMap`].
    ///
    /// Malformed metadata never rejects the item: a non-object record yields an
    /// empty map and unrepresentable values are dropped, each with a warning.
    pub fn metadata(&self) -> FieldMap {
        let object = match &self.data {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => return FieldMap::new(),
            other => {
                warn!(id = %self.id, kind = json_kind(other), "metadata is not a record, using empty metadata");
                return FieldMap::new();
            }
        };

        let mut fields = FieldMap::new();
        for (key, value) in object {
            match FieldValue::from_json(value) {
                Some(v) => {
                    fields.insert(key.clone(), v);
                }
                None if value.is_null() => {}
                None => warn!(id = %self.id, field = %key, kind = json_kind(value), "dropping unsupported metadata value"),
            }
        }
        fields
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// RawSection
// ---------------------------------------------------------------------------

/// A grouping of items waiting to be ordered into a navigation section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    /// Nested metadata; `meta.order` is honoured when `order` is absent.
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub meta: FieldMap,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

impl RawSection {
    /// The explicit order, read from `order` first, then `meta.order`.
    pub fn explicit_order(&self) -> Option<f64> {
        self.order
            .or_else(|| self.meta.get("order").and_then(FieldValue::as_number))
    }
}
