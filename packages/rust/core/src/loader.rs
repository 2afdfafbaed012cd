//! Loader seam: where raw items come from.
//!
//! File discovery and front-matter parsing live outside this workspace. An
//! external loader hands over its results as a JSON array of [`RawItem`]s,
//! which [`JsonFileLoader`] reads.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use contentgraph_shared::{ContentGraphError, RawItem, Result};

/// Source of raw, uncompiled items.
pub trait ContentLoader {
    fn load(&self) -> Result<Vec<RawItem>>;
}

impl ContentLoader for Vec<RawItem> {
    fn load(&self) -> Result<Vec<RawItem>> {
        Ok(self.clone())
    }
}

/// Reads a JSON array of raw items from disk.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentLoader for JsonFileLoader {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn load(&self) -> Result<Vec<RawItem>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| ContentGraphError::io(&self.path, e))?;
        parse_items(&content)
    }
}

/// Decode a JSON array of raw items.
///
/// Entries missing their identity fields, or with a blank `id` or
/// `collection`, are skipped with a warning; the rest of the batch still loads.
pub fn parse_items(json: &str) -> Result<Vec<RawItem>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| ContentGraphError::parse(format!("expected a JSON array of items: {e}")))?;

    let total = values.len();
    let items: Vec<RawItem> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match decode_item(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed item");
                None
            }
        })
        .collect();

    debug!(total, loaded = items.len(), "raw items decoded");
    Ok(items)
}

fn decode_item(value: serde_json::Value) -> Result<RawItem> {
    let item: RawItem = serde_json::from_value(value)
        .map_err(|e| ContentGraphError::validation(format!("missing or mistyped identity fields: {e}")))?;
    item.validate()?;
    Ok(item)
}
