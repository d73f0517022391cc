//! JSON-backed entity catalog with approximate-name lookup.

use super::{Candidate, Matcher};
use crate::errors::ToolError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One catalog record.
///
/// `title` and `author` drive lookup; every other field is carried through
/// untouched in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display title.
    pub title: String,
    /// Author or owner.
    #[serde(default)]
    pub author: String,
    /// Remaining fields.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl CatalogEntry {
    /// Creates an entry without extra attributes.
    #[must_use]
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            attributes: serde_json::Map::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    fn byline(&self) -> String {
        format!("{} by {}", self.title, self.author)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { books: Vec<CatalogEntry> },
    Entries { entries: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

impl CatalogFile {
    fn into_entries(self) -> Vec<CatalogEntry> {
        match self {
            Self::Wrapped { books } => books,
            Self::Entries { entries } => entries,
            Self::Bare(entries) => entries,
        }
    }
}

/// An in-memory catalog of reference records.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entries: Vec<CatalogEntry>,
}

impl EntityCatalog {
    /// Creates a catalog from records.
    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Parses a catalog from JSON text.
    ///
    /// Accepts a bare array or an object with a `books` or `entries` array.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::Malformed` if the JSON does not match.
    pub fn from_json(origin: &str, json: &str) -> Result<Self, ToolError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| ToolError::malformed(origin, e.to_string()))?;
        Ok(Self::from_entries(file.into_entries()))
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::LoadFailed` if the file cannot be read and
    /// `ToolError::Malformed` if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ToolError::load_failed(&origin, e.to_string()))?;
        let catalog = Self::from_json(&origin, &json)?;
        info!(path = %origin, entries = catalog.len(), "Loaded entity catalog");
        Ok(catalog)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all records.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Looks a record up by approximate name.
    ///
    /// Tries a case-insensitive substring of each title first, then of
    /// `"title by author"`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.title.to_lowercase().contains(&needle))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.byline().to_lowercase().contains(&needle))
            })
    }

    /// Returns records whose title, author or string attributes contain
    /// every whitespace-separated term of `query`.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| {
                let haystack = searchable_text(entry);
                terms.iter().all(|term| haystack.contains(term.as_str()))
            })
            .collect()
    }
}

fn searchable_text(entry: &CatalogEntry) -> String {
    let mut text = entry.byline();
    for value in entry.attributes.values() {
        if let serde_json::Value::String(s) = value {
            text.push(' ');
            text.push_str(s);
        }
    }
    text.to_lowercase()
}

impl Matcher for EntityCatalog {
    fn name(&self) -> &str {
        "entity_catalog"
    }

    fn find(&self, text: &str) -> Option<Candidate> {
        let entry = self.lookup(text)?;
        let detail = serde_json::to_value(entry).ok();
        let candidate = Candidate::new(&entry.title, text.trim());
        Some(match detail {
            Some(detail) => candidate.with_detail(detail),
            None => candidate,
        })
    }
}
