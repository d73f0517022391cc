//! The execution context threaded through a pipeline run.

use crate::errors::ContextConflictError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// An insert-only, insertion-ordered map of context variables.
///
/// Request fields are inserted first, then each agent's output in completion
/// order. A key can be written once; later writes are rejected with
/// [`ContextConflictError`], so the context only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ExecutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from ordered pairs.
    ///
    /// # Errors
    ///
    /// Returns `ContextConflictError` if a key appears twice.
    pub fn from_pairs<K, V>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ContextConflictError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = Self::new();
        for (key, value) in pairs {
            ctx.insert(key, value)?;
        }
        Ok(ctx)
    }

    /// Publishes a new variable.
    ///
    /// # Errors
    ///
    /// Returns `ContextConflictError` if the key already exists.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ContextConflictError> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(ContextConflictError::new(key));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Gets a variable's value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Checks if a variable exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the context has no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the most recently inserted key.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.entries.last().map(|(key, _)| key.as_str())
    }
}

impl Serialize for ExecutionContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut ctx = ExecutionContext::new();
        ctx.insert("x", "foo").unwrap();

        assert_eq!(ctx.get("x"), Some("foo"));
        assert!(ctx.contains_key("x"));
        assert!(ctx.get("y").is_none());
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_insert_rejects_overwrite() {
        let mut ctx = ExecutionContext::new();
        ctx.insert("x", "first").unwrap();

        let err = ctx.insert("x", "second").unwrap_err();
        assert_eq!(err.key, "x");
        assert_eq!(ctx.get("x"), Some("first"));
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let ctx = ExecutionContext::from_pairs([("b", "1"), ("a", "2"), ("c", "3")]).unwrap();

        let keys: Vec<&str> = ctx.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(ctx.last_key(), Some("c"));
    }

    #[test]
    fn test_from_pairs_duplicate() {
        assert!(ExecutionContext::from_pairs([("a", "1"), ("a", "2")]).is_err());
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let ctx = ExecutionContext::from_pairs([("z", "last"), ("a", "first")]).unwrap();
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"z":"last","a":"first"}"#);
    }
}
