//! Reference lookups injected into a run's initial context.

use crate::context::{ExecutionContext, RequestParameters};
use crate::errors::CaseflowError;
use crate::tools::Matcher;
use std::sync::Arc;
use tracing::debug;

/// Matches one request field against a [`Matcher`] and publishes the
/// result under `context_key` before the first agent runs.
#[derive(Clone)]
pub struct ContextLookup {
    matcher: Arc<dyn Matcher>,
    source_field: String,
    context_key: String,
}

impl std::fmt::Debug for ContextLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextLookup")
            .field("matcher", &self.matcher.name())
            .field("source_field", &self.source_field)
            .field("context_key", &self.context_key)
            .finish()
    }
}

impl ContextLookup {
    /// Creates a lookup.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `source_field` is not a request variable or
    /// `context_key` collides with one.
    pub fn new(
        matcher: Arc<dyn Matcher>,
        source_field: impl Into<String>,
        context_key: impl Into<String>,
    ) -> Result<Self, CaseflowError> {
        let source_field = source_field.into();
        let context_key = context_key.into();
        if !RequestParameters::VARIABLES.contains(&source_field.as_str()) {
            return Err(CaseflowError::Config(format!(
                "Lookup source '{source_field}' is not a request field"
            )));
        }
        if RequestParameters::VARIABLES.contains(&context_key.as_str()) {
            return Err(CaseflowError::Config(format!(
                "Lookup key '{context_key}' collides with a request field"
            )));
        }
        Ok(Self {
            matcher,
            source_field,
            context_key,
        })
    }

    /// Returns the context key the result is published under.
    #[must_use]
    pub fn context_key(&self) -> &str {
        &self.context_key
    }

    /// Resolves the lookup and inserts the result into `ctx`.
    ///
    /// A hit is published as JSON; a miss as a short note.
    ///
    /// # Errors
    ///
    /// Returns `ContextConflict` if the key is already set.
    pub fn apply(&self, ctx: &mut ExecutionContext) -> Result<(), CaseflowError> {
        let text = ctx.get(&self.source_field).unwrap_or_default().to_string();
        let value = match self.matcher.find(&text) {
            Some(candidate) => {
                debug!(matcher = self.matcher.name(), key = %candidate.key, "Lookup matched");
                let payload = candidate.detail.unwrap_or_else(|| serde_json::json!(candidate.key));
                serde_json::to_string(&payload)?
            }
            None => format!("No matching record found for '{}'", text.trim()),
        };
        ctx.insert(self.context_key.as_str(), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_request;
    use crate::tools::{CatalogEntry, EntityCatalog};

    fn catalog() -> Arc<dyn Matcher> {
        Arc::new(EntityCatalog::from_entries(vec![CatalogEntry::new(
            "Accounts Payable Automation Playbook",
            "Finance Ops Guild",
        )
        .with_attribute("pages", serde_json::json!(42))]))
    }

    #[test]
    fn test_apply_hit() {
        let lookup = ContextLookup::new(catalog(), "business_scenario", "reference").unwrap();
        let mut ctx = sample_request().to_context();
        lookup.apply(&mut ctx).unwrap();

        let value: serde_json::Value = serde_json::from_str(ctx.get("reference").unwrap()).unwrap();
        assert_eq!(value["pages"], 42);
        assert_eq!(ctx.last_key(), Some("reference"));
    }

    #[test]
    fn test_apply_miss() {
        let lookup = ContextLookup::new(catalog(), "current_state", "reference").unwrap();
        let mut ctx = sample_request().to_context();
        lookup.apply(&mut ctx).unwrap();
        assert!(ctx.get("reference").unwrap().starts_with("No matching record found"));
    }

    #[test]
    fn test_rejects_bad_fields() {
        assert!(ContextLookup::new(catalog(), "nope", "reference").is_err());
        assert!(ContextLookup::new(catalog(), "business_scenario", "current_state").is_err());
    }
}
