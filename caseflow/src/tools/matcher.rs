//! The matcher seam shared by lookup and classification tools.

use serde::{Deserialize, Serialize};

/// A hit returned by a [`Matcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable key of the matched entry or rule.
    pub key: String,
    /// The text fragment or name that matched.
    pub matched: String,
    /// Optional structured payload (a catalog record, for instance).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl Candidate {
    /// Creates a candidate without a payload.
    #[must_use]
    pub fn new(key: impl Into<String>, matched: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            matched: matched.into(),
            detail: None,
        }
    }

    /// Attaches a payload.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Finds the best candidate for a piece of free text.
pub trait Matcher: Send + Sync {
    /// Returns the matcher's name, used in logs.
    fn name(&self) -> &str;

    /// Returns the first candidate for `text`, if any.
    fn find(&self, text: &str) -> Option<Candidate>;
}

/// A labelled group of keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Label reported as the candidate key.
    pub label: String,
    /// Lowercase keywords; any substring hit selects the rule.
    pub keywords: Vec<String>,
}

impl KeywordRule {
    /// Creates a rule.
    #[must_use]
    pub fn new<I, S>(label: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }
}

/// Classifies text by the first rule with a keyword contained in it.
///
/// Rules are tried in order; matching is a case-insensitive substring test.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    name: String,
    rules: Vec<KeywordRule>,
}

impl KeywordMatcher {
    /// Creates an empty matcher.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Appends a rule.
    #[must_use]
    pub fn rule(mut self, rule: KeywordRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the configured rules.
    #[must_use]
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }
}

impl Matcher for KeywordMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, text: &str) -> Option<Candidate> {
        let lowered = text.to_lowercase();
        self.rules.iter().find_map(|rule| {
            rule.keywords
                .iter()
                .find(|keyword| lowered.contains(keyword.as_str()))
                .map(|keyword| Candidate::new(&rule.label, keyword))
        })
    }
}
