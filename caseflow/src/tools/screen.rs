//! Keyword screening of free-text request fields.

use super::{Candidate, Matcher};
use crate::context::RequestParameters;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Default screening list.
pub const DEFAULT_BANNED_WORDS: &[&str] = &[
    "violence", "death", "kill", "murder", "blood", "gore", "scary", "horror", "nightmare",
    "terror", "weapon", "gun", "war", "battle", "fight", "attack", "dangerous",
];

/// Flags configured words in text.
///
/// Words match case-insensitively on word boundaries, so `war` does not
/// flag `software`. Hits are advisory and become session warnings.
#[derive(Debug, Clone)]
pub struct KeywordScreen {
    words: Vec<String>,
    pattern: Option<Regex>,
}

impl KeywordScreen {
    /// Builds a screen for the given words. Blank entries are ignored.
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let pattern = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
                .case_insensitive(true)
                .build()
                .ok()
        };

        Self { words, pattern }
    }

    /// Returns the screened words.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Returns the distinct screened words found in `text`, in list order.
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        let found: Vec<String> = pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        self.words
            .iter()
            .filter(|w| found.contains(*w))
            .cloned()
            .collect()
    }

    /// Screens every free-text field of a request.
    ///
    /// Returns one warning per field with hits.
    #[must_use]
    pub fn screen(&self, request: &RequestParameters) -> Vec<String> {
        let mut warnings = Vec::new();
        for (field, text) in request.text_fields() {
            let hits = self.scan(text);
            if !hits.is_empty() {
                debug!(field, hits = ?hits, "Screened words found");
                warnings.push(format!(
                    "Field '{field}' contains potentially inappropriate content: {}",
                    hits.join(", ")
                ));
            }
        }
        warnings
    }
}

impl Default for KeywordScreen {
    fn default() -> Self {
        Self::new(DEFAULT_BANNED_WORDS)
    }
}

impl Matcher for KeywordScreen {
    fn name(&self) -> &str {
        "keyword_screen"
    }

    fn find(&self, text: &str) -> Option<Candidate> {
        self.scan(text)
            .into_iter()
            .next()
            .map(|word| Candidate::new("screened_word", word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::sample_request;

    #[test]
    fn test_scan_word_boundaries() {
        let screen = KeywordScreen::default();
        assert!(screen.scan("Our software warranty process").is_empty());
        assert_eq!(screen.scan("A WAR room to fight backlog"), vec!["war", "fight"]);
    }

    #[test]
    fn test_scan_deduplicates() {
        let screen = KeywordScreen::new(["gun"]);
        assert_eq!(screen.scan("gun, gun and Gun"), vec!["gun"]);
    }

    #[test]
    fn test_screen_request_fields() {
        let mut request = sample_request();
        request.current_state = "Every month-end is a battle with spreadsheets".to_string();

        let warnings = KeywordScreen::default().screen(&request);
        assert_eq!(
            warnings,
            vec!["Field 'current_state' contains potentially inappropriate content: battle"
                .to_string()]
        );
    }

    #[test]
    fn test_clean_request_has_no_warnings() {
        assert!(KeywordScreen::default().screen(&sample_request()).is_empty());
    }

    #[test]
    fn test_empty_screen_and_matcher() {
        let screen = KeywordScreen::new(Vec::<String>::new());
        assert!(screen.scan("war").is_empty());
        assert!(screen.find("war").is_none());

        let hit = KeywordScreen::default().find("danger is not dangerous").unwrap();
        assert_eq!(hit.matched, "dangerous");
    }
}
