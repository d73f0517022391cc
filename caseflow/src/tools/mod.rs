//! Lookup and classification tools.
//!
//! Every tool implements [`Matcher`], so the session tracker and the
//! refinement step can treat catalogs, screens and keyword rules alike.

mod catalog;
mod matcher;
mod screen;

pub use catalog::{CatalogEntry, EntityCatalog};
pub use matcher::{Candidate, KeywordMatcher, KeywordRule, Matcher};
pub use screen::{KeywordScreen, DEFAULT_BANNED_WORDS};
