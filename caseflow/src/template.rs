//! Instruction templates with `{name}` placeholders.
//!
//! A template is parsed once into literal and placeholder segments.
//! Rendering walks the segments a single time, so substituted values are
//! never scanned for further placeholders.
//!
//! Syntax:
//! - `{identifier}` is a placeholder (`[A-Za-z_][A-Za-z0-9_]*`)
//! - `{{` and `}}` render a literal brace
//! - any other brace text, such as a JSON sample, is kept verbatim

use crate::context::ExecutionContext;
use crate::errors::MissingContextVariable;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed instruction template.
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template string.
    ///
    /// Parsing never fails: anything that is not a placeholder or an escaped
    /// brace is literal text.
    #[must_use]
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut cursor = 0;

        for caps in TOKEN.captures_iter(&source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            literal.push_str(&source[cursor..whole.start()]);
            cursor = whole.end();

            match caps.get(1) {
                Some(name) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.as_str().to_string()));
                }
                None if whole.as_str() == "{{" => literal.push('{'),
                None => literal.push('}'),
            }
        }

        literal.push_str(&source[cursor..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { source, segments }
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns referenced placeholder names, first occurrence order, no repeats.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitutes context values into the template.
    ///
    /// # Errors
    ///
    /// Returns `MissingContextVariable` for the first placeholder with no
    /// value in `ctx`.
    pub fn render(&self, ctx: &ExecutionContext) -> Result<String, MissingContextVariable> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = ctx
                        .get(name)
                        .ok_or_else(|| MissingContextVariable::new(name.as_str()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("placeholders", &self.placeholders())
            .field("len", &self.source.len())
            .finish()
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Self::parse(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx(pairs: &[(&str, &str)]) -> ExecutionContext {
        ExecutionContext::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let template = Template::parse("uses {x} and {y}");
        let rendered = template.render(&ctx(&[("x", "foo"), ("y", "bar")])).unwrap();
        assert_eq!(rendered, "uses foo and bar");
    }

    #[test]
    fn test_render_missing_variable_names_it() {
        let template = Template::parse("uses {x} and {y}");
        let err = template.render(&ctx(&[("x", "foo")])).unwrap_err();
        assert_eq!(err.name, "y");
    }

    #[test]
    fn test_render_is_not_recursive() {
        let template = Template::parse("value: {x}");
        let rendered = template.render(&ctx(&[("x", "{y}"), ("y", "boom")])).unwrap();
        assert_eq!(rendered, "value: {y}");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = Template::parse("{a}-{b}-{a}");
        let context = ctx(&[("a", "1"), ("b", "2")]);
        let first = template.render(&context).unwrap();
        let second = template.render(&context).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "1-2-1");
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let template = Template::parse("{{x}} is not {x}");
        assert_eq!(template.placeholders(), vec!["x"]);
        assert_eq!(template.render(&ctx(&[("x", "1")])).unwrap(), "{x} is not 1");
    }

    #[test]
    fn test_json_samples_are_left_alone() {
        let source = r#"Reply as {"roi": 1.5, "items": [ ]} using {process_analysis}"#;
        let template = Template::parse(source);
        assert_eq!(template.placeholders(), vec!["process_analysis"]);

        let rendered = template.render(&ctx(&[("process_analysis", "P")])).unwrap();
        assert_eq!(rendered, r#"Reply as {"roi": 1.5, "items": [ ]} using P"#);
    }

    #[test]
    fn test_placeholders_deduplicated_in_order() {
        let template = Template::parse("{b} {a} {b} {c}");
        assert_eq!(template.placeholders(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_template_without_placeholders() {
        let template = Template::parse("plain text");
        assert!(template.placeholders().is_empty());
        assert_eq!(template.render(&ExecutionContext::new()).unwrap(), "plain text");
        assert_eq!(template.source(), "plain text");
    }
}
