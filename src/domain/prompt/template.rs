//! Prompt template parsing and rendering
//!
//! Templates use double-brace expressions:
//! - `{{ name }}` - Required variable, error if not bound
//! - `{{ user.name }}` - Field lookup inside a bound JSON object
//! - `{{ include_prompt('other') }}` - Embed another prompt's rendered output
//!
//! Nothing else is evaluated, and `{% %}` / `{# #}` blocks are rejected. The only things a template can reach are the
//! bindings map and the include resolver handed to [`PromptTemplate::render`].

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Variable bindings a template is rendered against
pub type Bindings = Map<String, Value>;

/// Regex to match any `{{ ... }}` expression, possibly spanning lines
static EXPRESSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").unwrap());

/// A variable path: identifier optionally followed by `.field` segments
static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_-]*(?:\.[a-zA-Z0-9_-]+)*$").unwrap()
});

/// The include directive with a single- or double-quoted prompt name
static INCLUDE_CALL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^include_prompt\(\s*(?:'([^']*)'|"([^"]*)")\s*\)$"#).unwrap()
});

/// Loose include scan used for pre-fetching, no full parse
static INCLUDE_SCAN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"include_prompt\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap()
});

/// Template processing errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("Missing required variable: {name}")]
    MissingVariable { name: String },

    #[error("Template parsing error: {message}")]
    ParseError { message: String },
}

impl TemplateError {
    fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Variable(String),
    Include(String),
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Original template content
    content: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template string into literal text and expressions
    pub fn parse(content: impl Into<String>) -> Result<Self, TemplateError> {
        let content = content.into();
        let mut segments = Vec::new();
        let mut cursor = 0;

        for cap in EXPRESSION_PATTERN.captures_iter(&content) {
            let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
                continue;
            };

            if whole.start() > cursor {
                let text = &content[cursor..whole.start()];
                check_literal(text)?;
                segments.push(Segment::Text(text.to_string()));
            }
            segments.push(parse_expression(inner.as_str().trim())?);
            cursor = whole.end();
        }

        let tail = &content[cursor..];
        if tail.contains("{{") {
            return Err(TemplateError::parse("unclosed '{{' expression"));
        }
        check_literal(tail)?;
        if !tail.is_empty() {
            segments.push(Segment::Text(tail.to_string()));
        }

        Ok(Self { content, segments })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Variable paths referenced by the template, deduplicated in order
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(path) => Some(path.as_str()),
                _ => None,
            })
            .filter(|path| seen.insert(*path))
            .collect()
    }

    /// Prompt names included by the template, deduplicated in order
    pub fn includes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Include(name) => Some(name.as_str()),
                _ => None,
            })
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Render against the bindings, delegating include directives to `include`
    pub fn render<F>(&self, bindings: &Bindings, mut include: F) -> Result<String, TemplateError>
    where
        F: FnMut(&str) -> Result<String, TemplateError>,
    {
        let mut result = String::with_capacity(self.content.len());

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => result.push_str(text),
                Segment::Variable(path) => {
                    let value = lookup(bindings, path).ok_or_else(|| {
                        TemplateError::MissingVariable { name: path.clone() }
                    })?;
                    result.push_str(&value_to_string(value));
                }
                Segment::Include(name) => result.push_str(&include(name)?),
            }
        }

        Ok(result)
    }
}

/// Statement and comment blocks are not supported
fn check_literal(text: &str) -> Result<(), TemplateError> {
    for delimiter in ["{%", "{#"] {
        if text.contains(delimiter) {
            return Err(TemplateError::parse(format!(
                "unsupported block '{}'",
                delimiter
            )));
        }
    }
    Ok(())
}

fn parse_expression(expression: &str) -> Result<Segment, TemplateError> {
    if expression.is_empty() {
        return Err(TemplateError::parse("empty expression"));
    }

    if let Some(caps) = INCLUDE_CALL_PATTERN.captures(expression) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();

        if name.is_empty() {
            return Err(TemplateError::parse("include_prompt requires a prompt name"));
        }
        return Ok(Segment::Include(name.to_string()));
    }

    if VARIABLE_PATTERN.is_match(expression) {
        return Ok(Segment::Variable(expression.to_string()));
    }

    Err(TemplateError::parse(format!(
        "unsupported expression '{}'",
        expression
    )))
}

/// Look up a dotted path in the bindings
pub fn lookup<'a>(bindings: &'a Bindings, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = bindings.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Convert a bound value to its rendered text
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Scan raw template text for included prompt names without parsing it
pub fn scan_includes(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    INCLUDE_SCAN_PATTERN
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bindings(value: Value) -> Bindings {
        match value {
            Value::Object(map) => map,
            _ => panic!("bindings must be an object"),
        }
    }

    fn no_includes(name: &str) -> Result<String, TemplateError> {
        panic!("unexpected include of '{}'", name)
    }

    #[test]
    fn test_parse_no_expressions() {
        let template = PromptTemplate::parse("Hello, world!").unwrap();
        assert!(template.variables().is_empty());
        assert!(template.includes().is_empty());
    }

    #[test]
    fn test_render_variable() {
        let template = PromptTemplate::parse("Hello {{ input }}").unwrap();
        let result = template
            .render(&bindings(json!({"input": "Bob"})), no_includes)
            .unwrap();

        assert_eq!(result, "Hello Bob");
    }

    #[test]
    fn test_render_without_spaces() {
        let template = PromptTemplate::parse("{{name}}!").unwrap();
        let result = template
            .render(&bindings(json!({"name": "world"})), no_includes)
            .unwrap();

        assert_eq!(result, "world!");
    }

    #[test]
    fn test_missing_variable_names_exactly_the_variable() {
        let template = PromptTemplate::parse("Hello {{ name }}, about {{ topic }}").unwrap();
        let result = template.render(&bindings(json!({"name": "Ann"})), no_includes);

        assert_eq!(
            result,
            Err(TemplateError::MissingVariable {
                name: "topic".to_string()
            })
        );
    }

    #[test]
    fn test_null_binding_is_present() {
        let template = PromptTemplate::parse("[{{ value }}]").unwrap();
        let result = template
            .render(&bindings(json!({"value": null})), no_includes)
            .unwrap();

        assert_eq!(result, "[]");
    }

    #[test]
    fn test_nested_lookup() {
        let template = PromptTemplate::parse("{{ user.name }} #{{ items.1 }}").unwrap();
        let values = bindings(json!({"user": {"name": "Ann"}, "items": [1, 2]}));

        assert_eq!(template.render(&values, no_includes).unwrap(), "Ann #2");
    }

    #[test]
    fn test_nested_lookup_missing_field() {
        let template = PromptTemplate::parse("{{ user.email }}").unwrap();
        let result = template.render(&bindings(json!({"user": {"name": "Ann"}})), no_includes);

        assert_eq!(
            result,
            Err(TemplateError::MissingVariable {
                name: "user.email".to_string()
            })
        );
    }

    #[test]
    fn test_non_string_values() {
        let template = PromptTemplate::parse("{{ n }} {{ ok }} {{ list }}").unwrap();
        let values = bindings(json!({"n": 42, "ok": true, "list": ["a"]}));

        assert_eq!(template.render(&values, no_includes).unwrap(), r#"42 true ["a"]"#);
    }

    #[test]
    fn test_attribute_traversal_rejected() {
        for source in [
            "{{ input.__class__() }}",
            "{{ config['SECRET'] }}",
            "{{ 1 + 1 }}",
            "{{ range(10) }}",
            "{{ include_prompt(name) }}",
        ] {
            let result = PromptTemplate::parse(source);
            assert!(
                matches!(result, Err(TemplateError::ParseError { .. })),
                "expected parse error for {}",
                source
            );
        }
    }

    #[test]
    fn test_statement_and_comment_blocks_rejected() {
        for source in [
            "{% for x in items %}{{ x }}{% endfor %}",
            "Hello {{ name }} {# note #}",
            "{% import os %}",
        ] {
            let result = PromptTemplate::parse(source);
            assert!(
                matches!(result, Err(TemplateError::ParseError { .. })),
                "expected parse error for {}",
                source
            );
        }
    }

    #[test]
    fn test_unclosed_expression() {
        let result = PromptTemplate::parse("Hello {{ name");
        assert!(matches!(result, Err(TemplateError::ParseError { .. })));
    }

    #[test]
    fn test_include_delegates_to_resolver() {
        let template =
            PromptTemplate::parse("Before {{ include_prompt('helper') }} After").unwrap();
        assert_eq!(template.includes(), vec!["helper"]);

        let mut calls = Vec::new();
        let result = template
            .render(&Bindings::new(), |name| {
                calls.push(name.to_string());
                Ok(format!("<{}>", name))
            })
            .unwrap();

        assert_eq!(result, "Before <helper> After");
        assert_eq!(calls, vec!["helper"]);
    }

    #[test]
    fn test_include_double_quotes() {
        let template = PromptTemplate::parse(r#"{{ include_prompt("sys-helper") }}"#).unwrap();
        assert_eq!(template.includes(), vec!["sys-helper"]);
    }

    #[test]
    fn test_variables_deduplicated() {
        let template = PromptTemplate::parse("{{ a }} {{ b }} {{ a }}").unwrap();
        assert_eq!(template.variables(), vec!["a", "b"]);
    }

    #[test]
    fn test_scan_includes() {
        let names = scan_includes(
            "x {{ include_prompt('one') }} {{include_prompt(\"two\")}} {{ include_prompt('one') }}",
        );

        assert_eq!(names, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_multiline_template() {
        let template =
            PromptTemplate::parse("Main task: {{ input }}\n\nContext:\n{{ include_prompt('helper') }}")
                .unwrap();
        let result = template
            .render(&bindings(json!({"input": "do something"})), |_| {
                Ok("helper output".to_string())
            })
            .unwrap();

        assert_eq!(result, "Main task: do something\n\nContext:\nhelper output");
    }
}
