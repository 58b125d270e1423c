//! Prompt entity and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::template::{PromptTemplate, TemplateError};
use crate::domain::DomainError;

/// Maximum length for prompt names
pub const MAX_PROMPT_NAME_LENGTH: usize = 100;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap());

/// Validate a prompt name: alphanumeric, hyphens and underscores
pub fn validate_prompt_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::validation("Prompt name cannot be empty"));
    }

    if name.len() > MAX_PROMPT_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Prompt name exceeds maximum length of {} characters",
            MAX_PROMPT_NAME_LENGTH
        )));
    }

    if !NAME_PATTERN.is_match(name) {
        return Err(DomainError::validation(format!(
            "Invalid prompt name '{}': must start alphanumeric and contain only alphanumerics, '-' or '_'",
            name
        )));
    }

    Ok(())
}

/// An immutable versioned snapshot of a prompt's templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    /// Version label, unique within the prompt (e.g. "1.0.0")
    version: String,
    /// Optional system message template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_template: Option<String>,
    /// User message template
    user_template: String,
    /// Declared input schema, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_schema: Option<Value>,
    /// Tags for categorization
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    /// When this version was created
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl PromptVersion {
    pub fn new(version: impl Into<String>, user_template: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            system_template: None,
            user_template: user_template.into(),
            input_schema: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_system_template(mut self, template: impl Into<String>) -> Self {
        self.system_template = Some(template.into());
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn system_template(&self) -> Option<&str> {
        self.system_template.as_deref()
    }

    pub fn user_template(&self) -> &str {
        &self.user_template
    }

    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check that both templates parse
    pub fn validate_templates(&self) -> Result<(), TemplateError> {
        if let Some(system) = &self.system_template {
            PromptTemplate::parse(system.as_str())?;
        }
        PromptTemplate::parse(self.user_template.as_str())?;
        Ok(())
    }
}

/// A named prompt with its version history.
///
/// Versions are kept most-recent-first and are never modified once added;
/// only the pinned active version and the deprecation flag change over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique prompt name
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    deprecated: bool,
    /// Pinned version label, overriding "most recent" selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_version: Option<String>,
    /// Version history, most recent first
    #[serde(default)]
    versions: Vec<PromptVersion>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Create a prompt with its first version
    pub fn new(name: impl Into<String>, first_version: PromptVersion) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            deprecated: false,
            active_version: None,
            versions: vec![first_version],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a newer version; used when building fixtures
    pub fn with_version(mut self, version: PromptVersion) -> Self {
        self.versions.insert(0, version);
        self
    }

    pub fn with_active_version(mut self, label: impl Into<String>) -> Self {
        self.active_version = Some(label.into());
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    // Getters

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn active_version(&self) -> Option<&str> {
        self.active_version.as_deref()
    }

    pub fn versions(&self) -> &[PromptVersion] {
        &self.versions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The most recently created version
    pub fn latest_version(&self) -> Option<&PromptVersion> {
        self.versions.first()
    }

    pub fn get_version(&self, label: &str) -> Option<&PromptVersion> {
        self.versions.iter().find(|v| v.version == label)
    }

    /// Select the version to render.
    ///
    /// An explicit label must match exactly. Without one, the pinned version
    /// wins over the most recent one. Deprecated prompts select nothing.
    pub fn select_version(&self, requested: Option<&str>) -> Option<&PromptVersion> {
        if self.deprecated {
            return None;
        }

        match requested {
            Some(label) => self.get_version(label),
            None => self
                .active_version
                .as_deref()
                .and_then(|label| self.get_version(label))
                .or_else(|| self.latest_version()),
        }
    }

    // Mutators

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    /// Append a new version, which becomes the most recent one
    pub fn add_version(&mut self, version: PromptVersion) -> Result<(), DomainError> {
        if self.get_version(version.version()).is_some() {
            return Err(DomainError::conflict(format!(
                "Version '{}' already exists for prompt '{}'",
                version.version(),
                self.name
            )));
        }

        self.versions.insert(0, version);
        self.touch();
        Ok(())
    }

    /// Pin the active version. Returns false if the label does not exist.
    pub fn pin_version(&mut self, label: &str) -> bool {
        if self.get_version(label).is_none() {
            return false;
        }

        self.active_version = Some(label.to_string());
        self.touch();
        true
    }

    pub fn deprecate(&mut self) {
        self.deprecated = true;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versioned_prompt() -> Prompt {
        Prompt::new("pin-test", PromptVersion::new("1.0.0", "v1: {{ input }}"))
            .with_version(PromptVersion::new("2.0.0", "v2: {{ input }}"))
    }

    #[test]
    fn test_validate_prompt_name() {
        assert!(validate_prompt_name("feature-prd").is_ok());
        assert!(validate_prompt_name("snake_case_1").is_ok());
        assert!(validate_prompt_name("").is_err());
        assert!(validate_prompt_name("-leading").is_err());
        assert!(validate_prompt_name("has space").is_err());
        assert!(validate_prompt_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_latest_version_is_default() {
        let prompt = versioned_prompt();

        assert_eq!(prompt.select_version(None).unwrap().version(), "2.0.0");
    }

    #[test]
    fn test_pinned_version_wins_over_newer() {
        let mut prompt = versioned_prompt();
        assert!(prompt.pin_version("1.0.0"));

        prompt
            .add_version(PromptVersion::new("3.0.0", "v3"))
            .unwrap();

        assert_eq!(prompt.select_version(None).unwrap().version(), "1.0.0");
        assert_eq!(prompt.latest_version().unwrap().version(), "3.0.0");
    }

    #[test]
    fn test_explicit_version_must_match() {
        let prompt = versioned_prompt();

        assert_eq!(
            prompt.select_version(Some("1.0.0")).unwrap().version(),
            "1.0.0"
        );
        assert!(prompt.select_version(Some("9.9.9")).is_none());
    }

    #[test]
    fn test_pin_unknown_version() {
        let mut prompt = versioned_prompt();

        assert!(!prompt.pin_version("9.9.9"));
        assert!(prompt.active_version().is_none());
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let mut prompt = versioned_prompt();
        let result = prompt.add_version(PromptVersion::new("1.0.0", "again"));

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(prompt.versions().len(), 2);
    }

    #[test]
    fn test_deprecated_selects_nothing() {
        let mut prompt = versioned_prompt();
        prompt.deprecate();

        assert!(prompt.is_deprecated());
        assert!(prompt.select_version(None).is_none());
        assert!(prompt.select_version(Some("1.0.0")).is_none());
    }

    #[test]
    fn test_deserialize_from_catalog_json() {
        let prompt: Prompt = serde_json::from_value(serde_json::json!({
            "name": "helper",
            "versions": [
                {"version": "1.1.0", "user_template": "newer", "tags": ["util"]},
                {"version": "1.0.0", "system_template": "sys", "user_template": "older"}
            ]
        }))
        .unwrap();

        assert_eq!(prompt.latest_version().unwrap().version(), "1.1.0");
        assert_eq!(prompt.latest_version().unwrap().tags(), &["util"]);
        assert_eq!(prompt.get_version("1.0.0").unwrap().system_template(), Some("sys"));
        assert!(!prompt.is_deprecated());
    }
}
