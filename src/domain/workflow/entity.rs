//! Workflow domain entity

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::WorkflowError;

/// Maximum length for workflow IDs
pub const MAX_ID_LENGTH: usize = 50;

/// Regex pattern for valid workflow IDs: alphanumeric and hyphens
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Create a new validated workflow ID
    pub fn new(id: impl Into<String>) -> Result<Self, WorkflowError> {
        let id = id.into();
        validate_workflow_id(&id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a workflow ID string
pub fn validate_workflow_id(id: &str) -> Result<(), WorkflowError> {
    if id.is_empty() {
        return Err(WorkflowError::validation("Workflow ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(WorkflowError::validation(format!(
            "Workflow ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(WorkflowError::validation(format!(
            "Invalid workflow ID '{}': must be alphanumeric with hyphens, start and end with alphanumeric",
            id
        )));
    }

    Ok(())
}

/// A step within a workflow: one prompt render plus its predecessors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    /// Unique id for this step within the workflow
    id: String,

    /// Name of the prompt this step renders
    prompt_name: String,

    /// Pinned prompt version; the prompt's default selection otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt_version: Option<String>,

    /// Ids of steps that must complete before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
}

impl WorkflowStep {
    /// Create a new workflow step
    pub fn new(id: impl Into<String>, prompt_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt_name: prompt_name.into(),
            prompt_version: None,
            depends_on: Vec::new(),
        }
    }

    /// Pin the prompt version rendered by this step
    pub fn with_prompt_version(mut self, version: impl Into<String>) -> Self {
        self.prompt_version = Some(version.into());
        self
    }

    /// Add a predecessor
    pub fn depends_on(mut self, step_id: impl Into<String>) -> Self {
        self.depends_on.push(step_id.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prompt_name(&self) -> &str {
        &self.prompt_name
    }

    pub fn prompt_version(&self) -> Option<&str> {
        self.prompt_version.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

/// Reject empty or duplicate step ids
pub fn validate_steps(steps: &[WorkflowStep]) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();

    for step in steps {
        if step.id().is_empty() {
            return Err(WorkflowError::validation("Step ID cannot be empty"));
        }

        if step.prompt_name().is_empty() {
            return Err(WorkflowError::validation(format!(
                "Step '{}' has no prompt name",
                step.id()
            )));
        }

        if !seen.insert(step.id()) {
            return Err(WorkflowError::validation(format!(
                "Duplicate step ID '{}'",
                step.id()
            )));
        }
    }

    Ok(())
}

/// A workflow definition.
///
/// Steps are an unordered set; execution order comes from their
/// dependencies and is only checked when the workflow runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier
    id: WorkflowId,

    /// Human-readable name
    name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    /// Declared steps
    #[serde(default)]
    steps: Vec<WorkflowStep>,

    /// When the workflow was created
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,

    /// When the workflow was last updated
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a new workflow
    pub fn new(id: WorkflowId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // Builder methods

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_steps(mut self, steps: Vec<WorkflowStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get a step by id
    pub fn get_step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id() == id)
    }

    // Setters (mutate and update timestamp)

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    /// Replace all steps at once
    pub fn set_steps(&mut self, steps: Vec<WorkflowStep>) {
        self.steps = steps;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
