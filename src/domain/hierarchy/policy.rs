//! Policy rules

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::{OrgUnitId, ProjectId};

/// Where a policy applies
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyScope {
    /// Not attached to any org unit or project; never picked up by resolution
    #[default]
    Unscoped,
    OrgUnit(OrgUnitId),
    Project(ProjectId),
}

/// How a policy alters rendered text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementKind {
    /// Placed before the system message
    Prepend,
    /// Placed after the user message
    Append,
    /// Appended to the system message
    Inject,
    /// Listed as a rule; does not alter text
    Validate,
}

impl EnforcementKind {
    pub fn alters_text(&self) -> bool {
        !matches!(self, Self::Validate)
    }
}

impl fmt::Display for EnforcementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepend => write!(f, "prepend"),
            Self::Append => write!(f, "append"),
            Self::Inject => write!(f, "inject"),
            Self::Validate => write!(f, "validate"),
        }
    }
}

/// An organization-wide rule layered over rendered prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    scope: PolicyScope,
    kind: EnforcementKind,
    content: String,
    #[serde(default)]
    priority: i32,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl PolicyRule {
    pub fn new(name: impl Into<String>, kind: EnforcementKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            scope: PolicyScope::Unscoped,
            kind,
            content: content.into(),
            priority: 0,
            active: true,
        }
    }

    // Builder methods

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn for_org_unit(mut self, org_unit_id: OrgUnitId) -> Self {
        self.scope = PolicyScope::OrgUnit(org_unit_id);
        self
    }

    pub fn for_project(mut self, project_id: ProjectId) -> Self {
        self.scope = PolicyScope::Project(project_id);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    // Getters

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn scope(&self) -> &PolicyScope {
        &self.scope
    }

    pub fn kind(&self) -> EnforcementKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn applies_to_org_unit(&self, org_unit_id: &OrgUnitId) -> bool {
        matches!(&self.scope, PolicyScope::OrgUnit(id) if id == org_unit_id)
    }

    pub fn applies_to_project(&self, project_id: &ProjectId) -> bool {
        matches!(&self.scope, PolicyScope::Project(id) if id == project_id)
    }
}
