//! JSON catalog seeding the in-memory repositories

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::hierarchy::{ObjectiveRecord, OrgUnit, PolicyRule, Subject};
use crate::domain::prompt::{validate_prompt_name, Prompt};
use crate::domain::workflow::{validate_steps, Workflow};
use crate::domain::DomainError;
use crate::infrastructure::hierarchy::{
    InMemoryObjectiveRepository, InMemoryOrgUnitRepository, InMemoryPolicyRepository,
    InMemorySubjectRepository,
};
use crate::infrastructure::prompt::InMemoryPromptRepository;
use crate::infrastructure::workflow::InMemoryWorkflowRepository;

/// Everything the orchestrator serves, as declared in one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub prompts: Vec<Prompt>,
    pub workflows: Vec<Workflow>,
    pub org_units: Vec<OrgUnit>,
    pub subjects: Vec<Subject>,
    pub policies: Vec<PolicyRule>,
    pub objectives: Vec<ObjectiveRecord>,
}

/// In-memory repositories populated from a catalog
#[derive(Debug, Clone)]
pub struct CatalogRepositories {
    pub prompts: Arc<InMemoryPromptRepository>,
    pub workflows: Arc<InMemoryWorkflowRepository>,
    pub org_units: Arc<InMemoryOrgUnitRepository>,
    pub subjects: Arc<InMemorySubjectRepository>,
    pub policies: Arc<InMemoryPolicyRepository>,
    pub objectives: Arc<InMemoryObjectiveRepository>,
}

impl Catalog {
    /// Parse and validate a catalog document
    pub fn from_json(content: &str) -> Result<Self, DomainError> {
        let catalog: Self = serde_json::from_str(content)
            .map_err(|e| DomainError::configuration(format!("Invalid catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read a catalog file
    pub async fn load(path: &Path) -> Result<Self, DomainError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read catalog '{}': {}",
                path.display(),
                e
            ))
        })?;

        let catalog = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            prompts = catalog.prompts.len(),
            workflows = catalog.workflows.len(),
            org_units = catalog.org_units.len(),
            policies = catalog.policies.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Reject entries the services would refuse to create.
    ///
    /// Dangling references in the hierarchy are allowed; the resolver
    /// truncates walks at missing parents.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut prompt_names = HashSet::new();
        for prompt in &self.prompts {
            validate_prompt_name(prompt.name())?;
            if !prompt_names.insert(prompt.name()) {
                return Err(DomainError::validation(format!(
                    "Duplicate prompt '{}' in catalog",
                    prompt.name()
                )));
            }
            if prompt.versions().is_empty() {
                return Err(DomainError::validation(format!(
                    "Prompt '{}' has no versions",
                    prompt.name()
                )));
            }
            let mut labels = HashSet::new();
            for version in prompt.versions() {
                if !labels.insert(version.version()) {
                    return Err(DomainError::validation(format!(
                        "Prompt '{}' declares version '{}' more than once",
                        prompt.name(),
                        version.version()
                    )));
                }
                version.validate_templates()?;
            }
            if let Some(pinned) = prompt.active_version() {
                if !labels.contains(pinned) {
                    return Err(DomainError::validation(format!(
                        "Prompt '{}' pins unknown version '{}'",
                        prompt.name(),
                        pinned
                    )));
                }
            }
        }

        let mut workflow_ids = HashSet::new();
        for workflow in &self.workflows {
            if !workflow_ids.insert(workflow.id().as_str()) {
                return Err(DomainError::validation(format!(
                    "Duplicate workflow '{}' in catalog",
                    workflow.id()
                )));
            }
            validate_steps(workflow.steps()).map_err(|e| {
                DomainError::validation(format!("Workflow '{}': {}", workflow.id(), e))
            })?;
        }

        let mut unit_ids = HashSet::new();
        for unit in &self.org_units {
            if !unit_ids.insert(unit.id()) {
                return Err(DomainError::validation(format!(
                    "Duplicate org unit '{}' in catalog",
                    unit.id()
                )));
            }
        }

        Ok(())
    }

    pub fn into_repositories(self) -> CatalogRepositories {
        CatalogRepositories {
            prompts: Arc::new(InMemoryPromptRepository::with_prompts(self.prompts)),
            workflows: Arc::new(InMemoryWorkflowRepository::with_workflows(self.workflows)),
            org_units: Arc::new(InMemoryOrgUnitRepository::with_units(self.org_units)),
            subjects: Arc::new(InMemorySubjectRepository::with_subjects(self.subjects)),
            policies: Arc::new(InMemoryPolicyRepository::with_policies(self.policies)),
            objectives: Arc::new(InMemoryObjectiveRepository::with_objectives(self.objectives)),
        }
    }
}
