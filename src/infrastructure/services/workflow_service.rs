//! Workflow service - CRUD operations and runs for workflows

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::domain::workflow::{
    validate_steps, Workflow, WorkflowError, WorkflowExecutor, WorkflowId, WorkflowRepository,
    WorkflowRunResult, WorkflowStep,
};
use crate::domain::DomainError;

/// Request to create a new workflow
#[derive(Debug, Clone)]
pub struct CreateWorkflowRequest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<WorkflowStep>,
}

impl CreateWorkflowRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            steps: Vec::new(),
        }
    }

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
}

/// Request to update an existing workflow
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkflowRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    /// Replaces every step when present
    pub steps: Option<Vec<WorkflowStep>>,
}

impl UpdateWorkflowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_steps(mut self, steps: Vec<WorkflowStep>) -> Self {
        self.steps = Some(steps);
        self
    }
}

/// Workflow service for CRUD operations and runs
pub struct WorkflowService {
    repository: Arc<dyn WorkflowRepository>,
    executor: Arc<dyn WorkflowExecutor>,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService").finish()
    }
}

impl WorkflowService {
    /// Create a new workflow service
    pub fn new(repository: Arc<dyn WorkflowRepository>, executor: Arc<dyn WorkflowExecutor>) -> Self {
        Self {
            repository,
            executor,
        }
    }

    /// Get a workflow by ID
    pub async fn get(&self, id: &str) -> Result<Option<Workflow>, DomainError> {
        let workflow_id = self.parse_id(id)?;
        self.repository.get(&workflow_id).await
    }

    /// Get a workflow by ID, returning an error if not found
    pub async fn get_required(&self, id: &str) -> Result<Workflow, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow '{}' not found", id)))
    }

    /// List all workflows
    pub async fn list(&self) -> Result<Vec<Workflow>, DomainError> {
        self.repository.list().await
    }

    /// Create a new workflow
    pub async fn create(&self, request: CreateWorkflowRequest) -> Result<Workflow, DomainError> {
        let workflow_id = self.parse_id(&request.id)?;

        if self.repository.exists(&workflow_id).await? {
            return Err(DomainError::conflict(format!(
                "Workflow '{}' already exists",
                request.id
            )));
        }

        check_steps(&request.steps)?;

        let mut workflow = Workflow::new(workflow_id, request.name).with_steps(request.steps);
        if let Some(description) = request.description {
            workflow = workflow.with_description(description);
        }

        let created = self.repository.create(workflow).await?;
        info!(workflow_id = %created.id(), steps = created.step_count(), "Created workflow");
        Ok(created)
    }

    /// Update an existing workflow
    pub async fn update(
        &self,
        id: &str,
        request: UpdateWorkflowRequest,
    ) -> Result<Workflow, DomainError> {
        let mut workflow = self.get_required(id).await?;

        if let Some(name) = request.name {
            workflow.set_name(name);
        }

        if let Some(description) = request.description {
            workflow.set_description(description);
        }

        if let Some(steps) = request.steps {
            check_steps(&steps)?;
            workflow.set_steps(steps);
        }

        self.repository.update(workflow).await
    }

    /// Delete a workflow
    pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let workflow_id = self.parse_id(id)?;
        self.repository.delete(&workflow_id).await
    }

    /// Run a workflow with the given input.
    ///
    /// Step failures are reported in the result; only problems that stop
    /// the run from starting are errors.
    pub async fn run(&self, id: &str, input: Value) -> Result<WorkflowRunResult, WorkflowError> {
        let workflow_id = WorkflowId::new(id)?;

        let workflow = self
            .repository
            .get(&workflow_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(id))?;

        self.executor.execute(&workflow, input).await
    }

    /// Parse and validate a workflow ID
    fn parse_id(&self, id: &str) -> Result<WorkflowId, DomainError> {
        WorkflowId::new(id).map_err(|e| DomainError::validation(e.to_string()))
    }
}

fn check_steps(steps: &[WorkflowStep]) -> Result<(), DomainError> {
    validate_steps(steps).map_err(|e| DomainError::validation(e.to_string()))
}
