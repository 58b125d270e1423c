//! Workflow repository trait

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::entity::{Workflow, WorkflowId};
use crate::domain::DomainError;

/// Repository trait for workflow persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkflowRepository: Send + Sync + std::fmt::Debug {
    /// Get a workflow by ID
    async fn get(&self, id: &WorkflowId) -> Result<Option<Workflow>, DomainError>;

    /// List all workflows
    async fn list(&self) -> Result<Vec<Workflow>, DomainError>;

    /// Create a new workflow
    async fn create(&self, workflow: Workflow) -> Result<Workflow, DomainError>;

    /// Update an existing workflow
    async fn update(&self, workflow: Workflow) -> Result<Workflow, DomainError>;

    /// Delete a workflow by ID
    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError>;

    /// Check if a workflow exists
    async fn exists(&self, id: &WorkflowId) -> Result<bool, DomainError> {
        Ok(self.get(id).await?.is_some())
    }
}
