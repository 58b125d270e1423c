//! Workflow error types

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that reject a workflow operation as a whole.
///
/// Failures of individual steps are not errors at this level; they are
/// recorded in the run result.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Circular dependency detected in workflow steps: {0}")]
    CycleDetected(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn step_not_found(name: impl Into<String>) -> Self {
        Self::StepNotFound(name.into())
    }

    pub fn cycle_detected(steps: impl Into<String>) -> Self {
        Self::CycleDetected(steps.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl From<DomainError> for WorkflowError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotFound { message } => Self::NotFound(message),
            DomainError::Validation { message } => Self::Validation(message),
            other => Self::Storage(other.to_string()),
        }
    }
}
