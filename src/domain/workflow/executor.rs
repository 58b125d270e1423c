//! Workflow executor trait and result types

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::Workflow;
use super::error::WorkflowError;

/// Version label reported for a step whose prompt never resolved
pub const UNRESOLVED_VERSION: &str = "latest";

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// Result of executing a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub prompt_name: String,
    pub prompt_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    #[serde(default)]
    pub user_message: String,

    pub status: StepStatus,

    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    /// Create a successful step result
    pub fn success(
        step_id: impl Into<String>,
        prompt_name: impl Into<String>,
        prompt_version: impl Into<String>,
        system_message: Option<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            prompt_name: prompt_name.into(),
            prompt_version: prompt_version.into(),
            system_message,
            user_message: user_message.into(),
            status: StepStatus::Success,
            error: None,
        }
    }

    /// Create a failed step result
    pub fn failure(
        step_id: impl Into<String>,
        prompt_name: impl Into<String>,
        prompt_version: Option<&str>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            prompt_name: prompt_name.into(),
            prompt_version: prompt_version.unwrap_or(UNRESOLVED_VERSION).to_string(),
            system_message: None,
            user_message: String::new(),
            status: StepStatus::Error,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Result of running a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunResult {
    pub workflow_id: String,
    pub workflow_name: String,

    /// Every attempted step, in execution order
    pub step_results: Vec<StepResult>,

    /// Rendered user message per successful step
    pub outputs: BTreeMap<String, String>,
}

impl WorkflowRunResult {
    pub fn new(workflow: &Workflow) -> Self {
        Self {
            workflow_id: workflow.id().to_string(),
            workflow_name: workflow.name().to_string(),
            step_results: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Append a step result, recording its output when it succeeded
    pub fn push(&mut self, result: StepResult) {
        if result.is_success() {
            self.outputs
                .insert(result.step_id.clone(), result.user_message.clone());
        }
        self.step_results.push(result);
    }

    /// Whether every attempted step succeeded
    pub fn is_success(&self) -> bool {
        self.step_results.iter().all(StepResult::is_success)
    }

    /// The first failed step, if any
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.step_results.iter().find(|r| !r.is_success())
    }

    /// The last successful step's user message
    pub fn last_output(&self) -> Option<&str> {
        self.step_results
            .iter()
            .rev()
            .find(|r| r.is_success())
            .map(|r| r.user_message.as_str())
    }
}

/// Trait for workflow execution
#[async_trait]
pub trait WorkflowExecutor: Send + Sync + std::fmt::Debug {
    /// Execute a workflow with the given input.
    ///
    /// Ordering problems reject the run before any step executes; step
    /// failures end the run and are reported inside the result.
    async fn execute(
        &self,
        workflow: &Workflow,
        input: Value,
    ) -> Result<WorkflowRunResult, WorkflowError>;
}
