//! Workflow domain module
//!
//! A workflow is a set of prompt-rendering steps forming a dependency graph.
//! Steps run one at a time in dependency order, and each step's rendered
//! user message is chained into the steps that follow it:
//! - `{{ input }}` - user message of the step that ran just before
//! - `{{ <step-id> }}` - user message of a declared predecessor
//! - any top-level key of the run input

mod context;
mod dag;
mod entity;
mod error;
mod executor;
mod repository;

pub use context::{ChainContext, CHAIN_INPUT_KEY};
pub use dag::topological_order;
pub use entity::{
    validate_steps, validate_workflow_id, Workflow, WorkflowId, WorkflowStep, MAX_ID_LENGTH,
};
pub use error::WorkflowError;
pub use executor::{
    StepResult, StepStatus, WorkflowExecutor, WorkflowRunResult, UNRESOLVED_VERSION,
};
#[cfg(test)]
pub use repository::MockWorkflowRepository;
pub use repository::WorkflowRepository;
