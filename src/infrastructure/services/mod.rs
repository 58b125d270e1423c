//! Infrastructure services

mod context_service;
mod prompt_handler_registry;
mod prompt_service;
mod workflow_service;

pub use context_service::{apply_policies, ContextService, ExpandRequest, ExpandResult};
pub use prompt_handler_registry::{
    parse_tool_input, tool_name, PromptHandler, PromptHandlerRegistry, TOOL_PREFIX,
};
pub use prompt_service::{CreatePromptRequest, PromptService};
pub use workflow_service::{CreateWorkflowRequest, UpdateWorkflowRequest, WorkflowService};
