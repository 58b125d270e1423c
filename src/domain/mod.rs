//! Domain layer - Core business logic and entities

pub mod error;
pub mod hierarchy;
pub mod prompt;
pub mod workflow;

pub use error::DomainError;
pub use hierarchy::{
    EffectiveConfig, EnforcementKind, HierarchyResolver, LayeredEntry, ObjectiveRecord, OrgUnit,
    OrgUnitId, PolicyRule, ProjectId, Subject, SubjectId,
};
pub use prompt::{
    Bindings, Prompt, PromptRepository, PromptTemplate, PromptVersion, RenderResult,
    TemplateComposer, TemplateError,
};
pub use workflow::{
    StepResult, StepStatus, Workflow, WorkflowError, WorkflowExecutor, WorkflowId,
    WorkflowRepository, WorkflowRunResult, WorkflowStep,
};
