//! Workflow executor implementation

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::prompt::TemplateComposer;
use crate::domain::workflow::{
    topological_order, ChainContext, StepResult, Workflow, WorkflowError, WorkflowExecutor,
    WorkflowRunResult,
};
use crate::domain::DomainError;

/// Runs workflow steps sequentially, rendering each step's prompt
#[derive(Debug)]
pub struct WorkflowExecutorImpl {
    composer: Arc<TemplateComposer>,
}

impl WorkflowExecutorImpl {
    /// Create a new executor
    pub fn new(composer: Arc<TemplateComposer>) -> Self {
        Self { composer }
    }
}

#[async_trait]
impl WorkflowExecutor for WorkflowExecutorImpl {
    async fn execute(
        &self,
        workflow: &Workflow,
        input: Value,
    ) -> Result<WorkflowRunResult, WorkflowError> {
        let start = Instant::now();
        let ordered = topological_order(workflow.steps())?;

        info!(
            workflow_id = %workflow.id(),
            steps = ordered.len(),
            "Executing workflow"
        );

        let mut context = ChainContext::new(input);
        let mut result = WorkflowRunResult::new(workflow);

        for step in ordered {
            let bindings = context.bindings_for(step);

            debug!(
                workflow_id = %workflow.id(),
                step_id = step.id(),
                prompt = step.prompt_name(),
                "Executing step"
            );

            match self
                .composer
                .render(step.prompt_name(), step.prompt_version(), &bindings)
                .await
            {
                Ok(rendered) => {
                    context.record_output(step.id(), rendered.user_message.clone());
                    result.push(StepResult::success(
                        step.id(),
                        step.prompt_name(),
                        rendered.resolved_version,
                        rendered.system_message,
                        rendered.user_message,
                    ));
                }
                Err(e) => {
                    warn!(
                        workflow_id = %workflow.id(),
                        step_id = step.id(),
                        error = %e,
                        "Step failed, halting workflow"
                    );
                    result.push(StepResult::failure(
                        step.id(),
                        step.prompt_name(),
                        step.prompt_version(),
                        step_error_message(&e),
                    ));
                    break;
                }
            }
        }

        debug!(
            workflow_id = %workflow.id(),
            executed = result.step_results.len(),
            success = result.is_success(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Workflow finished"
        );

        Ok(result)
    }
}

fn step_error_message(error: &DomainError) -> String {
    match error {
        DomainError::NotFound { message } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prompt::{Prompt, PromptVersion};
    use crate::domain::workflow::{StepStatus, WorkflowId, WorkflowStep};
    use crate::infrastructure::prompt::InMemoryPromptRepository;
    use serde_json::json;

    fn prompt(name: &str, user_template: &str) -> Prompt {
        Prompt::new(name, PromptVersion::new("1.0.0", user_template))
    }

    fn executor(prompts: Vec<Prompt>) -> WorkflowExecutorImpl {
        let repository = Arc::new(InMemoryPromptRepository::with_prompts(prompts));
        WorkflowExecutorImpl::new(Arc::new(TemplateComposer::new(repository)))
    }

    fn workflow(steps: Vec<WorkflowStep>) -> Workflow {
        Workflow::new(WorkflowId::new("pipeline").unwrap(), "Pipeline").with_steps(steps)
    }

    #[tokio::test]
    async fn test_greet_then_summarize() {
        let executor = executor(vec![
            prompt("greet", "Hello {{ input }}"),
            prompt("summarize", "Summary of: {{ s1 }}"),
        ]);
        let workflow = workflow(vec![
            WorkflowStep::new("s1", "greet"),
            WorkflowStep::new("s2", "summarize").depends_on("s1"),
        ]);

        let result = executor
            .execute(&workflow, json!({"name": "Bob"}))
            .await
            .unwrap();

        assert_eq!(result.step_results.len(), 2);
        assert!(result
            .step_results
            .iter()
            .all(|r| r.status == StepStatus::Success));

        let s1 = &result.step_results[0].user_message;
        let s2 = &result.step_results[1].user_message;
        assert_eq!(result.step_results[0].step_id, "s1");
        assert!(s2.contains(s1.as_str()));
        assert_eq!(result.outputs.len(), 2);
        assert_eq!(result.workflow_name, "Pipeline");
    }

    #[tokio::test]
    async fn test_input_chains_from_previous_step() {
        let executor = executor(vec![
            prompt("shout", "{{ input }}!"),
            prompt("wrap", "<{{ input }}>"),
        ]);
        let workflow = workflow(vec![
            WorkflowStep::new("second", "wrap").depends_on("first"),
            WorkflowStep::new("first", "shout"),
        ]);

        let result = executor.execute(&workflow, json!({"input": "hey"})).await.unwrap();

        assert_eq!(result.step_results[0].step_id, "first");
        assert_eq!(result.outputs.get("first").map(String::as_str), Some("hey!"));
        assert_eq!(result.outputs.get("second").map(String::as_str), Some("<hey!>"));
        assert_eq!(result.last_output(), Some("<hey!>"));
    }

    #[tokio::test]
    async fn test_missing_prompt_halts_run() {
        let executor = executor(vec![prompt("summarize", "Summary: {{ a }}")]);
        let workflow = workflow(vec![
            WorkflowStep::new("a", "deleted-prompt"),
            WorkflowStep::new("b", "summarize").depends_on("a"),
        ]);

        let result = executor.execute(&workflow, json!({})).await.unwrap();

        assert_eq!(result.step_results.len(), 1);
        let failed = &result.step_results[0];
        assert_eq!(failed.step_id, "a");
        assert_eq!(failed.status, StepStatus::Error);
        assert_eq!(failed.prompt_version, "latest");
        assert!(failed.error.as_deref().unwrap().contains("deleted-prompt"));
        assert!(result.outputs.is_empty());
    }

    #[tokio::test]
    async fn test_template_error_halts_run() {
        let executor = executor(vec![
            prompt("ok", "fine"),
            prompt("strict", "Needs {{ topic }}"),
            prompt("never", "unreachable"),
        ]);
        let workflow = workflow(vec![
            WorkflowStep::new("one", "ok"),
            WorkflowStep::new("two", "strict").depends_on("one"),
            WorkflowStep::new("three", "never").depends_on("two"),
        ]);

        let result = executor.execute(&workflow, json!({})).await.unwrap();

        assert_eq!(result.step_results.len(), 2);
        assert_eq!(result.failed_step().unwrap().step_id, "two");
        assert!(result.failed_step().unwrap().error.as_deref().unwrap().contains("topic"));
        assert_eq!(result.outputs.len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_rejected_before_execution() {
        let executor = executor(vec![prompt("p", "x")]);
        let workflow = workflow(vec![
            WorkflowStep::new("a", "p").depends_on("b"),
            WorkflowStep::new("b", "p").depends_on("a"),
        ]);

        let result = executor.execute(&workflow, json!({})).await;

        assert!(matches!(result, Err(WorkflowError::CycleDetected(_))));
    }

    #[tokio::test]
    async fn test_unknown_dependency_rejected() {
        let executor = executor(vec![prompt("p", "x")]);
        let workflow = workflow(vec![WorkflowStep::new("a", "p").depends_on("ghost")]);

        let result = executor.execute(&workflow, json!({})).await;

        assert!(matches!(result, Err(WorkflowError::StepNotFound(_))));
    }

    #[tokio::test]
    async fn test_pinned_step_version() {
        let executor = executor(vec![
            prompt("versioned", "old").with_version(PromptVersion::new("2.0.0", "new"))
        ]);
        let workflow = workflow(vec![
            WorkflowStep::new("latest", "versioned"),
            WorkflowStep::new("pinned", "versioned").with_prompt_version("1.0.0"),
        ]);

        let result = executor.execute(&workflow, json!({})).await.unwrap();

        assert_eq!(result.step_results[0].prompt_version, "2.0.0");
        assert_eq!(result.step_results[1].prompt_version, "1.0.0");
        assert_eq!(result.step_results[1].user_message, "old");
    }

    #[tokio::test]
    async fn test_empty_workflow() {
        let executor = executor(vec![]);
        let result = executor.execute(&workflow(vec![]), json!({})).await.unwrap();

        assert!(result.step_results.is_empty());
        assert!(result.is_success());
    }
}
