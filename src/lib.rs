//! PCP Orchestrator
//!
//! Prompt composition and orchestration:
//! - Versioned prompt templates with strict variables and nested includes
//! - Workflows of prompt renders ordered by their dependencies
//! - Policies and objectives inherited through an organizational hierarchy

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use domain::hierarchy::HierarchyResolver;
use domain::prompt::{PromptRepository, TemplateComposer};
use domain::SubjectId;
use infrastructure::services::{
    ContextService, PromptHandlerRegistry, PromptService, WorkflowService,
};
use infrastructure::workflow::WorkflowExecutorImpl;
use infrastructure::Catalog;

/// Shared services built over one set of repositories
#[derive(Clone)]
pub struct AppState {
    pub prompts: Arc<dyn PromptRepository>,
    pub prompt_service: Arc<PromptService>,
    pub workflow_service: Arc<WorkflowService>,
    pub context_service: Arc<ContextService>,
    pub registry: Arc<PromptHandlerRegistry>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// A handler registry that expands prompts in the context of a subject
    pub async fn registry_for(
        &self,
        subject_id: Option<SubjectId>,
    ) -> anyhow::Result<Arc<PromptHandlerRegistry>> {
        let Some(subject_id) = subject_id else {
            return Ok(self.registry.clone());
        };

        let registry =
            PromptHandlerRegistry::new(self.context_service.clone()).with_subject(subject_id);
        registry.rebuild(self.prompts.as_ref()).await?;
        Ok(Arc::new(registry))
    }
}

/// Create the application state from the configured catalog file
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let catalog = Catalog::load(&config.catalog.path).await?;
    create_app_state_from_catalog(catalog, config).await
}

/// Create the application state over an already-parsed catalog
pub async fn create_app_state_from_catalog(
    catalog: Catalog,
    config: &AppConfig,
) -> anyhow::Result<AppState> {
    let repos = catalog.into_repositories();
    let prompts: Arc<dyn PromptRepository> = repos.prompts;

    let composer = Arc::new(
        TemplateComposer::new(prompts.clone()).with_max_depth(config.engine.max_include_depth),
    );

    let resolver = Arc::new(HierarchyResolver::new(
        repos.org_units,
        repos.subjects,
        repos.policies,
        repos.objectives,
    ));
    let context_service = Arc::new(ContextService::new(composer.clone(), resolver));

    let registry = Arc::new(PromptHandlerRegistry::new(context_service.clone()));
    let tools = registry.rebuild(prompts.as_ref()).await?;

    let prompt_service = Arc::new(
        PromptService::new(prompts.clone(), composer.clone()).with_registry(registry.clone()),
    );

    let executor = Arc::new(WorkflowExecutorImpl::new(composer));
    let workflow_service = Arc::new(WorkflowService::new(repos.workflows, executor));

    info!(
        tools,
        max_include_depth = config.engine.max_include_depth,
        "Application state created"
    );

    Ok(AppState {
        prompts,
        prompt_service,
        workflow_service,
        context_service,
        registry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prompt::Bindings;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::from_json(
            &json!({
                "prompts": [
                    {
                        "name": "greet",
                        "versions": [{"version": "1.0.0", "user_template": "Hello {{ input }}"}]
                    }
                ],
                "workflows": [
                    {"id": "hello", "name": "Hello", "steps": [{"id": "s1", "prompt_name": "greet"}]}
                ],
                "org_units": [{"id": "team", "name": "Team"}],
                "subjects": [{"id": "alice", "name": "Alice", "org_unit_id": "team"}],
                "policies": [
                    {"name": "tone", "kind": "append", "content": "Be brief.", "scope": {"org_unit": "team"}}
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_state_wires_services() {
        let state = create_app_state_from_catalog(catalog(), &AppConfig::default())
            .await
            .unwrap();

        let bindings: Bindings = json!({"input": "Bob"}).as_object().cloned().unwrap();
        let rendered = state
            .prompt_service
            .render("greet", None, &bindings)
            .await
            .unwrap();
        assert_eq!(rendered.user_message, "Hello Bob");

        let run = state
            .workflow_service
            .run("hello", json!("world"))
            .await
            .unwrap();
        assert_eq!(run.last_output(), Some("Hello world"));

        assert!(state.registry.get("pcp-greet").await.is_some());
    }

    #[tokio::test]
    async fn test_registry_for_subject_applies_policies() {
        let state = create_app_state_from_catalog(catalog(), &AppConfig::default())
            .await
            .unwrap();

        let registry = state
            .registry_for(Some(SubjectId::new("alice").unwrap()))
            .await
            .unwrap();
        let text = registry.invoke("pcp-greet", "Bob", None).await.unwrap();

        assert!(text.contains("Hello Bob\n\nBe brief."));
        assert!(text.contains("[Policies Applied]\ntone"));
    }

    #[tokio::test]
    async fn test_created_prompt_becomes_a_tool() {
        use crate::domain::prompt::PromptVersion;
        use crate::infrastructure::services::CreatePromptRequest;

        let state = create_app_state_from_catalog(catalog(), &AppConfig::default())
            .await
            .unwrap();

        state
            .prompt_service
            .create(CreatePromptRequest::new(
                "farewell",
                PromptVersion::new("1.0.0", "Bye {{ input }}"),
            ))
            .await
            .unwrap();
        assert!(state.registry.get("pcp-farewell").await.is_some());

        state.prompt_service.deprecate("farewell").await.unwrap();
        assert!(state.registry.get("pcp-farewell").await.is_none());
    }
}
