//! Prompt service - lifecycle operations and rendering for prompts

use std::sync::Arc;

use tracing::info;

use super::prompt_handler_registry::PromptHandlerRegistry;
use crate::domain::prompt::{
    validate_prompt_name, Bindings, Prompt, PromptRepository, PromptVersion, RenderResult,
    TemplateComposer,
};
use crate::domain::DomainError;

/// Request to create a new prompt
#[derive(Debug, Clone)]
pub struct CreatePromptRequest {
    pub name: String,
    pub description: Option<String>,
    pub version: PromptVersion,
}

impl CreatePromptRequest {
    pub fn new(name: impl Into<String>, version: PromptVersion) -> Self {
        Self {
            name: name.into(),
            description: None,
            version,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Prompt service for lifecycle and rendering operations
pub struct PromptService {
    repository: Arc<dyn PromptRepository>,
    composer: Arc<TemplateComposer>,
    registry: Option<Arc<PromptHandlerRegistry>>,
}

impl std::fmt::Debug for PromptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptService")
            .field("composer", &self.composer)
            .finish_non_exhaustive()
    }
}

impl PromptService {
    /// Create a new PromptService
    pub fn new(repository: Arc<dyn PromptRepository>, composer: Arc<TemplateComposer>) -> Self {
        Self {
            repository,
            composer,
            registry: None,
        }
    }

    /// Keep a handler registry in sync with prompt lifecycle changes
    pub fn with_registry(mut self, registry: Arc<PromptHandlerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Get a prompt by name
    pub async fn get(&self, name: &str) -> Result<Option<Prompt>, DomainError> {
        self.repository.get(name).await
    }

    /// Get a prompt by name, returning an error if not found
    pub async fn get_required(&self, name: &str) -> Result<Prompt, DomainError> {
        self.get(name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Prompt '{}' not found", name)))
    }

    /// List all prompts, deprecated ones included
    pub async fn list(&self) -> Result<Vec<Prompt>, DomainError> {
        self.repository.list().await
    }

    /// Names of the non-deprecated prompts, sorted
    pub async fn list_names(&self) -> Result<Vec<String>, DomainError> {
        let mut names: Vec<String> = self
            .repository
            .list()
            .await?
            .into_iter()
            .filter(|p| !p.is_deprecated())
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Non-deprecated prompts whose latest version carries the tag
    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Prompt>, DomainError> {
        let prompts = self.repository.list().await?;
        Ok(prompts
            .into_iter()
            .filter(|p| !p.is_deprecated())
            .filter(|p| {
                p.latest_version()
                    .is_some_and(|v| v.tags().iter().any(|t| t == tag))
            })
            .collect())
    }

    /// Create a new prompt with its first version
    pub async fn create(&self, request: CreatePromptRequest) -> Result<Prompt, DomainError> {
        validate_prompt_name(&request.name)?;

        if self.repository.exists(&request.name).await? {
            return Err(DomainError::conflict(format!(
                "Prompt '{}' already exists",
                request.name
            )));
        }

        request.version.validate_templates()?;

        let mut prompt = Prompt::new(request.name, request.version);
        if let Some(description) = request.description {
            prompt = prompt.with_description(description);
        }

        let created = self.repository.create(prompt).await?;
        info!(prompt = created.name(), "Created prompt");

        if let Some(registry) = &self.registry {
            registry.on_prompt_created(&created).await;
        }

        Ok(created)
    }

    /// Add a version, which becomes the most recent one
    pub async fn create_version(
        &self,
        name: &str,
        version: PromptVersion,
    ) -> Result<Prompt, DomainError> {
        let mut prompt = self.get_required(name).await?;

        version.validate_templates()?;
        prompt.add_version(version)?;

        self.repository.update(prompt).await
    }

    /// Pin the version rendered by default (rollback)
    pub async fn pin_version(&self, name: &str, label: &str) -> Result<Prompt, DomainError> {
        let mut prompt = self.get_required(name).await?;

        if !prompt.pin_version(label) {
            return Err(DomainError::not_found(format!(
                "Version '{}' of prompt '{}' not found",
                label, name
            )));
        }

        info!(prompt = name, version = label, "Pinned prompt version");
        self.repository.update(prompt).await
    }

    /// Mark a prompt deprecated; it can no longer be rendered
    pub async fn deprecate(&self, name: &str) -> Result<Prompt, DomainError> {
        let mut prompt = self.get_required(name).await?;
        prompt.deprecate();

        let updated = self.repository.update(prompt).await?;
        info!(prompt = name, "Deprecated prompt");

        if let Some(registry) = &self.registry {
            registry.on_prompt_deprecated(name).await;
        }

        Ok(updated)
    }

    /// Render a prompt with bindings
    pub async fn render(
        &self,
        name: &str,
        version: Option<&str>,
        bindings: &Bindings,
    ) -> Result<RenderResult, DomainError> {
        self.composer.render(name, version, bindings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prompt::TemplateError;
    use crate::infrastructure::prompt::InMemoryPromptRepository;
    use serde_json::json;

    fn service() -> PromptService {
        let repository = Arc::new(InMemoryPromptRepository::new());
        let composer = Arc::new(TemplateComposer::new(repository.clone()));
        PromptService::new(repository, composer)
    }

    fn request(name: &str, template: &str) -> CreatePromptRequest {
        CreatePromptRequest::new(name, PromptVersion::new("1.0.0", template))
    }

    #[tokio::test]
    async fn test_create_and_render() {
        let service = service();

        let created = service
            .create(request("greet", "Hello {{ name }}").with_description("Says hello"))
            .await
            .unwrap();
        assert_eq!(created.description(), Some("Says hello"));

        let bindings = json!({"name": "Bob"}).as_object().cloned().unwrap();
        let rendered = service.render("greet", None, &bindings).await.unwrap();
        assert_eq!(rendered.user_message, "Hello Bob");
    }

    #[tokio::test]
    async fn test_create_conflict_and_invalid_name() {
        let service = service();
        service.create(request("greet", "hi")).await.unwrap();

        let duplicate = service.create(request("greet", "hi")).await;
        assert!(matches!(duplicate, Err(DomainError::Conflict { .. })));

        let invalid = service.create(request("bad name", "hi")).await;
        assert!(matches!(invalid, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_unparseable_template() {
        let service = service();

        let result = service.create(request("evil", "{{ __import__('os') }}")).await;
        assert!(matches!(
            result,
            Err(DomainError::Template(TemplateError::ParseError { .. }))
        ));
    }

    #[tokio::test]
    async fn test_versions_and_pin() {
        let service = service();
        service.create(request("doc", "v1")).await.unwrap();

        service
            .create_version("doc", PromptVersion::new("2.0.0", "v2"))
            .await
            .unwrap();
        let latest = service.render("doc", None, &Bindings::new()).await.unwrap();
        assert_eq!(latest.user_message, "v2");

        let duplicate = service
            .create_version("doc", PromptVersion::new("2.0.0", "again"))
            .await;
        assert!(matches!(duplicate, Err(DomainError::Conflict { .. })));

        service.pin_version("doc", "1.0.0").await.unwrap();
        let pinned = service.render("doc", None, &Bindings::new()).await.unwrap();
        assert_eq!(pinned.user_message, "v1");

        let missing = service.pin_version("doc", "9.9.9").await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_deprecate_hides_prompt() {
        let service = service();
        service.create(request("b-prompt", "b")).await.unwrap();
        service.create(request("a-prompt", "a")).await.unwrap();

        service.deprecate("b-prompt").await.unwrap();

        assert_eq!(service.list_names().await.unwrap(), vec!["a-prompt"]);
        let render = service.render("b-prompt", None, &Bindings::new()).await;
        assert!(matches!(render, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_by_tag_uses_latest_version() {
        let service = service();
        service
            .create(CreatePromptRequest::new(
                "tagged",
                PromptVersion::new("1.0.0", "x").with_tag("ops"),
            ))
            .await
            .unwrap();
        service
            .create_version("tagged", PromptVersion::new("2.0.0", "y").with_tag("dev"))
            .await
            .unwrap();

        assert!(service.list_by_tag("ops").await.unwrap().is_empty());
        assert_eq!(service.list_by_tag("dev").await.unwrap().len(), 1);
    }
}
