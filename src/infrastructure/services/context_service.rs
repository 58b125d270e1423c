//! Context service - organizational context resolution and prompt expansion

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::hierarchy::{
    EffectiveConfig, EnforcementKind, HierarchyResolver, LayeredEntry, ObjectiveRecord,
    PolicyRule, ProjectId, SubjectId,
};
use crate::domain::prompt::{Bindings, RenderResult, TemplateComposer};
use crate::domain::DomainError;

/// Request to expand a prompt with organizational context
#[derive(Debug, Clone, Default)]
pub struct ExpandRequest {
    pub prompt_name: String,
    pub version: Option<String>,
    pub bindings: Bindings,
    pub subject_id: Option<SubjectId>,
    pub project_id: Option<ProjectId>,
}

impl ExpandRequest {
    pub fn new(prompt_name: impl Into<String>) -> Self {
        Self {
            prompt_name: prompt_name.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// A rendered prompt decorated with the policies and objectives in effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandResult {
    #[serde(flatten)]
    pub render: RenderResult,

    /// Names of the policies that altered the rendered text, in application order
    #[serde(default)]
    pub applied_policies: Vec<String>,

    /// Content of `validate` policies, which never alter text
    #[serde(default)]
    pub validation_rules: Vec<String>,

    /// Objective titles, inherited first
    #[serde(default)]
    pub objectives: Vec<String>,
}

/// Resolves effective policies and objectives and layers them over renders
pub struct ContextService {
    composer: Arc<TemplateComposer>,
    resolver: Arc<HierarchyResolver>,
}

impl std::fmt::Debug for ContextService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextService").finish()
    }
}

impl ContextService {
    pub fn new(composer: Arc<TemplateComposer>, resolver: Arc<HierarchyResolver>) -> Self {
        Self { composer, resolver }
    }

    pub async fn resolve_policies(
        &self,
        subject_id: &SubjectId,
        project_id: Option<&ProjectId>,
    ) -> Result<EffectiveConfig<PolicyRule>, DomainError> {
        self.resolver.resolve_policies(subject_id, project_id).await
    }

    pub async fn resolve_objectives(
        &self,
        subject_id: &SubjectId,
        project_id: Option<&ProjectId>,
    ) -> Result<EffectiveConfig<ObjectiveRecord>, DomainError> {
        self.resolver.resolve_objectives(subject_id, project_id).await
    }

    /// Effective policies as one list, highest priority first
    pub async fn resolve_all_policies(
        &self,
        subject_id: &SubjectId,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<LayeredEntry<PolicyRule>>, DomainError> {
        Ok(self
            .resolve_policies(subject_id, project_id)
            .await?
            .into_flat())
    }

    /// Render a prompt and, when a subject is given, apply its effective
    /// policies and attach its objectives
    pub async fn expand(&self, request: ExpandRequest) -> Result<ExpandResult, DomainError> {
        let render = self.render(&request).await?;
        self.decorate(render, &request).await
    }

    /// Render the requested prompt without organizational context
    pub async fn render(&self, request: &ExpandRequest) -> Result<RenderResult, DomainError> {
        self.composer
            .render(
                &request.prompt_name,
                request.version.as_deref(),
                &request.bindings,
            )
            .await
    }

    /// Layer the subject's policies and objectives over a render
    pub async fn decorate(
        &self,
        render: RenderResult,
        request: &ExpandRequest,
    ) -> Result<ExpandResult, DomainError> {
        let Some(subject_id) = request.subject_id.as_ref() else {
            return Ok(ExpandResult {
                render,
                applied_policies: Vec::new(),
                validation_rules: Vec::new(),
                objectives: Vec::new(),
            });
        };

        let project_id = request.project_id.as_ref();
        let policies = self.resolve_all_policies(subject_id, project_id).await?;
        let objectives = self.resolve_objectives(subject_id, project_id).await?;

        let mut result = apply_policies(render, &policies);
        result.objectives = objectives
            .iter()
            .map(|entry| entry.item.title().to_string())
            .collect();

        debug!(
            prompt = %request.prompt_name,
            subject = %subject_id,
            applied = result.applied_policies.len(),
            objectives = result.objectives.len(),
            "Expanded prompt"
        );

        Ok(result)
    }
}

/// Apply policies in the given order to a rendered prompt
pub fn apply_policies(render: RenderResult, policies: &[LayeredEntry<PolicyRule>]) -> ExpandResult {
    let mut prepends = Vec::new();
    let mut injects = Vec::new();
    let mut appends = Vec::new();
    let mut validation_rules = Vec::new();
    let mut applied_policies = Vec::new();

    for entry in policies {
        let policy = &entry.item;
        match policy.kind() {
            EnforcementKind::Prepend => prepends.push(policy.content()),
            EnforcementKind::Inject => injects.push(policy.content()),
            EnforcementKind::Append => appends.push(policy.content()),
            EnforcementKind::Validate => {
                validation_rules.push(policy.content().to_string());
                continue;
            }
        }
        applied_policies.push(policy.name().to_string());
    }

    let system_parts: Vec<&str> = prepends
        .into_iter()
        .chain(render.system_message.as_deref())
        .chain(injects)
        .filter(|part| !part.is_empty())
        .collect();
    let system_message = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

    let user_message = std::iter::once(render.user_message.as_str())
        .chain(appends)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    ExpandResult {
        render: RenderResult {
            system_message,
            user_message,
            ..render
        },
        applied_policies,
        validation_rules,
        objectives: Vec::new(),
    }
}
