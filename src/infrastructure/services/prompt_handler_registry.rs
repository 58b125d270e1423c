//! Prompt handler registry
//!
//! Every non-deprecated prompt is exposed as a `pcp-<name>` tool. The map is
//! rebuilt from the repository at start-up and patched as prompts are
//! created or deprecated.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::context_service::{ContextService, ExpandRequest};
use crate::domain::hierarchy::{ProjectId, SubjectId};
use crate::domain::prompt::{Bindings, Prompt, PromptRepository};
use crate::domain::DomainError;

/// Prefix shared by every prompt tool name
pub const TOOL_PREFIX: &str = "pcp-";

const CONTEXT_PREVIEW_CHARS: usize = 80;

/// Tool name for a prompt
pub fn tool_name(prompt_name: &str) -> String {
    format!("{}{}", TOOL_PREFIX, prompt_name)
}

/// Parse raw tool input: a JSON object is used as-is, anything else is
/// bound as `input`
pub fn parse_tool_input(raw: &str) -> Bindings {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut bindings = Bindings::new();
            bindings.insert("input".to_string(), Value::String(raw.to_string()));
            bindings
        }
    }
}

/// A tool bound to one prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptHandler {
    pub tool_name: String,
    pub prompt_name: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl PromptHandler {
    pub fn for_prompt(prompt: &Prompt) -> Self {
        let description = prompt.description().map(str::to_string).unwrap_or_else(|| {
            format!("Expand the '{}' prompt with your input.", prompt.name())
        });

        Self {
            tool_name: tool_name(prompt.name()),
            prompt_name: prompt.name().to_string(),
            description,
            tags: prompt
                .latest_version()
                .map(|v| v.tags().to_vec())
                .unwrap_or_default(),
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.prompt_name.to_lowercase().contains(query)
            || self.description.to_lowercase().contains(query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(query))
    }
}

/// Name -> handler map for prompt tools
pub struct PromptHandlerRegistry {
    handlers: RwLock<BTreeMap<String, PromptHandler>>,
    context: Arc<ContextService>,
    subject_id: Option<SubjectId>,
}

impl std::fmt::Debug for PromptHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptHandlerRegistry")
            .field("subject_id", &self.subject_id)
            .finish_non_exhaustive()
    }
}

impl PromptHandlerRegistry {
    pub fn new(context: Arc<ContextService>) -> Self {
        Self {
            handlers: RwLock::new(BTreeMap::new()),
            context,
            subject_id: None,
        }
    }

    /// Subject whose policies and objectives apply to invocations
    pub fn with_subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    /// Replace every handler with one per non-deprecated prompt
    pub async fn rebuild(&self, repository: &dyn PromptRepository) -> Result<usize, DomainError> {
        let prompts = repository.list().await?;

        let handlers: BTreeMap<String, PromptHandler> = prompts
            .iter()
            .filter(|p| !p.is_deprecated())
            .map(|p| {
                let handler = PromptHandler::for_prompt(p);
                (handler.tool_name.clone(), handler)
            })
            .collect();

        let count = handlers.len();
        *self.handlers.write().await = handlers;

        info!(tools = count, "Rebuilt prompt handler registry");
        Ok(count)
    }

    pub async fn on_prompt_created(&self, prompt: &Prompt) {
        if prompt.is_deprecated() {
            return;
        }

        let handler = PromptHandler::for_prompt(prompt);
        debug!(tool = %handler.tool_name, "Registering prompt tool");
        self.handlers
            .write()
            .await
            .insert(handler.tool_name.clone(), handler);
    }

    pub async fn on_prompt_deprecated(&self, prompt_name: &str) {
        let removed = self
            .handlers
            .write()
            .await
            .remove(&tool_name(prompt_name))
            .is_some();

        if removed {
            debug!(prompt = prompt_name, "Unregistered prompt tool");
        }
    }

    /// All handlers ordered by tool name
    pub async fn handlers(&self) -> Vec<PromptHandler> {
        self.handlers.read().await.values().cloned().collect()
    }

    pub async fn get(&self, tool: &str) -> Option<PromptHandler> {
        self.handlers.read().await.get(tool).cloned()
    }

    /// Handlers whose name, description or tags contain the query (case-insensitive)
    pub async fn search(&self, query: &str) -> Vec<PromptHandler> {
        let query = query.to_lowercase();
        self.handlers
            .read()
            .await
            .values()
            .filter(|h| h.matches(&query))
            .cloned()
            .collect()
    }

    /// Expand the prompt behind a tool and format it as text
    pub async fn invoke(
        &self,
        tool: &str,
        raw_input: &str,
        project_id: Option<&ProjectId>,
    ) -> Result<String, DomainError> {
        let handler = self
            .get(tool)
            .await
            .ok_or_else(|| DomainError::not_found(format!("Tool '{}' not found", tool)))?;

        let mut request =
            ExpandRequest::new(&handler.prompt_name).with_bindings(parse_tool_input(raw_input));
        if let Some(subject_id) = &self.subject_id {
            request = request.with_subject(subject_id.clone());
        }
        if let Some(project_id) = project_id {
            request = request.with_project(project_id.clone());
        }

        // Only a missing prompt is reported as text; hierarchy lookups still fail
        let render = match self.context.render(&request).await {
            Ok(render) => render,
            Err(DomainError::NotFound { .. }) => {
                return Ok(format!("Error: prompt '{}' not found.", handler.prompt_name));
            }
            Err(e) => return Err(e),
        };
        let result = self.context.decorate(render, &request).await?;

        let mut parts = Vec::new();
        if let Some(system) = &result.render.system_message {
            parts.push(format!("[System]\n{}", system));
        }
        parts.push(format!("[User]\n{}", result.render.user_message));
        if !result.applied_policies.is_empty() {
            parts.push(format!(
                "[Policies Applied]\n{}",
                result.applied_policies.join(", ")
            ));
        }

        Ok(parts.join("\n\n"))
    }

    /// Listing of every registered tool
    pub async fn format_list(&self) -> String {
        let handlers = self.handlers().await;
        if handlers.is_empty() {
            return "No prompts registered yet.".to_string();
        }

        let mut lines = vec!["Available prompts:".to_string()];
        lines.extend(handlers.iter().map(|h| format!("  - {}", h.tool_name)));
        lines.join("\n")
    }

    /// Search results with descriptions and tags
    pub async fn format_search(&self, query: &str) -> String {
        let matches = self.search(query).await;
        if matches.is_empty() {
            return format!("No prompts matching '{}'.", query);
        }

        let mut lines = vec![format!("Prompts matching '{}':", query)];
        lines.extend(matches.iter().map(|h| {
            let tags = if h.tags.is_empty() {
                "none".to_string()
            } else {
                h.tags.join(", ")
            };
            format!("  - {}: {} [tags: {}]", h.tool_name, h.description, tags)
        }));
        lines.join("\n")
    }

    /// Effective policies and objectives of a subject as text
    pub async fn format_context(
        &self,
        subject_id: &SubjectId,
        project_id: Option<&ProjectId>,
    ) -> Result<String, DomainError> {
        let policies = self.context.resolve_policies(subject_id, project_id).await?;
        let objectives = self.context.resolve_objectives(subject_id, project_id).await?;

        let mut lines = vec!["=== Effective Policies ===".to_string()];
        if !policies.inherited.is_empty() {
            lines.push("Inherited (immutable):".to_string());
            lines.extend(policies.inherited.iter().map(|e| policy_line(&e.item)));
        }
        if !policies.local.is_empty() {
            lines.push("Local (mutable):".to_string());
            lines.extend(policies.local.iter().map(|e| policy_line(&e.item)));
        }
        if policies.is_empty() {
            lines.push("  (none)".to_string());
        }

        lines.push("\n=== Effective Objectives ===".to_string());
        if !objectives.inherited.is_empty() {
            lines.push("Inherited (immutable):".to_string());
            lines.extend(objectives.inherited.iter().map(|e| format!("  - {}", e.item.title())));
        }
        if !objectives.local.is_empty() {
            lines.push("Local (mutable):".to_string());
            lines.extend(objectives.local.iter().map(|e| format!("  - {}", e.item.title())));
        }
        if objectives.is_empty() {
            lines.push("  (none)".to_string());
        }

        Ok(lines.join("\n"))
    }
}

fn policy_line(policy: &crate::domain::hierarchy::PolicyRule) -> String {
    let preview: String = policy.content().chars().take(CONTEXT_PREVIEW_CHARS).collect();
    format!("  - [{}] {}: {}", policy.kind(), policy.name(), preview)
}
