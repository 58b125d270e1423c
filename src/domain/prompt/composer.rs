//! Template composition engine
//!
//! Renders one prompt version against a set of bindings, expanding
//! `include_prompt` directives recursively. Included prompts are fetched up
//! front into a cache that lives only for one top-level render call, so
//! concurrent renders never share state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::template::{scan_includes, Bindings, PromptTemplate, TemplateError};
use super::{Prompt, PromptRepository, PromptVersion};
use crate::domain::DomainError;

/// Default cap on include nesting
pub const MAX_INCLUDE_DEPTH: usize = 3;

/// Text substituted for an include whose target cannot be rendered
pub fn not_found_marker(name: &str) -> String {
    format!("[include_prompt error: prompt not found: '{}']", name)
}

/// Text substituted for an include nested deeper than the cap
pub fn depth_exceeded_marker(name: &str, max_depth: usize) -> String {
    format!(
        "[include_prompt error: max depth {} exceeded including '{}']",
        max_depth, name
    )
}

/// Join rendered system and user text with a blank line, skipping empty parts
pub fn join_messages(system: Option<&str>, user: &str) -> String {
    system
        .into_iter()
        .chain(std::iter::once(user))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Result of rendering a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub prompt_name: String,
    pub resolved_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    pub user_message: String,
}

/// Prompts fetched for a single top-level render
#[derive(Debug, Default)]
struct IncludeCache {
    prompts: HashMap<String, Prompt>,
}

impl IncludeCache {
    fn renderable(&self, name: &str) -> Option<&PromptVersion> {
        self.prompts.get(name).and_then(|p| p.select_version(None))
    }
}

/// Renders prompts with recursive, depth-bounded inclusion
pub struct TemplateComposer {
    repository: Arc<dyn PromptRepository>,
    max_depth: usize,
}

impl std::fmt::Debug for TemplateComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateComposer")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl TemplateComposer {
    pub fn new(repository: Arc<dyn PromptRepository>) -> Self {
        Self {
            repository,
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Render a prompt by name.
    ///
    /// Fails with `NotFound` when the prompt, or the requested version, does
    /// not exist, and with a template error when a variable is unbound.
    /// Broken includes never fail the render; they become inline markers.
    pub async fn render(
        &self,
        name: &str,
        version: Option<&str>,
        bindings: &Bindings,
    ) -> Result<RenderResult, DomainError> {
        let prompt = self
            .repository
            .get(name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Prompt '{}' not found", name)))?;

        let selected = select_or_not_found(&prompt, version)?;
        let cache = self.prefetch(selected).await?;

        debug!(
            prompt = name,
            version = selected.version(),
            cached_includes = cache.prompts.len(),
            "Rendering prompt"
        );

        let (system_message, user_message) = self.render_version(selected, bindings, &cache, 0)?;

        Ok(RenderResult {
            prompt_name: prompt.name().to_string(),
            resolved_version: selected.version().to_string(),
            system_message,
            user_message,
        })
    }

    /// Fetch every prompt reachable through includes, level by level, up to
    /// the depth cap
    async fn prefetch(&self, root: &PromptVersion) -> Result<IncludeCache, DomainError> {
        let mut cache = IncludeCache::default();
        let mut requested = HashSet::new();
        let mut frontier = version_includes(root);

        for _ in 0..self.max_depth {
            let pending: Vec<String> = frontier
                .into_iter()
                .filter(|name| requested.insert(name.clone()))
                .collect();

            if pending.is_empty() {
                break;
            }

            let fetched = self.repository.get_many(&pending).await?;
            frontier = fetched
                .values()
                .filter_map(|p| p.select_version(None))
                .flat_map(version_includes)
                .collect();
            cache.prompts.extend(fetched);
        }

        Ok(cache)
    }

    fn render_version(
        &self,
        version: &PromptVersion,
        bindings: &Bindings,
        cache: &IncludeCache,
        depth: usize,
    ) -> Result<(Option<String>, String), TemplateError> {
        let mut include = |name: &str| self.include(name, bindings, cache, depth + 1);

        let system = match version.system_template().filter(|t| !t.is_empty()) {
            Some(source) => Some(PromptTemplate::parse(source)?.render(bindings, &mut include)?),
            None => None,
        };
        let user = PromptTemplate::parse(version.user_template())?.render(bindings, &mut include)?;

        Ok((system, user))
    }

    fn include(
        &self,
        name: &str,
        bindings: &Bindings,
        cache: &IncludeCache,
        depth: usize,
    ) -> Result<String, TemplateError> {
        if depth > self.max_depth {
            debug!(include = name, depth, "Include depth exceeded");
            return Ok(depth_exceeded_marker(name, self.max_depth));
        }

        let Some(version) = cache.renderable(name) else {
            debug!(include = name, "Included prompt not found");
            return Ok(not_found_marker(name));
        };

        let (system, user) = self.render_version(version, bindings, cache, depth)?;
        Ok(join_messages(system.as_deref(), &user))
    }
}

fn select_or_not_found<'a>(
    prompt: &'a Prompt,
    version: Option<&str>,
) -> Result<&'a PromptVersion, DomainError> {
    prompt.select_version(version).ok_or_else(|| match version {
        Some(label) if !prompt.is_deprecated() => DomainError::not_found(format!(
            "Version '{}' of prompt '{}' not found",
            label,
            prompt.name()
        )),
        _ => DomainError::not_found(format!("Prompt '{}' not found", prompt.name())),
    })
}

fn version_includes(version: &PromptVersion) -> Vec<String> {
    let mut names = version
        .system_template()
        .map(scan_includes)
        .unwrap_or_default();

    for name in scan_includes(version.user_template()) {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    names
}
