//! Prompt management domain - Versioned prompt templates with composition support

mod composer;
mod entity;
mod repository;
mod template;

pub use composer::{
    depth_exceeded_marker, join_messages, not_found_marker, RenderResult, TemplateComposer,
    MAX_INCLUDE_DEPTH,
};
pub use entity::{validate_prompt_name, Prompt, PromptVersion, MAX_PROMPT_NAME_LENGTH};
#[cfg(test)]
pub use repository::MockPromptRepository;
pub use repository::PromptRepository;
pub use template::{
    lookup, scan_includes, value_to_string, Bindings, PromptTemplate, TemplateError,
};
