//! Prompt repository trait

use std::collections::HashMap;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::Prompt;
use crate::domain::DomainError;

/// Repository trait for prompt persistence, keyed by prompt name
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// Get a prompt by name
    async fn get(&self, name: &str) -> Result<Option<Prompt>, DomainError>;

    /// Fetch several prompts at once; absent names are left out of the map
    async fn get_many(&self, names: &[String]) -> Result<HashMap<String, Prompt>, DomainError> {
        let mut found = HashMap::with_capacity(names.len());

        for name in names {
            if let Some(prompt) = self.get(name).await? {
                found.insert(name.clone(), prompt);
            }
        }

        Ok(found)
    }

    /// Get all prompts
    async fn list(&self) -> Result<Vec<Prompt>, DomainError>;

    /// Create a new prompt
    async fn create(&self, prompt: Prompt) -> Result<Prompt, DomainError>;

    /// Update an existing prompt
    async fn update(&self, prompt: Prompt) -> Result<Prompt, DomainError>;

    /// Delete a prompt by name
    async fn delete(&self, name: &str) -> Result<bool, DomainError>;

    /// Check if a prompt exists
    async fn exists(&self, name: &str) -> Result<bool, DomainError> {
        Ok(self.get(name).await?.is_some())
    }
}
