//! In-memory prompt repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::prompt::{Prompt, PromptRepository};
use crate::domain::DomainError;

/// In-memory implementation of PromptRepository
#[derive(Debug)]
pub struct InMemoryPromptRepository {
    prompts: Arc<RwLock<HashMap<String, Prompt>>>,
}

impl InMemoryPromptRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            prompts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a repository pre-populated with prompts
    pub fn with_prompts(prompts: Vec<Prompt>) -> Self {
        let map: HashMap<String, Prompt> = prompts
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();

        Self {
            prompts: Arc::new(RwLock::new(map)),
        }
    }
}

impl Default for InMemoryPromptRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptRepository for InMemoryPromptRepository {
    async fn get(&self, name: &str) -> Result<Option<Prompt>, DomainError> {
        let prompts = self.prompts.read().await;
        Ok(prompts.get(name).cloned())
    }

    async fn get_many(&self, names: &[String]) -> Result<HashMap<String, Prompt>, DomainError> {
        let prompts = self.prompts.read().await;
        Ok(names
            .iter()
            .filter_map(|name| prompts.get(name).map(|p| (name.clone(), p.clone())))
            .collect())
    }

    async fn list(&self) -> Result<Vec<Prompt>, DomainError> {
        let prompts = self.prompts.read().await;
        let mut list: Vec<Prompt> = prompts.values().cloned().collect();
        list.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(list)
    }

    async fn create(&self, prompt: Prompt) -> Result<Prompt, DomainError> {
        let mut prompts = self.prompts.write().await;

        if prompts.contains_key(prompt.name()) {
            return Err(DomainError::conflict(format!(
                "Prompt '{}' already exists",
                prompt.name()
            )));
        }

        prompts.insert(prompt.name().to_string(), prompt.clone());
        Ok(prompt)
    }

    async fn update(&self, prompt: Prompt) -> Result<Prompt, DomainError> {
        let mut prompts = self.prompts.write().await;

        if !prompts.contains_key(prompt.name()) {
            return Err(DomainError::not_found(format!(
                "Prompt '{}' not found",
                prompt.name()
            )));
        }

        prompts.insert(prompt.name().to_string(), prompt.clone());
        Ok(prompt)
    }

    async fn delete(&self, name: &str) -> Result<bool, DomainError> {
        let mut prompts = self.prompts.write().await;
        Ok(prompts.remove(name).is_some())
    }

    async fn exists(&self, name: &str) -> Result<bool, DomainError> {
        let prompts = self.prompts.read().await;
        Ok(prompts.contains_key(name))
    }
}
