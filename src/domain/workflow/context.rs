//! Workflow execution context and step input chaining
//!
//! Each step renders against:
//! - the workflow input (top-level keys of a JSON object)
//! - each completed predecessor's user message, bound under the predecessor's step id
//! - `input`, the user message of the step that ran immediately before

use std::collections::HashMap;

use serde_json::Value;

use super::entity::WorkflowStep;
use crate::domain::prompt::Bindings;

/// Binding name carrying the previous step's output
pub const CHAIN_INPUT_KEY: &str = "input";

/// Workflow execution context holding the run input and step outputs
#[derive(Debug, Clone, Default)]
pub struct ChainContext {
    /// Bindings supplied when the run started
    workflow_input: Bindings,

    /// User messages of executed steps, keyed by step id
    step_outputs: HashMap<String, String>,

    /// Output of the most recently executed step
    last_output: Option<String>,
}

impl ChainContext {
    /// Create a new context from the run input.
    ///
    /// An object contributes its keys; any other non-null value is bound
    /// as `input`.
    pub fn new(input: Value) -> Self {
        let workflow_input = match input {
            Value::Object(map) => map,
            Value::Null => Bindings::new(),
            other => {
                let mut map = Bindings::new();
                map.insert(CHAIN_INPUT_KEY.to_string(), other);
                map
            }
        };

        Self {
            workflow_input,
            step_outputs: HashMap::new(),
            last_output: None,
        }
    }

    pub fn workflow_input(&self) -> &Bindings {
        &self.workflow_input
    }

    pub fn step_output(&self, step_id: &str) -> Option<&str> {
        self.step_outputs.get(step_id).map(String::as_str)
    }

    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }

    /// Record a step's rendered user message
    pub fn record_output(&mut self, step_id: impl Into<String>, output: impl Into<String>) {
        let output = output.into();
        self.last_output = Some(output.clone());
        self.step_outputs.insert(step_id.into(), output);
    }

    /// Build the bindings a step renders against
    pub fn bindings_for(&self, step: &WorkflowStep) -> Bindings {
        let mut bindings = self.workflow_input.clone();

        for dependency in step.dependencies() {
            if let Some(output) = self.step_outputs.get(dependency) {
                bindings.insert(dependency.clone(), Value::String(output.clone()));
            }
        }

        if let Some(previous) = &self.last_output {
            bindings.insert(CHAIN_INPUT_KEY.to_string(), Value::String(previous.clone()));
        } else if !bindings.contains_key(CHAIN_INPUT_KEY) {
            bindings.insert(CHAIN_INPUT_KEY.to_string(), Value::String(String::new()));
        }

        bindings
    }
}
