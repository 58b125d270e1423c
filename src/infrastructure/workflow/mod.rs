//! Workflow infrastructure implementations

mod executor_impl;
mod in_memory_repository;

pub use executor_impl::WorkflowExecutorImpl;
pub use in_memory_repository::InMemoryWorkflowRepository;
