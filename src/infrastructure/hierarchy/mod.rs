//! Hierarchy infrastructure implementations

mod in_memory_repository;

pub use in_memory_repository::{
    InMemoryObjectiveRepository, InMemoryOrgUnitRepository, InMemoryPolicyRepository,
    InMemorySubjectRepository,
};
