//! Organizational hierarchy domain
//!
//! Org units form a parent-pointer forest. Subjects belong to one unit, and
//! policies and objectives attached to units, projects or subjects are
//! resolved into an inherited layer and a local layer.

mod entity;
mod layered;
mod objective;
mod policy;
mod repository;
mod resolver;
mod validation;

pub use entity::{OrgUnit, OrgUnitId, ProjectId, Subject, SubjectId};
pub use layered::{EffectiveConfig, LayeredEntry, Prioritized};
pub use objective::{ObjectiveRecord, ObjectiveStatus};
pub use policy::{EnforcementKind, PolicyRule, PolicyScope};
#[cfg(test)]
pub use repository::MockOrgUnitRepository;
pub use repository::{ObjectiveRepository, OrgUnitRepository, PolicyRepository, SubjectRepository};
pub use resolver::HierarchyResolver;
pub use validation::{
    validate_hierarchy_id, validate_name, HierarchyValidationError, MAX_HIERARCHY_ID_LENGTH,
};
