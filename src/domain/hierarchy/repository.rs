//! Hierarchy repository traits

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use super::entity::{OrgUnit, OrgUnitId, ProjectId, Subject, SubjectId};
use super::objective::ObjectiveRecord;
use super::policy::PolicyRule;
use crate::domain::DomainError;

/// Repository for org units
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OrgUnitRepository: Send + Sync + std::fmt::Debug {
    async fn get(&self, id: &OrgUnitId) -> Result<Option<OrgUnit>, DomainError>;

    async fn list(&self) -> Result<Vec<OrgUnit>, DomainError>;

    async fn create(&self, unit: OrgUnit) -> Result<OrgUnit, DomainError>;
}

/// Repository for subjects
#[async_trait]
pub trait SubjectRepository: Send + Sync + std::fmt::Debug {
    async fn get(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError>;

    async fn list(&self) -> Result<Vec<Subject>, DomainError>;

    async fn create(&self, subject: Subject) -> Result<Subject, DomainError>;
}

/// Repository for policy rules.
///
/// Scoped listings return records in insertion order and include inactive
/// ones; filtering is the caller's job.
#[async_trait]
pub trait PolicyRepository: Send + Sync + std::fmt::Debug {
    async fn get(&self, id: Uuid) -> Result<Option<PolicyRule>, DomainError>;

    async fn list(&self) -> Result<Vec<PolicyRule>, DomainError>;

    async fn list_by_org_unit(&self, org_unit_id: &OrgUnitId)
        -> Result<Vec<PolicyRule>, DomainError>;

    async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<PolicyRule>, DomainError>;

    async fn create(&self, policy: PolicyRule) -> Result<PolicyRule, DomainError>;

    async fn update(&self, policy: PolicyRule) -> Result<PolicyRule, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

/// Repository for objectives, scoped listings in insertion order
#[async_trait]
pub trait ObjectiveRepository: Send + Sync + std::fmt::Debug {
    async fn get(&self, id: Uuid) -> Result<Option<ObjectiveRecord>, DomainError>;

    async fn list(&self) -> Result<Vec<ObjectiveRecord>, DomainError>;

    async fn list_by_org_unit(
        &self,
        org_unit_id: &OrgUnitId,
    ) -> Result<Vec<ObjectiveRecord>, DomainError>;

    async fn list_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ObjectiveRecord>, DomainError>;

    async fn list_by_subject(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Vec<ObjectiveRecord>, DomainError>;

    async fn create(&self, objective: ObjectiveRecord) -> Result<ObjectiveRecord, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}
