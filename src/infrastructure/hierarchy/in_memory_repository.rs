//! In-memory hierarchy repositories
//!
//! Policies and objectives are kept in insertion order, which is the order
//! scoped listings return them in.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::hierarchy::{
    ObjectiveRecord, ObjectiveRepository, OrgUnit, OrgUnitId, OrgUnitRepository, PolicyRepository,
    PolicyRule, ProjectId, Subject, SubjectId, SubjectRepository,
};
use crate::domain::DomainError;

/// In-memory implementation of OrgUnitRepository
#[derive(Debug, Default)]
pub struct InMemoryOrgUnitRepository {
    units: Arc<RwLock<HashMap<OrgUnitId, OrgUnit>>>,
}

impl InMemoryOrgUnitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(units: Vec<OrgUnit>) -> Self {
        let map = units.into_iter().map(|u| (u.id().clone(), u)).collect();
        Self {
            units: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl OrgUnitRepository for InMemoryOrgUnitRepository {
    async fn get(&self, id: &OrgUnitId) -> Result<Option<OrgUnit>, DomainError> {
        let units = self.units.read().await;
        Ok(units.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<OrgUnit>, DomainError> {
        let units = self.units.read().await;
        let mut list: Vec<OrgUnit> = units.values().cloned().collect();
        list.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(list)
    }

    async fn create(&self, unit: OrgUnit) -> Result<OrgUnit, DomainError> {
        let mut units = self.units.write().await;

        if units.contains_key(unit.id()) {
            return Err(DomainError::conflict(format!(
                "Org unit '{}' already exists",
                unit.id()
            )));
        }

        units.insert(unit.id().clone(), unit.clone());
        Ok(unit)
    }
}

/// In-memory implementation of SubjectRepository
#[derive(Debug, Default)]
pub struct InMemorySubjectRepository {
    subjects: Arc<RwLock<HashMap<SubjectId, Subject>>>,
}

impl InMemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects(subjects: Vec<Subject>) -> Self {
        let map = subjects.into_iter().map(|s| (s.id().clone(), s)).collect();
        Self {
            subjects: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl SubjectRepository for InMemorySubjectRepository {
    async fn get(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError> {
        let subjects = self.subjects.read().await;
        Ok(subjects.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Subject>, DomainError> {
        let subjects = self.subjects.read().await;
        let mut list: Vec<Subject> = subjects.values().cloned().collect();
        list.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(list)
    }

    async fn create(&self, subject: Subject) -> Result<Subject, DomainError> {
        let mut subjects = self.subjects.write().await;

        if subjects.contains_key(subject.id()) {
            return Err(DomainError::conflict(format!(
                "Subject '{}' already exists",
                subject.id()
            )));
        }

        subjects.insert(subject.id().clone(), subject.clone());
        Ok(subject)
    }
}

/// In-memory implementation of PolicyRepository
#[derive(Debug, Default)]
pub struct InMemoryPolicyRepository {
    policies: Arc<RwLock<Vec<PolicyRule>>>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policies(policies: Vec<PolicyRule>) -> Self {
        Self {
            policies: Arc::new(RwLock::new(policies)),
        }
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn get(&self, id: Uuid) -> Result<Option<PolicyRule>, DomainError> {
        let policies = self.policies.read().await;
        Ok(policies.iter().find(|p| p.id() == id).cloned())
    }

    async fn list(&self) -> Result<Vec<PolicyRule>, DomainError> {
        Ok(self.policies.read().await.clone())
    }

    async fn list_by_org_unit(
        &self,
        org_unit_id: &OrgUnitId,
    ) -> Result<Vec<PolicyRule>, DomainError> {
        let policies = self.policies.read().await;
        Ok(policies
            .iter()
            .filter(|p| p.applies_to_org_unit(org_unit_id))
            .cloned()
            .collect())
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<PolicyRule>, DomainError> {
        let policies = self.policies.read().await;
        Ok(policies
            .iter()
            .filter(|p| p.applies_to_project(project_id))
            .cloned()
            .collect())
    }

    async fn create(&self, policy: PolicyRule) -> Result<PolicyRule, DomainError> {
        let mut policies = self.policies.write().await;

        if policies.iter().any(|p| p.id() == policy.id()) {
            return Err(DomainError::conflict(format!(
                "Policy '{}' already exists",
                policy.id()
            )));
        }

        policies.push(policy.clone());
        Ok(policy)
    }

    async fn update(&self, policy: PolicyRule) -> Result<PolicyRule, DomainError> {
        let mut policies = self.policies.write().await;

        let existing = policies
            .iter_mut()
            .find(|p| p.id() == policy.id())
            .ok_or_else(|| DomainError::not_found(format!("Policy '{}' not found", policy.id())))?;

        *existing = policy.clone();
        Ok(policy)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut policies = self.policies.write().await;
        let before = policies.len();
        policies.retain(|p| p.id() != id);
        Ok(policies.len() < before)
    }
}

/// In-memory implementation of ObjectiveRepository
#[derive(Debug, Default)]
pub struct InMemoryObjectiveRepository {
    objectives: Arc<RwLock<Vec<ObjectiveRecord>>>,
}

impl InMemoryObjectiveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objectives(objectives: Vec<ObjectiveRecord>) -> Self {
        Self {
            objectives: Arc::new(RwLock::new(objectives)),
        }
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<ObjectiveRecord>
    where
        F: Fn(&ObjectiveRecord) -> bool,
    {
        let objectives = self.objectives.read().await;
        objectives.iter().filter(|o| predicate(o)).cloned().collect()
    }
}

#[async_trait]
impl ObjectiveRepository for InMemoryObjectiveRepository {
    async fn get(&self, id: Uuid) -> Result<Option<ObjectiveRecord>, DomainError> {
        let objectives = self.objectives.read().await;
        Ok(objectives.iter().find(|o| o.id() == id).cloned())
    }

    async fn list(&self) -> Result<Vec<ObjectiveRecord>, DomainError> {
        Ok(self.objectives.read().await.clone())
    }

    async fn list_by_org_unit(
        &self,
        org_unit_id: &OrgUnitId,
    ) -> Result<Vec<ObjectiveRecord>, DomainError> {
        Ok(self
            .filtered(|o| o.org_unit_id() == Some(org_unit_id))
            .await)
    }

    async fn list_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ObjectiveRecord>, DomainError> {
        Ok(self.filtered(|o| o.project_id() == Some(project_id)).await)
    }

    async fn list_by_subject(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Vec<ObjectiveRecord>, DomainError> {
        Ok(self.filtered(|o| o.subject_id() == Some(subject_id)).await)
    }

    async fn create(&self, objective: ObjectiveRecord) -> Result<ObjectiveRecord, DomainError> {
        let mut objectives = self.objectives.write().await;

        if objectives.iter().any(|o| o.id() == objective.id()) {
            return Err(DomainError::conflict(format!(
                "Objective '{}' already exists",
                objective.id()
            )));
        }

        objectives.push(objective.clone());
        Ok(objective)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut objectives = self.objectives.write().await;
        let before = objectives.len();
        objectives.retain(|o| o.id() != id);
        Ok(objectives.len() < before)
    }
}
