//! Hierarchical resolution of policies and objectives
//!
//! Walks from a subject's own org unit up through its ancestors. The unit at
//! the start of the walk contributes to the local layer, every unit above it
//! to the inherited layer.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::entity::{OrgUnit, OrgUnitId, ProjectId, Subject, SubjectId};
use super::layered::EffectiveConfig;
use super::objective::ObjectiveRecord;
use super::policy::PolicyRule;
use super::repository::{ObjectiveRepository, OrgUnitRepository, PolicyRepository, SubjectRepository};
use crate::domain::DomainError;

/// Computes inherited and local configuration across the org tree
pub struct HierarchyResolver {
    org_units: Arc<dyn OrgUnitRepository>,
    subjects: Arc<dyn SubjectRepository>,
    policies: Arc<dyn PolicyRepository>,
    objectives: Arc<dyn ObjectiveRepository>,
}

impl std::fmt::Debug for HierarchyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyResolver").finish_non_exhaustive()
    }
}

impl HierarchyResolver {
    pub fn new(
        org_units: Arc<dyn OrgUnitRepository>,
        subjects: Arc<dyn SubjectRepository>,
        policies: Arc<dyn PolicyRepository>,
        objectives: Arc<dyn ObjectiveRepository>,
    ) -> Self {
        Self {
            org_units,
            subjects,
            policies,
            objectives,
        }
    }

    /// Get a subject, returning an error if not found
    pub async fn subject(&self, subject_id: &SubjectId) -> Result<Subject, DomainError> {
        self.subjects
            .get(subject_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Subject '{}' not found", subject_id)))
    }

    /// The unit itself followed by its ancestors, nearest first.
    ///
    /// A parent reference that is missing, or that points back into the
    /// chain, ends the walk.
    pub async fn ancestor_chain(&self, start: &OrgUnitId) -> Result<Vec<OrgUnit>, DomainError> {
        let first = self
            .org_units
            .get(start)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Org unit '{}' not found", start)))?;

        let mut visited = HashSet::from([first.id().clone()]);
        let mut next = first.parent_id().cloned();
        let mut chain = vec![first];

        while let Some(parent_id) = next {
            if !visited.insert(parent_id.clone()) {
                warn!(org_unit = %parent_id, "Cycle in org unit tree, stopping ancestor walk");
                break;
            }

            let Some(parent) = self.org_units.get(&parent_id).await? else {
                debug!(org_unit = %parent_id, "Parent org unit missing, stopping ancestor walk");
                break;
            };

            next = parent.parent_id().cloned();
            chain.push(parent);
        }

        Ok(chain)
    }

    /// Resolve the active policies that apply to a subject
    pub async fn resolve_policies(
        &self,
        subject_id: &SubjectId,
        project_id: Option<&ProjectId>,
    ) -> Result<EffectiveConfig<PolicyRule>, DomainError> {
        let subject = self.subject(subject_id).await?;
        let chain = self.ancestor_chain(subject.org_unit_id()).await?;

        let mut inherited = Vec::new();
        let mut local = Vec::new();

        for (index, unit) in chain.iter().enumerate() {
            let policies = self.policies.list_by_org_unit(unit.id()).await?;
            let active = policies.into_iter().filter(PolicyRule::is_active);

            if index == 0 {
                local.extend(active);
            } else {
                inherited.extend(active);
            }
        }

        if let Some(project_id) = project_id {
            let policies = self.policies.list_by_project(project_id).await?;
            local.extend(policies.into_iter().filter(PolicyRule::is_active));
        }

        debug!(
            subject = %subject_id,
            depth = chain.len(),
            inherited = inherited.len(),
            local = local.len(),
            "Resolved policies"
        );

        Ok(EffectiveConfig::from_layers(inherited, local))
    }

    /// Resolve the active objectives that apply to a subject.
    ///
    /// Layers are filled independently: the subject's own unit, then its
    /// personal objectives, then the project's, go to local; ancestors go to
    /// inherited. A record may appear in both layers but only once in local.
    pub async fn resolve_objectives(
        &self,
        subject_id: &SubjectId,
        project_id: Option<&ProjectId>,
    ) -> Result<EffectiveConfig<ObjectiveRecord>, DomainError> {
        let subject = self.subject(subject_id).await?;
        let chain = self.ancestor_chain(subject.org_unit_id()).await?;

        let mut inherited = Vec::new();
        let mut local = Vec::new();

        for (index, unit) in chain.iter().enumerate() {
            let active = self
                .objectives
                .list_by_org_unit(unit.id())
                .await?
                .into_iter()
                .filter(ObjectiveRecord::is_active);

            if index == 0 {
                local.extend(active);
            } else {
                inherited.extend(active);
            }
        }

        local.extend(self.objectives.list_by_subject(subject_id).await?);
        if let Some(project_id) = project_id {
            local.extend(self.objectives.list_by_project(project_id).await?);
        }

        let mut seen: HashSet<Uuid> = HashSet::new();
        local.retain(|o| o.is_active() && seen.insert(o.id()));

        debug!(
            subject = %subject_id,
            inherited = inherited.len(),
            local = local.len(),
            "Resolved objectives"
        );

        Ok(EffectiveConfig::from_layers(inherited, local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hierarchy::{EnforcementKind, MockOrgUnitRepository, ObjectiveStatus};
    use crate::infrastructure::hierarchy::{
        InMemoryObjectiveRepository, InMemoryOrgUnitRepository, InMemoryPolicyRepository,
        InMemorySubjectRepository,
    };

    fn unit(id: &str, parent: Option<&str>) -> OrgUnit {
        let unit = OrgUnit::new(OrgUnitId::new(id).unwrap(), id);
        match parent {
            Some(parent) => unit.with_parent(OrgUnitId::new(parent).unwrap()),
            None => unit,
        }
    }

    fn org(id: &str) -> OrgUnitId {
        OrgUnitId::new(id).unwrap()
    }

    fn subject_id(id: &str) -> SubjectId {
        SubjectId::new(id).unwrap()
    }

    fn project(id: &str) -> ProjectId {
        ProjectId::new(id).unwrap()
    }

    fn policy(name: &str, priority: i32) -> PolicyRule {
        PolicyRule::new(name, EnforcementKind::Append, format!("{} content", name))
            .with_priority(priority)
    }

    /// company <- division <- team, with `alice` in `team`
    fn resolver(
        units: Vec<OrgUnit>,
        policies: Vec<PolicyRule>,
        objectives: Vec<ObjectiveRecord>,
    ) -> HierarchyResolver {
        let subjects = vec![Subject::new(subject_id("alice"), "Alice", org("team"))];

        HierarchyResolver::new(
            Arc::new(InMemoryOrgUnitRepository::with_units(units)),
            Arc::new(InMemorySubjectRepository::with_subjects(subjects)),
            Arc::new(InMemoryPolicyRepository::with_policies(policies)),
            Arc::new(InMemoryObjectiveRepository::with_objectives(objectives)),
        )
    }

    fn three_levels() -> Vec<OrgUnit> {
        vec![
            unit("company", None),
            unit("division", Some("company")),
            unit("team", Some("division")),
        ]
    }

    #[tokio::test]
    async fn test_three_level_policy_resolution() {
        let resolver = resolver(
            three_levels(),
            vec![
                policy("company-rule", 1).for_org_unit(org("company")),
                policy("division-rule", 2).for_org_unit(org("division")),
                policy("team-rule", 3).for_org_unit(org("team")),
            ],
            vec![],
        );

        let config = resolver
            .resolve_policies(&subject_id("alice"), None)
            .await
            .unwrap();

        assert_eq!(config.inherited.len(), 2);
        assert_eq!(config.local.len(), 1);
        assert!(config.inherited.iter().all(|e| e.is_inherited));
        assert!(!config.local[0].is_inherited);
        assert_eq!(config.local[0].item.name(), "team-rule");

        let inherited: Vec<&str> = config.inherited.iter().map(|e| e.item.name()).collect();
        assert_eq!(inherited, vec!["division-rule", "company-rule"]);
    }

    #[tokio::test]
    async fn test_inactive_policies_ignored() {
        let resolver = resolver(
            three_levels(),
            vec![
                policy("off", 5).for_org_unit(org("team")).with_active(false),
                policy("on", 1).for_org_unit(org("team")),
            ],
            vec![],
        );

        let config = resolver
            .resolve_policies(&subject_id("alice"), None)
            .await
            .unwrap();

        assert_eq!(config.len(), 1);
        assert_eq!(config.local[0].item.name(), "on");
    }

    #[tokio::test]
    async fn test_project_policies_are_local() {
        let resolver = resolver(
            three_levels(),
            vec![
                policy("project-rule", 10).for_project(project("apollo")),
                policy("other-project", 10).for_project(project("gemini")),
                policy("team-rule", 1).for_org_unit(org("team")),
            ],
            vec![],
        );

        let config = resolver
            .resolve_policies(&subject_id("alice"), Some(&project("apollo")))
            .await
            .unwrap();

        let local: Vec<&str> = config.local.iter().map(|e| e.item.name()).collect();
        assert_eq!(local, vec!["project-rule", "team-rule"]);
        assert!(config.inherited.is_empty());

        let without_project = resolver
            .resolve_policies(&subject_id("alice"), None)
            .await
            .unwrap();
        assert_eq!(without_project.len(), 1);
    }

    #[tokio::test]
    async fn test_flatten_tie_prefers_inherited() {
        let resolver = resolver(
            three_levels(),
            vec![
                policy("team-rule", 5).for_org_unit(org("team")),
                policy("company-rule", 5).for_org_unit(org("company")),
            ],
            vec![],
        );

        let config = resolver
            .resolve_policies(&subject_id("alice"), None)
            .await
            .unwrap();
        let flat = config.flatten();

        assert_eq!(flat[0].item.name(), "company-rule");
        assert!(flat[0].is_inherited);
        assert_eq!(flat[1].item.name(), "team-rule");
    }

    #[tokio::test]
    async fn test_cyclic_tree_is_truncated() {
        let resolver = resolver(
            vec![unit("team", Some("division")), unit("division", Some("team"))],
            vec![
                policy("team-rule", 1).for_org_unit(org("team")),
                policy("division-rule", 1).for_org_unit(org("division")),
            ],
            vec![],
        );

        let chain = resolver.ancestor_chain(&org("team")).await.unwrap();
        let ids: Vec<&str> = chain.iter().map(|u| u.id().as_str()).collect();
        assert_eq!(ids, vec!["team", "division"]);

        let config = resolver
            .resolve_policies(&subject_id("alice"), None)
            .await
            .unwrap();
        assert_eq!(config.inherited.len(), 1);
        assert_eq!(config.local.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_parent_ends_walk() {
        let resolver = resolver(vec![unit("team", Some("ghost"))], vec![], vec![]);

        let chain = resolver.ancestor_chain(&org("team")).await.unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_subject_or_unit() {
        let resolver = resolver(vec![], vec![], vec![]);

        let unknown = resolver.resolve_policies(&subject_id("bob"), None).await;
        assert!(matches!(unknown, Err(DomainError::NotFound { .. })));

        // alice exists but her unit does not
        let orphan = resolver.resolve_policies(&subject_id("alice"), None).await;
        assert!(matches!(orphan, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_objective_layers() {
        let resolver = resolver(
            three_levels(),
            vec![],
            vec![
                ObjectiveRecord::new("Company goal").for_org_unit(org("company")),
                ObjectiveRecord::new("Team goal").for_org_unit(org("team")),
                ObjectiveRecord::new("Personal goal").for_subject(subject_id("alice")),
                ObjectiveRecord::new("Project goal").for_project(project("apollo")),
                ObjectiveRecord::new("Done goal")
                    .for_org_unit(org("division"))
                    .with_status(ObjectiveStatus::Completed),
            ],
        );

        let config = resolver
            .resolve_objectives(&subject_id("alice"), Some(&project("apollo")))
            .await
            .unwrap();

        let inherited: Vec<&str> = config.inherited.iter().map(|e| e.item.title()).collect();
        let local: Vec<&str> = config.local.iter().map(|e| e.item.title()).collect();

        assert_eq!(inherited, vec!["Company goal"]);
        assert_eq!(local, vec!["Team goal", "Personal goal", "Project goal"]);
    }

    #[tokio::test]
    async fn test_subject_scoped_objective_in_both_layers() {
        let resolver = resolver(
            three_levels(),
            vec![],
            vec![ObjectiveRecord::new("Mentoring")
                .for_org_unit(org("company"))
                .for_subject(subject_id("alice"))],
        );

        let config = resolver
            .resolve_objectives(&subject_id("alice"), None)
            .await
            .unwrap();

        assert_eq!(config.inherited.len(), 1);
        assert_eq!(config.local.len(), 1);
        assert_eq!(config.inherited[0].item.title(), "Mentoring");
        assert_eq!(config.local[0].item.title(), "Mentoring");
    }

    #[tokio::test]
    async fn test_objective_on_own_unit_and_subject_is_local_once() {
        let resolver = resolver(
            three_levels(),
            vec![],
            vec![ObjectiveRecord::new("Pairing")
                .for_org_unit(org("team"))
                .for_subject(subject_id("alice"))],
        );

        let config = resolver
            .resolve_objectives(&subject_id("alice"), None)
            .await
            .unwrap();

        assert!(config.inherited.is_empty());
        assert_eq!(config.local.len(), 1);
    }

    #[tokio::test]
    async fn test_org_unit_repository_failure_propagates() {
        let mut org_units = MockOrgUnitRepository::new();
        org_units
            .expect_get()
            .returning(|_| Err(DomainError::internal("timeout")));

        let resolver = HierarchyResolver::new(
            Arc::new(org_units),
            Arc::new(InMemorySubjectRepository::with_subjects(vec![Subject::new(
                subject_id("alice"),
                "Alice",
                org("team"),
            )])),
            Arc::new(InMemoryPolicyRepository::new()),
            Arc::new(InMemoryObjectiveRepository::new()),
        );

        let result = resolver.resolve_policies(&subject_id("alice"), None).await;
        assert!(matches!(result, Err(DomainError::Internal { .. })));
    }
}
