//! Organizational tree entities

use serde::{Deserialize, Serialize};

use super::validation::{validate_hierarchy_id, HierarchyValidationError};

macro_rules! hierarchy_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new ID after validation
            pub fn new(id: impl Into<String>) -> Result<Self, HierarchyValidationError> {
                let id = id.into();
                validate_hierarchy_id($kind, &id)?;
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = HierarchyValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

hierarchy_id!(
    /// Org unit identifier - alphanumeric, hyphens and underscores, max 50 characters
    OrgUnitId,
    "Org unit"
);

hierarchy_id!(
    /// Subject identifier (the person a resolution is computed for)
    SubjectId,
    "Subject"
);

hierarchy_id!(
    /// Project identifier
    ProjectId,
    "Project"
);

/// A node in the organizational forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgUnit {
    id: OrgUnitId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<OrgUnitId>,
}

impl OrgUnit {
    pub fn new(id: OrgUnitId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: OrgUnitId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn id(&self) -> &OrgUnitId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<&OrgUnitId> {
        self.parent_id.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A member of exactly one org unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    id: SubjectId,
    name: String,
    org_unit_id: OrgUnitId,
}

impl Subject {
    pub fn new(id: SubjectId, name: impl Into<String>, org_unit_id: OrgUnitId) -> Self {
        Self {
            id,
            name: name.into(),
            org_unit_id,
        }
    }

    pub fn id(&self) -> &SubjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn org_unit_id(&self) -> &OrgUnitId {
        &self.org_unit_id
    }
}
