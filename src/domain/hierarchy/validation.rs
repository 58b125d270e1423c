//! Hierarchy identifier validation

use thiserror::Error;

/// Errors that can occur during hierarchy validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HierarchyValidationError {
    #[error("{kind} ID cannot be empty")]
    EmptyId { kind: &'static str },

    #[error("{kind} ID cannot exceed {max} characters")]
    IdTooLong { kind: &'static str, max: usize },

    #[error("{kind} ID can only contain alphanumeric characters, hyphens and underscores")]
    InvalidIdCharacters { kind: &'static str },

    #[error("{kind} ID cannot start or end with a hyphen")]
    InvalidIdFormat { kind: &'static str },

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name cannot exceed {0} characters")]
    NameTooLong(usize),
}

pub const MAX_HIERARCHY_ID_LENGTH: usize = 50;
const MAX_NAME_LENGTH: usize = 200;

/// Validate an org unit, subject or project ID
pub fn validate_hierarchy_id(kind: &'static str, id: &str) -> Result<(), HierarchyValidationError> {
    if id.is_empty() {
        return Err(HierarchyValidationError::EmptyId { kind });
    }

    if id.len() > MAX_HIERARCHY_ID_LENGTH {
        return Err(HierarchyValidationError::IdTooLong {
            kind,
            max: MAX_HIERARCHY_ID_LENGTH,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(HierarchyValidationError::InvalidIdCharacters { kind });
    }

    if id.starts_with('-') || id.ends_with('-') {
        return Err(HierarchyValidationError::InvalidIdFormat { kind });
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), HierarchyValidationError> {
    if name.trim().is_empty() {
        return Err(HierarchyValidationError::EmptyName);
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(HierarchyValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(validate_hierarchy_id("Org unit", "engineering").is_ok());
        assert!(validate_hierarchy_id("Org unit", "platform-team").is_ok());
        assert!(validate_hierarchy_id("Subject", "user_42").is_ok());
    }

    #[test]
    fn test_empty_id() {
        assert_eq!(
            validate_hierarchy_id("Subject", ""),
            Err(HierarchyValidationError::EmptyId { kind: "Subject" })
        );
    }

    #[test]
    fn test_id_too_long() {
        let long_id = "a".repeat(51);
        assert_eq!(
            validate_hierarchy_id("Project", &long_id),
            Err(HierarchyValidationError::IdTooLong {
                kind: "Project",
                max: 50
            })
        );
    }

    #[test]
    fn test_invalid_characters_and_format() {
        assert!(matches!(
            validate_hierarchy_id("Org unit", "a.b"),
            Err(HierarchyValidationError::InvalidIdCharacters { .. })
        ));
        assert!(matches!(
            validate_hierarchy_id("Org unit", "-eng"),
            Err(HierarchyValidationError::InvalidIdFormat { .. })
        ));
    }

    #[test]
    fn test_error_message_names_kind() {
        let err = validate_hierarchy_id("Org unit", "").unwrap_err();
        assert_eq!(err.to_string(), "Org unit ID cannot be empty");
    }

    #[test]
    fn test_names() {
        assert!(validate_name("Engineering").is_ok());
        assert_eq!(validate_name("  "), Err(HierarchyValidationError::EmptyName));
        assert_eq!(
            validate_name(&"n".repeat(201)),
            Err(HierarchyValidationError::NameTooLong(200))
        );
    }
}
