//! Application-level user profile.
//!
//! # Invariants
//! - A profile links to at most one backend identity through `auth_id`.
//! - A disabled profile never counts as the signed-in user.

use super::role::Role;
use super::{require_email, require_text, RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CRM identity of a person, distinct from the backend's auth identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: RecordId,
    /// Stable identifier of the linked backend identity.
    pub auth_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
    /// Unix epoch milliseconds.
    pub last_login: Option<i64>,
}

impl UserProfile {
    /// New enabled profile with a generated id.
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            auth_id: None,
            name: name.into(),
            email: email.into(),
            role,
            enabled: true,
            last_login: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_email(&self.email)
    }

    /// First character of the display name, used for avatar initials.
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Profile fields an administrator may edit in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub enabled: Option<bool>,
    pub last_login: Option<i64>,
}

impl ProfilePatch {
    /// Applies the set fields onto `profile`.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(enabled) = self.enabled {
            profile.enabled = enabled;
        }
        if let Some(last_login) = self.last_login {
            profile.last_login = Some(last_login);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ProfilePatch, UserProfile};
    use crate::model::role::Role;

    #[test]
    fn patch_only_touches_set_fields() {
        let mut profile = UserProfile::new("Ada", "ada@example.com", Role::SalesExecutive);
        ProfilePatch {
            role: Some(Role::SalesManager),
            enabled: Some(false),
            ..ProfilePatch::default()
        }
        .apply_to(&mut profile);

        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.role, Role::SalesManager);
        assert!(!profile.enabled);
    }

    #[test]
    fn validate_requires_name_and_email() {
        let profile = UserProfile::new(" ", "ada@example.com", Role::Customer);
        assert!(profile.validate().is_err());
        let profile = UserProfile::new("Ada", "ada", Role::Customer);
        assert!(profile.validate().is_err());
        assert_eq!(
            UserProfile::new("ada", "ada@example.com", Role::Customer).initial(),
            'A'
        );
    }
}
