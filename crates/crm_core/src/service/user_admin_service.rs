//! User and role management screen.
//!
//! Profile edits go through plain table access; creating, deleting and
//! re-keying users goes through the privileged admin RPCs.

use super::{ServiceError, ServiceResult};
use crate::backend::{AdminApi, NewUser, ProfileApi, MIN_PASSWORD_LEN};
use crate::model::profile::{ProfilePatch, UserProfile};
use log::info;
use std::sync::Arc;
use uuid::Uuid;

pub struct UserAdminService<B> {
    backend: Arc<B>,
}

impl<B: ProfileApi + AdminApi> UserAdminService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn list(&self) -> ServiceResult<Vec<UserProfile>> {
        Ok(self.backend.list_profiles()?)
    }

    /// Case-insensitive match on name, email or role label.
    pub fn search(&self, query: &str) -> ServiceResult<Vec<UserProfile>> {
        let needle = query.trim().to_lowercase();
        let profiles = self.list()?;
        if needle.is_empty() {
            return Ok(profiles);
        }
        Ok(profiles
            .into_iter()
            .filter(|profile| {
                [
                    profile.name.as_str(),
                    profile.email.as_str(),
                    profile.role.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect())
    }

    pub fn set_enabled(&self, profile: &UserProfile, enabled: bool) -> ServiceResult<UserProfile> {
        self.edit(
            profile,
            &ProfilePatch {
                enabled: Some(enabled),
                ..ProfilePatch::default()
            },
            None,
        )
    }

    /// Applies `patch`; a non-empty `new_password` also resets the password.
    ///
    /// The reset runs before the profile write, so a failed reset leaves
    /// the stored profile untouched.
    pub fn edit(
        &self,
        profile: &UserProfile,
        patch: &ProfilePatch,
        new_password: Option<&str>,
    ) -> ServiceResult<UserProfile> {
        let new_password = new_password.filter(|password| !password.is_empty());
        let auth_id = match new_password {
            Some(password) => {
                if password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(ServiceError::InvalidInput(format!(
                        "password must be at least {MIN_PASSWORD_LEN} characters"
                    )));
                }
                Some(linked_identity(profile)?)
            }
            None => None,
        };

        let mut edited = profile.clone();
        patch.apply_to(&mut edited);
        edited.validate()?;
        if let (Some(auth_id), Some(password)) = (auth_id, new_password) {
            self.backend.admin_update_password(auth_id, password)?;
        }
        let updated = self.backend.update_profile(&edited)?;
        info!(
            "event=user_edit module=service status=ok profile_id={} password_reset={}",
            updated.id,
            new_password.is_some()
        );
        Ok(updated)
    }

    pub fn create(&self, user: &NewUser) -> ServiceResult<UserProfile> {
        let profile = self.backend.admin_create_user(user)?;
        info!(
            "event=user_create module=service status=ok profile_id={}",
            profile.id
        );
        Ok(profile)
    }

    pub fn delete(&self, profile: &UserProfile) -> ServiceResult<()> {
        let auth_id = linked_identity(profile)?;
        self.backend.admin_delete_user(auth_id)?;
        info!(
            "event=user_delete module=service status=ok profile_id={}",
            profile.id
        );
        Ok(())
    }
}

fn linked_identity(profile: &UserProfile) -> ServiceResult<Uuid> {
    profile.auth_id.ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "profile {} has no linked sign-in identity",
            profile.id
        ))
    })
}
