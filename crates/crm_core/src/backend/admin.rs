//! Privileged user-lifecycle RPCs.
//!
//! These run with elevated backend privilege instead of plain table access,
//! so the implementation checks the caller's role itself.

use super::BackendResult;
use crate::model::profile::UserProfile;
use crate::model::role::Role;
use uuid::Uuid;

/// Input of `admin_create_user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

pub trait AdminApi: Send + Sync {
    /// Creates an identity and its linked profile in one step.
    fn admin_create_user(&self, user: &NewUser) -> BackendResult<UserProfile>;
    /// Deletes an identity together with its profile and sessions.
    fn admin_delete_user(&self, auth_id: Uuid) -> BackendResult<()>;
    fn admin_update_password(&self, auth_id: Uuid, new_password: &str) -> BackendResult<()>;
}
