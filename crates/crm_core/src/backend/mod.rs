//! Boundary to the hosted backend-as-a-service.
//!
//! # Responsibility
//! - Name every capability the client consumes as a trait: password auth,
//!   session events, privileged user RPCs and row-scoped table access.
//! - Ship [`LocalBackend`], a SQLite implementation of all of them.
//!
//! # Invariants
//! - Data calls fail with `NotAuthenticated` when no session is active.
//! - Admin RPCs fail with `Forbidden` unless the caller is an enabled
//!   System Admin.

use crate::model::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod admin;
mod auth;
mod data;
mod local;
mod password;

pub use admin::{AdminApi, NewUser};
pub use auth::{AuthApi, AuthEvent, AuthIdentity, AuthSession, MIN_PASSWORD_LEN};
pub use data::{EntityApi, NotificationApi, OrganizationApi, ProfileApi};
pub use local::LocalBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// Failure reported by the backend boundary.
#[derive(Debug)]
pub enum BackendError {
    /// Email/password pair did not match an identity.
    InvalidCredentials,
    NotAuthenticated,
    Forbidden(String),
    Conflict(String),
    NotFound(String),
    Validation(ValidationError),
    Storage(RepoError),
    /// The backend could not serve the call at all.
    Unavailable(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid login credentials"),
            Self::NotAuthenticated => write!(f, "not signed in"),
            Self::Forbidden(reason) => write!(f, "forbidden: {reason}"),
            Self::Conflict(reason) => write!(f, "{reason}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Unavailable(reason) => write!(f, "backend unavailable: {reason}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for BackendError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for BackendError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id.to_string()),
            RepoError::Conflict(reason) => Self::Conflict(reason),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

impl BackendError {
    /// Stable snake_case code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::NotAuthenticated => "not_authenticated",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::Unavailable(_) => "unavailable",
        }
    }
}
