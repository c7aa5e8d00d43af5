//! SQLite repositories behind the local backend.
//!
//! # Responsibility
//! - Own every SQL statement the crate issues.
//! - Translate rows into model types and reject rows that do not decode.
//!
//! # Invariants
//! - Write paths validate the model before touching SQL.
//! - Missing targets of update/delete surface as `RepoError::NotFound`.

pub mod credential_repo;
pub mod entity_repo;
mod error;
pub mod notification_repo;
pub mod organization_repo;
pub mod profile_repo;
pub mod record;

pub use credential_repo::{AuthUserRow, SessionRow, SqliteCredentialRepository};
pub use error::{RepoError, RepoResult};
pub use notification_repo::SqliteNotificationRepository;
pub use organization_repo::SqliteOrganizationRepository;
pub use profile_repo::SqliteProfileRepository;
pub use record::{SqliteTable, TableRecord};
