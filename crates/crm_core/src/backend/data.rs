//! Row-scoped table access.

use super::BackendResult;
use crate::model::notification::{Notification, NotificationDraft};
use crate::model::organization::OrganizationSettings;
use crate::model::profile::UserProfile;
use crate::model::RecordId;
use uuid::Uuid;

/// Application user profiles.
pub trait ProfileApi: Send + Sync {
    fn find_profile_by_auth_id(&self, auth_id: Uuid) -> BackendResult<Option<UserProfile>>;
    fn insert_profile(&self, profile: &UserProfile) -> BackendResult<()>;
    /// Stores editable fields and returns the row as persisted.
    fn update_profile(&self, profile: &UserProfile) -> BackendResult<UserProfile>;
    fn list_profiles(&self) -> BackendResult<Vec<UserProfile>>;
    fn touch_last_login(&self, profile_id: RecordId, at_epoch_ms: i64) -> BackendResult<()>;
}

/// Per-user notifications, scoped by profile id.
pub trait NotificationApi: Send + Sync {
    /// Newest first.
    fn list_notifications(&self, user_id: RecordId) -> BackendResult<Vec<Notification>>;
    fn create_notification(
        &self,
        user_id: RecordId,
        draft: &NotificationDraft,
    ) -> BackendResult<Notification>;
    fn mark_notification_read(&self, user_id: RecordId, id: RecordId) -> BackendResult<()>;
    fn mark_all_notifications_read(&self, user_id: RecordId) -> BackendResult<()>;
    fn delete_notification(&self, user_id: RecordId, id: RecordId) -> BackendResult<()>;
}

/// CRUD over one CRM entity table.
pub trait EntityApi<R>: Send + Sync {
    /// Newest first.
    fn list_records(&self) -> BackendResult<Vec<R>>;
    fn get_record(&self, id: RecordId) -> BackendResult<Option<R>>;
    /// Returns the record as stored, with timestamps filled in.
    fn create_record(&self, record: &R) -> BackendResult<R>;
    fn update_record(&self, record: &R) -> BackendResult<R>;
    fn delete_record(&self, id: RecordId) -> BackendResult<()>;
}

/// The single organization settings row.
pub trait OrganizationApi: Send + Sync {
    fn get_organization_settings(&self) -> BackendResult<Option<OrganizationSettings>>;
    fn save_organization_settings(&self, settings: &OrganizationSettings) -> BackendResult<()>;
}
