//! SQLite-backed implementation of every backend trait.
//!
//! # Invariants
//! - One device session at a time: signing in replaces any stored session.
//! - The stored session survives process restarts and is restored by
//!   `get_session`.
//! - Events are published after the state lock is released.

use super::admin::{AdminApi, NewUser};
use super::auth::{AuthApi, AuthEvent, AuthIdentity, AuthSession, MIN_PASSWORD_LEN};
use super::data::{EntityApi, NotificationApi, OrganizationApi, ProfileApi};
use super::password::{hash_password, verify_password};
use super::{BackendError, BackendResult};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::notification::{Notification, NotificationDraft};
use crate::model::organization::OrganizationSettings;
use crate::model::profile::UserProfile;
use crate::model::role::Role;
use crate::model::{now_epoch_ms, require_email, RecordId, ValidationError};
use crate::repo::{
    AuthUserRow, SessionRow, SqliteCredentialRepository, SqliteNotificationRepository,
    SqliteOrganizationRepository, SqliteProfileRepository, SqliteTable, TableRecord,
};
use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

struct LocalState {
    conn: Connection,
    current: Option<AuthSession>,
}

/// Local stand-in for the hosted backend.
pub struct LocalBackend {
    state: Mutex<LocalState>,
    subscribers: Mutex<Vec<Sender<AuthEvent>>>,
}

impl LocalBackend {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        open_db(path).map(Self::from_connection)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        open_db_in_memory().map(Self::from_connection)
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            state: Mutex::new(LocalState {
                conn,
                current: None,
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Whether any enabled System Admin profile exists.
    pub fn has_system_admin(&self) -> BackendResult<bool> {
        let state = self.lock()?;
        let admins =
            SqliteProfileRepository::new(&state.conn).count_enabled_with_role(Role::SystemAdmin)?;
        Ok(admins > 0)
    }

    /// Creates the first System Admin without a signed-in caller.
    ///
    /// Refused with `Conflict` once any enabled System Admin exists.
    pub fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> BackendResult<UserProfile> {
        let mut state = self.lock()?;
        let admins =
            SqliteProfileRepository::new(&state.conn).count_enabled_with_role(Role::SystemAdmin)?;
        if admins > 0 {
            return Err(BackendError::Conflict(
                "a System Admin already exists".to_string(),
            ));
        }

        let profile = create_identity_with_profile(
            &mut state.conn,
            &NewUser {
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                role: Role::SystemAdmin,
            },
        )?;
        info!(
            "event=admin_bootstrap module=backend status=ok profile_id={}",
            profile.id
        );
        Ok(profile)
    }

    fn lock(&self) -> BackendResult<MutexGuard<'_, LocalState>> {
        self.state
            .lock()
            .map_err(|_| BackendError::Unavailable("backend state lock poisoned".to_string()))
    }

    fn publish(&self, event: AuthEvent) {
        let name = event.name();
        let Ok(mut subscribers) = self.subscribers.lock() else {
            warn!("event=auth_publish module=backend status=error error_code=lock_poisoned kind={name}");
            return;
        };
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
        info!(
            "event=auth_publish module=backend status=ok kind={name} subscribers={}",
            subscribers.len()
        );
    }
}

impl LocalState {
    /// Current session, provided its token is still stored.
    fn active_session(&mut self) -> BackendResult<AuthSession> {
        let Some(session) = self.current.clone() else {
            return Err(BackendError::NotAuthenticated);
        };
        let stored = SqliteCredentialRepository::new(&self.conn).find_session(&session.access_token)?;
        if stored.is_none() {
            self.current = None;
            return Err(BackendError::NotAuthenticated);
        }
        Ok(session)
    }

    fn require_admin(&mut self) -> BackendResult<AuthSession> {
        let session = self.active_session()?;
        let caller = SqliteProfileRepository::new(&self.conn).find_by_auth_id(session.identity.id)?;
        match caller {
            Some(profile) if profile.enabled && profile.role == Role::SystemAdmin => Ok(session),
            _ => Err(BackendError::Forbidden(
                "requires an enabled System Admin".to_string(),
            )),
        }
    }

    fn start_session(&mut self, identity: AuthIdentity) -> BackendResult<AuthSession> {
        let session = AuthSession {
            access_token: new_token(),
            identity,
            issued_at: now_epoch_ms(),
        };
        let credentials = SqliteCredentialRepository::new(&self.conn);
        credentials.clear_sessions()?;
        credentials.insert_session(&session_row(&session))?;
        self.current = Some(session.clone());
        Ok(session)
    }

    fn restore_session(&mut self) -> BackendResult<Option<AuthSession>> {
        let credentials = SqliteCredentialRepository::new(&self.conn);
        let Some(row) = credentials.latest_session()? else {
            return Ok(None);
        };
        let Some(user) = credentials.get_user(row.auth_id)? else {
            return Ok(None);
        };
        let session = AuthSession {
            access_token: row.access_token,
            identity: identity_from_row(user),
            issued_at: row.issued_at,
        };
        self.current = Some(session.clone());
        Ok(Some(session))
    }
}

impl AuthApi for LocalBackend {
    fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let session = {
            let mut state = self.lock()?;
            let user = SqliteCredentialRepository::new(&state.conn).find_user_by_email(email)?;
            let Some(user) = user.filter(|user| verify_password(password, &user.password_hash))
            else {
                warn!("event=auth_sign_in module=backend status=error error_code=invalid_credentials");
                return Err(BackendError::InvalidCredentials);
            };
            state.start_session(identity_from_row(user))?
        };

        info!(
            "event=auth_sign_in module=backend status=ok auth_id={}",
            session.identity.id
        );
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        check_new_credentials(email, password)?;
        let session = {
            let mut state = self.lock()?;
            let credentials = SqliteCredentialRepository::new(&state.conn);
            if credentials.email_taken(email)? {
                return Err(BackendError::Conflict(
                    "user already registered".to_string(),
                ));
            }
            let row = AuthUserRow {
                id: Uuid::new_v4(),
                email: email.trim().to_string(),
                password_hash: hash_password(password)?,
                full_name: None,
                role: None,
            };
            credentials.insert_user(&row)?;
            state.start_session(identity_from_row(row))?
        };

        info!(
            "event=auth_sign_up module=backend status=ok auth_id={}",
            session.identity.id
        );
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    fn sign_out(&self) -> BackendResult<()> {
        let ended = {
            let mut state = self.lock()?;
            match state.current.take() {
                Some(session) => {
                    SqliteCredentialRepository::new(&state.conn)
                        .delete_session(&session.access_token)?;
                    true
                }
                None => false,
            }
        };

        if ended {
            info!("event=auth_sign_out module=backend status=ok");
            self.publish(AuthEvent::SignedOut);
        }
        Ok(())
    }

    fn get_session(&self) -> BackendResult<Option<AuthSession>> {
        let mut state = self.lock()?;
        if state.current.is_some() {
            return match state.active_session() {
                Ok(session) => Ok(Some(session)),
                Err(BackendError::NotAuthenticated) => Ok(None),
                Err(err) => Err(err),
            };
        }
        state.restore_session()
    }

    fn refresh_session(&self) -> BackendResult<AuthSession> {
        let session = {
            let mut state = self.lock()?;
            let previous = state.active_session()?;
            let refreshed = AuthSession {
                access_token: new_token(),
                identity: previous.identity,
                issued_at: now_epoch_ms(),
            };
            let credentials = SqliteCredentialRepository::new(&state.conn);
            credentials.delete_session(&previous.access_token)?;
            credentials.insert_session(&session_row(&refreshed))?;
            state.current = Some(refreshed.clone());
            refreshed
        };

        self.publish(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    fn update_password(&self, new_password: &str) -> BackendResult<()> {
        check_password(new_password)?;
        let session = {
            let mut state = self.lock()?;
            let session = state.active_session()?;
            SqliteCredentialRepository::new(&state.conn)
                .update_password_hash(session.identity.id, &hash_password(new_password)?)?;
            session
        };

        info!(
            "event=auth_update_password module=backend status=ok auth_id={}",
            session.identity.id
        );
        self.publish(AuthEvent::UserUpdated(session));
        Ok(())
    }

    fn subscribe(&self) -> Receiver<AuthEvent> {
        let (sender, receiver) = channel();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(sender),
            Err(_) => warn!(
                "event=auth_subscribe module=backend status=error error_code=lock_poisoned"
            ),
        }
        receiver
    }
}

impl AdminApi for LocalBackend {
    fn admin_create_user(&self, user: &NewUser) -> BackendResult<UserProfile> {
        let mut state = self.lock()?;
        let caller = state.require_admin()?;
        let profile = create_identity_with_profile(&mut state.conn, user)?;
        info!(
            "event=admin_create_user module=backend status=ok caller={} profile_id={}",
            caller.identity.id, profile.id
        );
        Ok(profile)
    }

    fn admin_delete_user(&self, auth_id: Uuid) -> BackendResult<()> {
        let mut state = self.lock()?;
        let caller = state.require_admin()?;
        if caller.identity.id == auth_id {
            return Err(BackendError::Forbidden(
                "cannot delete the signed-in account".to_string(),
            ));
        }
        SqliteCredentialRepository::new(&state.conn).delete_user(auth_id)?;
        info!(
            "event=admin_delete_user module=backend status=ok caller={} auth_id={auth_id}",
            caller.identity.id
        );
        Ok(())
    }

    fn admin_update_password(&self, auth_id: Uuid, new_password: &str) -> BackendResult<()> {
        check_password(new_password)?;
        let mut state = self.lock()?;
        let caller = state.require_admin()?;
        SqliteCredentialRepository::new(&state.conn)
            .update_password_hash(auth_id, &hash_password(new_password)?)?;
        info!(
            "event=admin_update_password module=backend status=ok caller={} auth_id={auth_id}",
            caller.identity.id
        );
        Ok(())
    }
}

impl ProfileApi for LocalBackend {
    fn find_profile_by_auth_id(&self, auth_id: Uuid) -> BackendResult<Option<UserProfile>> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteProfileRepository::new(&state.conn).find_by_auth_id(auth_id)?)
    }

    fn insert_profile(&self, profile: &UserProfile) -> BackendResult<()> {
        let mut state = self.lock()?;
        let session = state.active_session()?;
        if profile.auth_id != Some(session.identity.id) {
            state.require_admin()?;
        }
        Ok(SqliteProfileRepository::new(&state.conn).insert(profile)?)
    }

    /// Callers may edit the name and email of their own profile. Any other
    /// edit, including role or enabled changes, needs an enabled System Admin.
    fn update_profile(&self, profile: &UserProfile) -> BackendResult<UserProfile> {
        let mut state = self.lock()?;
        let session = state.active_session()?;
        let existing = SqliteProfileRepository::new(&state.conn)
            .get(profile.id)?
            .ok_or_else(|| BackendError::NotFound(profile.id.to_string()))?;
        let own_profile = existing.auth_id == Some(session.identity.id);
        if !own_profile || existing.role != profile.role || existing.enabled != profile.enabled {
            if let Err(err) = state.require_admin() {
                warn!(
                    "event=profile_update module=backend status=error error_code={} profile_id={}",
                    err.code(),
                    profile.id
                );
                return Err(err);
            }
        }
        let profiles = SqliteProfileRepository::new(&state.conn);
        profiles.update(profile)?;
        profiles
            .get(profile.id)?
            .ok_or_else(|| BackendError::NotFound(profile.id.to_string()))
    }

    fn list_profiles(&self) -> BackendResult<Vec<UserProfile>> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteProfileRepository::new(&state.conn).list()?)
    }

    fn touch_last_login(&self, profile_id: RecordId, at_epoch_ms: i64) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteProfileRepository::new(&state.conn).touch_last_login(profile_id, at_epoch_ms)?)
    }
}

impl NotificationApi for LocalBackend {
    fn list_notifications(&self, user_id: RecordId) -> BackendResult<Vec<Notification>> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteNotificationRepository::new(&state.conn).list_for_user(user_id)?)
    }

    fn create_notification(
        &self,
        user_id: RecordId,
        draft: &NotificationDraft,
    ) -> BackendResult<Notification> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteNotificationRepository::new(&state.conn).create(user_id, draft)?)
    }

    fn mark_notification_read(&self, user_id: RecordId, id: RecordId) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteNotificationRepository::new(&state.conn).mark_read(user_id, id)?)
    }

    fn mark_all_notifications_read(&self, user_id: RecordId) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.active_session()?;
        SqliteNotificationRepository::new(&state.conn).mark_all_read(user_id)?;
        Ok(())
    }

    fn delete_notification(&self, user_id: RecordId, id: RecordId) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteNotificationRepository::new(&state.conn).delete(user_id, id)?)
    }
}

impl<R: TableRecord> EntityApi<R> for LocalBackend {
    fn list_records(&self) -> BackendResult<Vec<R>> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteTable::<R>::new(&state.conn).list()?)
    }

    fn get_record(&self, id: RecordId) -> BackendResult<Option<R>> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteTable::<R>::new(&state.conn).get(id)?)
    }

    fn create_record(&self, record: &R) -> BackendResult<R> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteTable::<R>::new(&state.conn).create(record)?)
    }

    fn update_record(&self, record: &R) -> BackendResult<R> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteTable::<R>::new(&state.conn).update(record)?)
    }

    fn delete_record(&self, id: RecordId) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteTable::<R>::new(&state.conn).delete(id)?)
    }
}

impl OrganizationApi for LocalBackend {
    fn get_organization_settings(&self) -> BackendResult<Option<OrganizationSettings>> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteOrganizationRepository::new(&state.conn).get()?)
    }

    fn save_organization_settings(&self, settings: &OrganizationSettings) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.active_session()?;
        Ok(SqliteOrganizationRepository::new(&state.conn).upsert(settings)?)
    }
}

fn create_identity_with_profile(
    conn: &mut Connection,
    user: &NewUser,
) -> BackendResult<UserProfile> {
    check_new_credentials(&user.email, &user.password)?;
    let auth_row = AuthUserRow {
        id: Uuid::new_v4(),
        email: user.email.trim().to_string(),
        password_hash: hash_password(&user.password)?,
        full_name: Some(user.name.clone()),
        role: Some(user.role.as_str().to_string()),
    };
    let mut profile = UserProfile::new(user.name.clone(), auth_row.email.clone(), user.role);
    profile.auth_id = Some(auth_row.id);
    profile.validate()?;

    let tx = conn.transaction()?;
    {
        let credentials = SqliteCredentialRepository::new(&tx);
        if credentials.email_taken(&auth_row.email)? {
            return Err(BackendError::Conflict(
                "user already registered".to_string(),
            ));
        }
        credentials.insert_user(&auth_row)?;
        SqliteProfileRepository::new(&tx).insert(&profile)?;
    }
    tx.commit()?;
    Ok(profile)
}

fn check_new_credentials(email: &str, password: &str) -> BackendResult<()> {
    require_email(email)?;
    check_password(password)
}

fn check_password(password: &str) -> BackendResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::OutOfRange {
            field: "password",
            detail: format!("must be at least {MIN_PASSWORD_LEN} characters"),
        }
        .into());
    }
    Ok(())
}

fn identity_from_row(row: AuthUserRow) -> AuthIdentity {
    AuthIdentity {
        id: row.id,
        email: row.email,
        full_name: row.full_name,
        role: row.role,
    }
}

fn session_row(session: &AuthSession) -> SessionRow {
    SessionRow {
        access_token: session.access_token.clone(),
        auth_id: session.identity.id,
        issued_at: session.issued_at,
    }
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::LocalBackend;
    use crate::backend::{AdminApi, AuthApi, BackendError, EntityApi, NewUser, ProfileApi};
    use crate::model::profile::UserProfile;
    use crate::model::role::Role;
    use crate::model::sales::Lead;

    fn backend_with_admin() -> LocalBackend {
        let backend = LocalBackend::open_in_memory().expect("open backend");
        backend
            .bootstrap_admin("root@example.com", "rootpass", "Root")
            .expect("bootstrap");
        backend
    }

    #[test]
    fn sign_in_rejects_wrong_password_and_unknown_email() {
        let backend = backend_with_admin();
        assert!(matches!(
            backend.sign_in_with_password("root@example.com", "wrong!"),
            Err(BackendError::InvalidCredentials)
        ));
        assert!(matches!(
            backend.sign_in_with_password("nobody@example.com", "rootpass"),
            Err(BackendError::InvalidCredentials)
        ));
        let session = backend
            .sign_in_with_password("ROOT@example.com", "rootpass")
            .expect("case-insensitive email");
        assert_eq!(session.identity.full_name.as_deref(), Some("Root"));
    }

    #[test]
    fn sign_up_validates_and_rejects_duplicates() {
        let backend = LocalBackend::open_in_memory().expect("open backend");
        assert!(matches!(
            backend.sign_up("not-an-email", "secret1"),
            Err(BackendError::Validation(_))
        ));
        assert!(matches!(
            backend.sign_up("ada@example.com", "12345"),
            Err(BackendError::Validation(_))
        ));
        backend.sign_up("ada@example.com", "123456").expect("sign up");
        assert!(matches!(
            backend.sign_up("Ada@Example.com", "123456"),
            Err(BackendError::Conflict(_))
        ));
    }

    #[test]
    fn data_calls_need_a_session() {
        let backend = backend_with_admin();
        let lead = Lead::new("Grace", "grace@example.com", "Website");
        assert!(matches!(
            EntityApi::<Lead>::create_record(&backend, &lead),
            Err(BackendError::NotAuthenticated)
        ));

        backend
            .sign_in_with_password("root@example.com", "rootpass")
            .expect("sign in");
        EntityApi::<Lead>::create_record(&backend, &lead).expect("create");

        backend.sign_out().expect("sign out");
        assert!(matches!(
            EntityApi::<Lead>::list_records(&backend),
            Err(BackendError::NotAuthenticated)
        ));
    }

    #[test]
    fn admin_rpcs_require_system_admin() {
        let backend = backend_with_admin();
        backend.sign_up("ada@example.com", "secret1").expect("sign up");
        let request = NewUser {
            email: "bob@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Bob".to_string(),
            role: Role::SalesExecutive,
        };
        assert!(matches!(
            backend.admin_create_user(&request),
            Err(BackendError::Forbidden(_))
        ));

        backend
            .sign_in_with_password("root@example.com", "rootpass")
            .expect("sign in");
        let bob = backend.admin_create_user(&request).expect("create bob");
        let bob_auth = bob.auth_id.expect("linked identity");
        assert_eq!(
            backend.find_profile_by_auth_id(bob_auth).expect("find"),
            Some(bob.clone())
        );

        backend
            .admin_update_password(bob_auth, "newsecret")
            .expect("reset password");
        backend.admin_delete_user(bob_auth).expect("delete bob");
        assert!(backend.find_profile_by_auth_id(bob_auth).expect("find").is_none());
        assert!(matches!(
            backend.sign_in_with_password("bob@example.com", "newsecret"),
            Err(BackendError::InvalidCredentials)
        ));
    }

    #[test]
    fn non_admin_cannot_change_role_or_enabled_on_own_profile() {
        let backend = backend_with_admin();
        let session = backend.sign_up("ada@example.com", "secret1").expect("sign up");
        let mut own = UserProfile::new("Ada", "ada@example.com", Role::Customer);
        own.auth_id = Some(session.identity.id);
        backend.insert_profile(&own).expect("insert own profile");

        let mut promoted = own.clone();
        promoted.role = Role::SystemAdmin;
        assert!(matches!(
            backend.update_profile(&promoted),
            Err(BackendError::Forbidden(_))
        ));
        let mut disabled = own.clone();
        disabled.enabled = false;
        assert!(matches!(
            backend.update_profile(&disabled),
            Err(BackendError::Forbidden(_))
        ));
        let stored = backend
            .find_profile_by_auth_id(session.identity.id)
            .expect("find")
            .expect("stored profile");
        assert_eq!(stored.role, Role::Customer);
        assert!(stored.enabled);

        let mut renamed = own.clone();
        renamed.name = "Ada Lovelace".to_string();
        let saved = backend.update_profile(&renamed).expect("rename own profile");
        assert_eq!(saved.name, "Ada Lovelace");
        assert_eq!(saved.role, Role::Customer);
    }

    #[test]
    fn non_admin_cannot_write_other_profiles() {
        let backend = backend_with_admin();
        let root = backend
            .sign_in_with_password("root@example.com", "rootpass")
            .expect("sign in");
        let root_profile = backend
            .find_profile_by_auth_id(root.identity.id)
            .expect("find")
            .expect("root profile");

        backend.sign_up("ada@example.com", "secret1").expect("sign up");
        let mut renamed = root_profile.clone();
        renamed.name = "Mallory".to_string();
        assert!(matches!(
            backend.update_profile(&renamed),
            Err(BackendError::Forbidden(_))
        ));
        let mut foreign = UserProfile::new("Eve", "eve@example.com", Role::SystemAdmin);
        foreign.auth_id = Some(root.identity.id);
        assert!(matches!(
            backend.insert_profile(&foreign),
            Err(BackendError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_can_change_roles_of_other_profiles() {
        let backend = backend_with_admin();
        backend
            .sign_in_with_password("root@example.com", "rootpass")
            .expect("sign in");
        let bob = backend
            .admin_create_user(&NewUser {
                email: "bob@example.com".to_string(),
                password: "secret1".to_string(),
                name: "Bob".to_string(),
                role: Role::Customer,
            })
            .expect("create bob");
        let mut promoted = bob.clone();
        promoted.role = Role::SalesManager;
        promoted.enabled = false;
        let saved = backend.update_profile(&promoted).expect("promote bob");
        assert_eq!(saved.role, Role::SalesManager);
        assert!(!saved.enabled);
    }

    #[test]
    fn admin_cannot_delete_itself_and_bootstrap_runs_once() {
        let backend = backend_with_admin();
        let session = backend
            .sign_in_with_password("root@example.com", "rootpass")
            .expect("sign in");
        assert!(matches!(
            backend.admin_delete_user(session.identity.id),
            Err(BackendError::Forbidden(_))
        ));
        assert!(matches!(
            backend.bootstrap_admin("second@example.com", "rootpass", "Second"),
            Err(BackendError::Conflict(_))
        ));
    }

    #[test]
    fn subscribers_see_session_changes_in_order() {
        let backend = backend_with_admin();
        let events = backend.subscribe();

        backend
            .sign_in_with_password("root@example.com", "rootpass")
            .expect("sign in");
        backend.refresh_session().expect("refresh");
        backend.update_password("rootpass2").expect("update password");
        backend.sign_out().expect("sign out");
        backend.sign_out().expect("second sign out is a no-op");

        let names: Vec<_> = events.try_iter().map(|event| event.name()).collect();
        assert_eq!(
            names,
            vec!["signed_in", "token_refreshed", "user_updated", "signed_out"]
        );
        assert!(matches!(
            backend.sign_in_with_password("root@example.com", "rootpass"),
            Err(BackendError::InvalidCredentials)
        ));
    }

    #[test]
    fn session_is_restored_from_storage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crm.sqlite3");
        let auth_id = {
            let backend = LocalBackend::open(&path).expect("open");
            backend
                .bootstrap_admin("root@example.com", "rootpass", "Root")
                .expect("bootstrap");
            backend
                .sign_in_with_password("root@example.com", "rootpass")
                .expect("sign in")
                .identity
                .id
        };

        let reopened = LocalBackend::open(&path).expect("reopen");
        let restored = reopened.get_session().expect("get").expect("restored");
        assert_eq!(restored.identity.id, auth_id);

        reopened.sign_out().expect("sign out");
        let again = LocalBackend::open(&path).expect("reopen again");
        assert!(again.get_session().expect("get").is_none());
    }
}
