//! Who is signed in.
//!
//! # Responsibility
//! - Mirror backend session changes and resolve each session to exactly one
//!   application profile, creating the profile on first sight.
//! - Expose login/signup/logout and the current user's permissions.
//!
//! # Invariants
//! - Profile resolution is single-flight: one resolution runs at a time and
//!   queued session events are coalesced so only the latest is resolved.
//! - A resolution whose trigger was superseded (e.g. by logout) never
//!   overwrites the newer state.
//! - Resolution failures are logged and end in a non-loading state.
//! - A disabled profile is never exposed as the current user.

use crate::access::permissions::PermissionTable;
use crate::backend::{
    AuthApi, AuthEvent, AuthIdentity, AuthSession, BackendError, BackendResult, ProfileApi,
    MIN_PASSWORD_LEN,
};
use crate::model::now_epoch_ms;
use crate::model::profile::UserProfile;
use crate::model::role::{Module, Role};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use uuid::Uuid;

/// Lifecycle of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// A session exists and its profile is being looked up.
    Resolving,
    Authenticated(UserProfile),
    /// The session resolved to a disabled profile.
    Disabled(UserProfile),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Resolving => "resolving",
            Self::Authenticated(_) => "authenticated",
            Self::Disabled(_) => "disabled",
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    Backend(BackendError),
    MissingField(&'static str),
    PasswordMismatch,
    PasswordTooShort { min: usize },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for SessionError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

struct SessionInner {
    state: SessionState,
    session: Option<AuthSession>,
    /// Bumped by every trigger; a resolution only commits if it still matches.
    generation: u64,
    last_error: Option<String>,
}

/// Session store for one backend.
pub struct SessionStore<B> {
    backend: Arc<B>,
    default_role: Role,
    inner: Mutex<SessionInner>,
    resolve_gate: Mutex<()>,
    events: Mutex<Receiver<AuthEvent>>,
}

impl<B: AuthApi + ProfileApi> SessionStore<B> {
    /// Subscribes to `backend` immediately; events queue until processed.
    ///
    /// `default_role` is assigned to synthesized profiles whose identity
    /// carries no role metadata.
    pub fn new(backend: Arc<B>, default_role: Role) -> Self {
        let events = backend.subscribe();
        Self {
            backend,
            default_role,
            inner: Mutex::new(SessionInner {
                state: SessionState::Unauthenticated,
                session: None,
                generation: 0,
                last_error: None,
            }),
            resolve_gate: Mutex::new(()),
            events: Mutex::new(events),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.inner().state, SessionState::Resolving)
    }

    /// Enabled, resolved profile of the signed-in user.
    pub fn current_user(&self) -> Option<UserProfile> {
        match &self.inner().state {
            SessionState::Authenticated(profile) => Some(profile.clone()),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.inner().session.clone()
    }

    /// Message of the last failed resolution, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.inner().last_error.clone()
    }

    /// Whether the current user may open `module`; false with no user.
    pub fn has_permission(&self, module: &str) -> bool {
        self.current_user()
            .is_some_and(|user| PermissionTable::builtin().is_allowed(user.role, module))
    }

    pub fn can_open(&self, module: Module) -> bool {
        self.has_permission(module.as_str())
    }

    /// Startup: adopts any session the backend still holds.
    pub fn restore_session(&self) -> SessionState {
        let _gate = self.gate();
        self.discard_queued_events();
        match self.backend.get_session() {
            Ok(session) => self.resolve("restore", session),
            Err(err) => {
                error!(
                    "event=session_restore module=session status=error error_code={} error={err}",
                    err.code()
                );
                self.commit_failure(self.bump_generation(), None, &err);
                self.state()
            }
        }
    }

    /// Resolves the latest queued session event, if any arrived.
    pub fn process_events(&self) -> Option<SessionState> {
        let _gate = self.gate();
        let latest = self.drain_latest_event()?;
        Some(self.resolve(latest.name(), latest.session().cloned()))
    }

    /// Handles one session change delivered directly by the caller.
    pub fn on_session_changed(&self, event: AuthEvent) -> SessionState {
        let _gate = self.gate();
        let latest = self.drain_latest_event().unwrap_or(event);
        self.resolve(latest.name(), latest.session().cloned())
    }

    /// Password sign-in. Bad credentials come back as an error and leave the
    /// state untouched.
    pub fn login(&self, email: &str, password: &str) -> Result<SessionState, SessionError> {
        let _gate = self.gate();
        self.discard_queued_events();
        let session = self.backend.sign_in_with_password(email, password)?;
        Ok(self.resolve_after_call(session))
    }

    pub fn signup(&self, email: &str, password: &str) -> Result<SessionState, SessionError> {
        let _gate = self.gate();
        self.discard_queued_events();
        let session = self.backend.sign_up(email, password)?;
        Ok(self.resolve_after_call(session))
    }

    /// Signs out and drops the user even if the backend call fails.
    pub fn logout(&self) -> Result<(), SessionError> {
        let outcome = self.backend.sign_out();
        {
            let mut inner = self.inner();
            inner.generation += 1;
            inner.state = SessionState::Unauthenticated;
            inner.session = None;
        }
        match outcome {
            Ok(()) => {
                info!("event=session_logout module=session status=ok");
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=session_logout module=session status=error error_code={} error={err}",
                    err.code()
                );
                Err(err.into())
            }
        }
    }

    /// Security screen password change.
    pub fn update_password(&self, new_password: &str, confirm: &str) -> Result<(), SessionError> {
        if new_password.is_empty() {
            return Err(SessionError::MissingField("new password"));
        }
        if confirm.is_empty() {
            return Err(SessionError::MissingField("password confirmation"));
        }
        if new_password != confirm {
            return Err(SessionError::PasswordMismatch);
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        self.backend.update_password(new_password)?;
        info!("event=session_update_password module=session status=ok");
        Ok(())
    }

    /// Looks up the profile linked to `identity`, creating it when missing.
    ///
    /// A created profile is re-read so it carries its stored id; if the
    /// re-read fails the synthesized profile (id = auth id) is returned.
    /// Existing profiles get a best-effort last-login update.
    pub fn resolve_profile(&self, identity: &AuthIdentity) -> BackendResult<UserProfile> {
        if let Some(mut profile) = self.backend.find_profile_by_auth_id(identity.id)? {
            let now = now_epoch_ms();
            match self.backend.touch_last_login(profile.id, now) {
                Ok(()) => profile.last_login = Some(now),
                Err(err) => warn!(
                    "event=session_touch_last_login module=session status=error profile_id={} error_code={} error={err}",
                    profile.id,
                    err.code()
                ),
            }
            return Ok(profile);
        }

        let synthesized = self.synthesize_profile(identity);
        warn!(
            "event=session_profile_sync module=session status=start auth_id={} role={}",
            identity.id,
            synthesized.role.as_str().replace(' ', "_")
        );
        let persisted = UserProfile {
            id: Uuid::new_v4(),
            ..synthesized.clone()
        };
        if let Err(err) = self.backend.insert_profile(&persisted) {
            warn!(
                "event=session_profile_sync module=session status=error auth_id={} error_code={} error={err}",
                identity.id,
                err.code()
            );
        }

        match self.backend.find_profile_by_auth_id(identity.id) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Ok(synthesized),
            Err(err) => {
                warn!(
                    "event=session_profile_reread module=session status=error auth_id={} error_code={} error={err}",
                    identity.id,
                    err.code()
                );
                Ok(synthesized)
            }
        }
    }

    fn synthesize_profile(&self, identity: &AuthIdentity) -> UserProfile {
        let role = identity
            .role
            .as_deref()
            .and_then(Role::parse)
            .unwrap_or(self.default_role);
        UserProfile {
            id: identity.id,
            auth_id: Some(identity.id),
            name: identity.display_name(),
            email: identity.email.clone(),
            role,
            enabled: true,
            last_login: Some(now_epoch_ms()),
        }
    }

    /// Resolves the session returned by an auth call, or a newer queued one.
    fn resolve_after_call(&self, session: AuthSession) -> SessionState {
        match self.drain_latest_event() {
            Some(latest) => self.resolve(latest.name(), latest.session().cloned()),
            None => self.resolve("direct", Some(session)),
        }
    }

    /// Caller must hold the resolve gate.
    fn resolve(&self, trigger: &str, session: Option<AuthSession>) -> SessionState {
        let generation = self.bump_generation();
        let Some(session) = session else {
            self.commit(generation, SessionState::Unauthenticated, None);
            info!("event=session_resolve module=session status=ok trigger={trigger} state=unauthenticated");
            return self.state();
        };

        let started_at = Instant::now();
        {
            let mut inner = self.inner();
            inner.state = SessionState::Resolving;
            inner.session = Some(session.clone());
        }
        info!(
            "event=session_resolve module=session status=start trigger={trigger} auth_id={}",
            session.identity.id
        );

        match self.resolve_profile(&session.identity) {
            Ok(profile) => {
                let state = if profile.enabled {
                    SessionState::Authenticated(profile)
                } else {
                    SessionState::Disabled(profile)
                };
                let name = state.name();
                if self.commit(generation, state, Some(session)) {
                    info!(
                        "event=session_resolve module=session status=ok trigger={trigger} state={name} duration_ms={}",
                        started_at.elapsed().as_millis()
                    );
                }
            }
            Err(err) => {
                error!(
                    "event=session_resolve module=session status=error trigger={trigger} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                self.commit_failure(generation, Some(session), &err);
            }
        }
        self.state()
    }

    /// Writes `state` unless a newer trigger arrived meanwhile.
    fn commit(&self, generation: u64, state: SessionState, session: Option<AuthSession>) -> bool {
        let mut inner = self.inner();
        if inner.generation != generation {
            info!(
                "event=session_resolve module=session status=skip reason=superseded generation={generation}"
            );
            return false;
        }
        inner.state = state;
        inner.session = session;
        inner.last_error = None;
        true
    }

    fn commit_failure(&self, generation: u64, session: Option<AuthSession>, err: &BackendError) {
        let mut inner = self.inner();
        if inner.generation != generation {
            return;
        }
        inner.state = SessionState::Unauthenticated;
        inner.session = session;
        inner.last_error = Some(err.to_string());
    }

    fn bump_generation(&self) -> u64 {
        let mut inner = self.inner();
        inner.generation += 1;
        inner.generation
    }

    fn drain_latest_event(&self) -> Option<AuthEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.try_iter().last()
    }

    fn discard_queued_events(&self) {
        if let Some(stale) = self.drain_latest_event() {
            info!(
                "event=session_events module=session status=skip reason=stale last={}",
                stale.name()
            );
        }
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.resolve_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionError, SessionState, SessionStore};
    use crate::backend::{AuthApi, LocalBackend};
    use crate::model::role::Role;
    use std::sync::Arc;

    fn store() -> (Arc<LocalBackend>, SessionStore<LocalBackend>) {
        let backend = Arc::new(LocalBackend::open_in_memory().expect("open backend"));
        let store = SessionStore::new(Arc::clone(&backend), Role::Customer);
        (backend, store)
    }

    #[test]
    fn password_change_checks_inputs_before_calling_backend() {
        let (_backend, store) = store();
        assert!(matches!(
            store.update_password("", "x"),
            Err(SessionError::MissingField(_))
        ));
        assert!(matches!(
            store.update_password("abcdef", ""),
            Err(SessionError::MissingField(_))
        ));
        assert!(matches!(
            store.update_password("abcdef", "abcdeg"),
            Err(SessionError::PasswordMismatch)
        ));
        assert!(matches!(
            store.update_password("abc", "abc"),
            Err(SessionError::PasswordTooShort { min: 6 })
        ));
        assert!(matches!(
            store.update_password("abcdef", "abcdef"),
            Err(SessionError::Backend(_))
        ));
    }

    #[test]
    fn restore_without_session_is_unauthenticated() {
        let (_backend, store) = store();
        assert_eq!(store.restore_session(), SessionState::Unauthenticated);
        assert!(!store.is_loading());
        assert!(!store.has_permission("dashboard"));
    }

    #[test]
    fn signup_synthesizes_default_role_profile_once() {
        let (backend, store) = store();
        let state = store.signup("new@example.com", "secret1").expect("signup");
        let SessionState::Authenticated(profile) = state else {
            panic!("expected an authenticated session");
        };
        assert_eq!(profile.role, Role::Customer);
        assert_eq!(profile.name, "new");
        let auth_id = backend
            .get_session()
            .expect("session")
            .expect("present")
            .identity
            .id;
        assert_eq!(profile.auth_id, Some(auth_id));
        assert_ne!(profile.id, auth_id, "re-read carries the stored id");

        assert!(store.has_permission("tickets"));
        assert!(!store.has_permission("deals"));

        store.logout().expect("logout");
        let again = store.login("new@example.com", "secret1").expect("login");
        let SessionState::Authenticated(second) = again else {
            panic!("expected authenticated");
        };
        assert_eq!(second.id, profile.id);
    }
}
