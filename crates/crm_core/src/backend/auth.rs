//! Password authentication and session-change events.

use super::BackendResult;
use serde::Serialize;
use std::sync::mpsc::Receiver;
use uuid::Uuid;

/// Shortest password accepted by sign-up and password changes.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authenticated principal as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    /// Stable external identifier; profiles link to it through `auth_id`.
    pub id: Uuid,
    pub email: String,
    /// Sign-up metadata, when provided.
    pub full_name: Option<String>,
    /// Sign-up metadata role label, when provided.
    pub role: Option<String>,
}

impl AuthIdentity {
    /// Display name from metadata, else the email's local part, else `User`.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        match self.email.split('@').next() {
            Some(local) if !local.trim().is_empty() => local.trim().to_string(),
            _ => "User".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub identity: AuthIdentity,
    /// Unix epoch milliseconds.
    pub issued_at: i64,
}

/// Session change pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    SignedOut,
    TokenRefreshed(AuthSession),
    UserUpdated(AuthSession),
}

impl AuthEvent {
    /// Session carried by the event; `None` means nobody is signed in.
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            AuthEvent::SignedIn(session)
            | AuthEvent::TokenRefreshed(session)
            | AuthEvent::UserUpdated(session) => Some(session),
            AuthEvent::SignedOut => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn(_) => "signed_in",
            AuthEvent::SignedOut => "signed_out",
            AuthEvent::TokenRefreshed(_) => "token_refreshed",
            AuthEvent::UserUpdated(_) => "user_updated",
        }
    }
}

/// Password auth capability of the backend.
pub trait AuthApi: Send + Sync {
    /// Fails with `InvalidCredentials` for an unknown email or wrong password.
    fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<AuthSession>;
    /// Registers and signs in a new identity without profile metadata.
    fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthSession>;
    /// Ends the current session; a no-op when nobody is signed in.
    fn sign_out(&self) -> BackendResult<()>;
    fn get_session(&self) -> BackendResult<Option<AuthSession>>;
    /// Rotates the access token of the current session.
    fn refresh_session(&self) -> BackendResult<AuthSession>;
    /// Changes the signed-in identity's password.
    fn update_password(&self, new_password: &str) -> BackendResult<()>;
    /// New receiver for every later session change.
    fn subscribe(&self) -> Receiver<AuthEvent>;
}
