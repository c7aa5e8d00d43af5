//! Backend identities and sessions (`auth_users`, `auth_sessions`).
//!
//! # Invariants
//! - Emails are unique case-insensitively; a duplicate insert is `Conflict`.
//! - Only password hashes are stored, never the password itself.
//! - Deleting an identity cascades to its sessions and profile.

use super::error::{RepoError, RepoResult};
use super::record::{exists, query_one, read_id};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// One row of `auth_users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    /// Sign-up metadata: display name.
    pub full_name: Option<String>,
    /// Sign-up metadata: requested role label.
    pub role: Option<String>,
}

/// One row of `auth_sessions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub access_token: String,
    pub auth_id: Uuid,
    pub issued_at: i64,
}

pub struct SqliteCredentialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCredentialRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert_user(&self, user: &AuthUserRow) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO auth_users (id, email, password_hash, full_name, role)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.email.trim(),
                user.password_hash,
                user.full_name,
                user.role,
            ],
        )?;
        Ok(())
    }

    pub fn find_user_by_email(&self, email: &str) -> RepoResult<Option<AuthUserRow>> {
        query_one(
            self.conn,
            "SELECT id, email, password_hash, full_name, role
             FROM auth_users
             WHERE email = ?1 COLLATE NOCASE;",
            [email.trim()],
            parse_user_row,
        )
    }

    pub fn get_user(&self, id: Uuid) -> RepoResult<Option<AuthUserRow>> {
        query_one(
            self.conn,
            "SELECT id, email, password_hash, full_name, role
             FROM auth_users
             WHERE id = ?1;",
            [id.to_string()],
            parse_user_row,
        )
    }

    pub fn email_taken(&self, email: &str) -> RepoResult<bool> {
        exists(
            self.conn,
            "SELECT 1 FROM auth_users WHERE email = ?1 COLLATE NOCASE;",
            [email.trim()],
        )
    }

    pub fn update_password_hash(&self, id: Uuid, password_hash: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE auth_users SET password_hash = ?2 WHERE id = ?1;",
            params![id.to_string(), password_hash],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    pub fn delete_user(&self, id: Uuid) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM auth_users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    pub fn insert_session(&self, session: &SessionRow) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO auth_sessions (access_token, auth_id, issued_at) VALUES (?1, ?2, ?3);",
            params![
                session.access_token,
                session.auth_id.to_string(),
                session.issued_at
            ],
        )?;
        Ok(())
    }

    pub fn find_session(&self, access_token: &str) -> RepoResult<Option<SessionRow>> {
        query_one(
            self.conn,
            "SELECT access_token, auth_id, issued_at FROM auth_sessions WHERE access_token = ?1;",
            [access_token],
            parse_session_row,
        )
    }

    /// Most recently issued session, if any survives.
    pub fn latest_session(&self) -> RepoResult<Option<SessionRow>> {
        query_one(
            self.conn,
            "SELECT access_token, auth_id, issued_at
             FROM auth_sessions
             ORDER BY issued_at DESC, access_token ASC
             LIMIT 1;",
            [],
            parse_session_row,
        )
    }

    /// Returns whether a row was removed.
    pub fn delete_session(&self, access_token: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM auth_sessions WHERE access_token = ?1;",
            [access_token],
        )?;
        Ok(changed > 0)
    }

    /// Drops every stored session; the local store keeps one per device.
    pub fn clear_sessions(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM auth_sessions;", [])?;
        Ok(changed)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<AuthUserRow> {
    Ok(AuthUserRow {
        id: read_id(row, "id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        full_name: row.get("full_name")?,
        role: row.get("role")?,
    })
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<SessionRow> {
    Ok(SessionRow {
        access_token: row.get("access_token")?,
        auth_id: read_id(row, "auth_id")?,
        issued_at: row.get("issued_at")?,
    })
}
