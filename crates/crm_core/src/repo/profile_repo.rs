//! Application user profiles (`users` table).
//!
//! # Invariants
//! - At most one profile per backend identity (`auth_id` is unique).
//! - Writes validate name and email first.

use super::error::{RepoError, RepoResult};
use super::record::{
    bool_value, id_value, opt_id_value, opt_int_value, query_one, read_bool, read_id,
    read_label, read_opt_id, text_value,
};
use crate::model::profile::UserProfile;
use crate::model::role::Role;
use crate::model::{now_epoch_ms, RecordId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    auth_id,
    name,
    email,
    role,
    enabled,
    last_login
FROM users";

/// SQLite access to [`UserProfile`] rows.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, profile: &UserProfile) -> RepoResult<()> {
        profile.validate()?;
        self.conn.execute(
            "INSERT INTO users (id, auth_id, name, email, role, enabled, last_login, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params_from_iter([
                id_value(profile.id),
                opt_id_value(profile.auth_id),
                text_value(&profile.name),
                text_value(profile.email.trim()),
                text_value(profile.role.as_str()),
                bool_value(profile.enabled),
                opt_int_value(profile.last_login),
                Value::Integer(now_epoch_ms()),
            ]),
        )?;
        Ok(())
    }

    /// Overwrites editable fields; `auth_id` is never changed here.
    pub fn update(&self, profile: &UserProfile) -> RepoResult<()> {
        profile.validate()?;
        let changed = self.conn.execute(
            "UPDATE users
             SET name = ?2, email = ?3, role = ?4, enabled = ?5, last_login = ?6
             WHERE id = ?1;",
            params_from_iter([
                id_value(profile.id),
                text_value(&profile.name),
                text_value(profile.email.trim()),
                text_value(profile.role.as_str()),
                bool_value(profile.enabled),
                opt_int_value(profile.last_login),
            ]),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(profile.id));
        }
        Ok(())
    }

    pub fn touch_last_login(&self, id: RecordId, at_epoch_ms: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET last_login = ?2 WHERE id = ?1;",
            params![id.to_string(), at_epoch_ms],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    pub fn get(&self, id: RecordId) -> RepoResult<Option<UserProfile>> {
        query_one(
            self.conn,
            &format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            parse_profile_row,
        )
    }

    pub fn find_by_auth_id(&self, auth_id: Uuid) -> RepoResult<Option<UserProfile>> {
        query_one(
            self.conn,
            &format!("{PROFILE_SELECT_SQL} WHERE auth_id = ?1;"),
            [auth_id.to_string()],
            parse_profile_row,
        )
    }

    /// All profiles, newest first.
    pub fn list(&self) -> RepoResult<Vec<UserProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL} ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }

    pub fn count_enabled_with_role(&self, role: Role) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1 AND enabled = 1;",
            [role.as_str()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<UserProfile> {
    Ok(UserProfile {
        id: read_id(row, "id")?,
        auth_id: read_opt_id(row, "auth_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role: read_label(row, "role", Role::parse)?,
        enabled: read_bool(row, "enabled")?,
        last_login: row.get("last_login")?,
    })
}

#[cfg(test)]
mod tests {
    use super::SqliteProfileRepository;
    use crate::db::open_db_in_memory;
    use crate::model::profile::UserProfile;
    use crate::model::role::Role;
    use crate::repo::RepoError;

    #[test]
    fn insert_get_and_update() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteProfileRepository::new(&conn);

        let mut profile = UserProfile::new("Ada", "ada@example.com", Role::SalesManager);
        repo.insert(&profile).expect("insert");
        assert_eq!(repo.get(profile.id).expect("get"), Some(profile.clone()));

        profile.enabled = false;
        repo.update(&profile).expect("update");
        let stored = repo.get(profile.id).expect("get").expect("present");
        assert!(!stored.enabled);
        assert_eq!(
            repo.count_enabled_with_role(Role::SalesManager).expect("count"),
            0
        );

        repo.touch_last_login(profile.id, 42).expect("touch");
        let stored = repo.get(profile.id).expect("get").expect("present");
        assert_eq!(stored.last_login, Some(42));
    }

    #[test]
    fn unknown_role_label_is_invalid_data() {
        let conn = open_db_in_memory().expect("open db");
        conn.execute(
            "INSERT INTO users (id, name, email, role) VALUES (?1, 'X', 'x@example.com', 'Root');",
            [uuid::Uuid::new_v4().to_string()],
        )
        .expect("raw insert");
        let repo = SqliteProfileRepository::new(&conn);
        assert!(matches!(repo.list(), Err(RepoError::InvalidData(_))));
    }

    #[test]
    fn missing_rows() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteProfileRepository::new(&conn);
        let ghost = UserProfile::new("Ghost", "ghost@example.com", Role::Customer);
        assert!(repo.find_by_auth_id(ghost.id).expect("find").is_none());
        assert!(matches!(repo.update(&ghost), Err(RepoError::NotFound(_))));
    }
}
