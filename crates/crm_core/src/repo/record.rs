//! Generic single-table CRUD over SQLite.
//!
//! # Responsibility
//! - Give every CRM entity the same create/read/update/delete/list contract.
//! - Keep column binding and row decoding next to the record definition.
//!
//! # Invariants
//! - Writes call [`TableRecord::validate`] before any SQL runs.
//! - Create and update return the row as stored, not the caller's copy.
//! - Lists are newest first, ties broken by id.

use super::error::{RepoError, RepoResult};
use crate::model::{now_epoch_ms, RecordId, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;
use uuid::Uuid;

/// A record stored one-per-row in its own table.
///
/// Every table has `id`, `created_at` and `updated_at` columns in addition
/// to [`TableRecord::COLUMNS`].
pub trait TableRecord: Sized {
    const TABLE: &'static str;
    /// Writable columns besides `id`/`created_at`/`updated_at`.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> RecordId;
    fn created_at(&self) -> i64;
    fn validate(&self) -> Result<(), ValidationError>;
    /// Values for [`TableRecord::COLUMNS`], in the same order.
    fn bind_values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// SQLite CRUD for one [`TableRecord`] type.
pub struct SqliteTable<'conn, R> {
    conn: &'conn Connection,
    _record: PhantomData<R>,
}

impl<'conn, R: TableRecord> SqliteTable<'conn, R> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    pub fn create(&self, record: &R) -> RepoResult<R> {
        record.validate()?;

        let now = now_epoch_ms();
        let created_at = if record.created_at() > 0 {
            record.created_at()
        } else {
            now
        };
        let columns = R::COLUMNS.join(", ");
        let placeholders = vec!["?"; R::COLUMNS.len() + 3].join(", ");
        let sql = format!(
            "INSERT INTO {} (id, {columns}, created_at, updated_at) VALUES ({placeholders});",
            R::TABLE
        );

        let mut values = Vec::with_capacity(R::COLUMNS.len() + 3);
        values.push(id_value(record.id()));
        values.extend(record.bind_values());
        values.push(Value::Integer(created_at));
        values.push(Value::Integer(now));
        self.conn.execute(&sql, params_from_iter(values))?;

        self.read_back(record.id())
    }

    pub fn update(&self, record: &R) -> RepoResult<R> {
        record.validate()?;

        let assignments = R::COLUMNS
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments}, updated_at = ? WHERE id = ?;",
            R::TABLE
        );

        let mut values = record.bind_values();
        values.push(Value::Integer(now_epoch_ms()));
        values.push(id_value(record.id()));
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(record.id()));
        }

        self.read_back(record.id())
    }

    pub fn get(&self, id: RecordId) -> RepoResult<Option<R>> {
        let sql = format!("{} WHERE id = ?1;", select_sql::<R>());
        query_one(self.conn, &sql, [id.to_string()], R::from_row)
    }

    pub fn list(&self) -> RepoResult<Vec<R>> {
        let sql = format!("{} ORDER BY created_at DESC, id ASC;", select_sql::<R>());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(R::from_row(row)?);
        }
        Ok(records)
    }

    pub fn delete(&self, id: RecordId) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1;", R::TABLE);
        let changed = self.conn.execute(&sql, [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    pub fn count(&self) -> RepoResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {};", R::TABLE);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn read_back(&self, id: RecordId) -> RepoResult<R> {
        self.get(id)?.ok_or(RepoError::NotFound(id))
    }
}

fn select_sql<R: TableRecord>() -> String {
    format!(
        "SELECT id, {}, created_at, updated_at FROM {}",
        R::COLUMNS.join(", "),
        R::TABLE
    )
}

pub(crate) fn id_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn opt_id_value(id: Option<Uuid>) -> Value {
    id.map(id_value).unwrap_or(Value::Null)
}

pub(crate) fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn opt_text_value(value: Option<&str>) -> Value {
    value.map(text_value).unwrap_or(Value::Null)
}

pub(crate) fn opt_real_value(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

pub(crate) fn opt_int_value(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

pub(crate) fn bool_value(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

pub(crate) fn parse_uuid(text: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{text}` in {column}")))
}

pub(crate) fn read_id(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    parse_uuid(&text, column)
}

pub(crate) fn read_opt_id(row: &Row<'_>, column: &str) -> RepoResult<Option<Uuid>> {
    let text: Option<String> = row.get(column)?;
    text.map(|value| parse_uuid(&value, column)).transpose()
}

/// Decodes a closed-vocabulary label, rejecting unknown values.
pub(crate) fn read_label<T>(
    row: &Row<'_>,
    column: &str,
    parse: fn(&str) -> Option<T>,
) -> RepoResult<T> {
    let text: String = row.get(column)?;
    parse(&text).ok_or_else(|| RepoError::InvalidData(format!("unknown `{text}` in {column}")))
}

pub(crate) fn read_bool(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    let value: i64 = row.get(column)?;
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "expected 0 or 1 in {column}, got {other}"
        ))),
    }
}

/// Runs a single-row lookup, mapping "no rows" to `None`.
pub(crate) fn query_one<T>(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    decode: impl FnOnce(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => decode(row).map(Some),
        None => Ok(None),
    }
}

/// Whether `sql` yields at least one row.
pub(crate) fn exists(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> RepoResult<bool> {
    let found = conn
        .query_row(sql, params, |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}
