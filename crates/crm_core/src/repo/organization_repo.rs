//! Single-row organization settings.
//!
//! # Invariants
//! - The table holds at most one row; saving updates it in place.
//! - Holidays are stored as a JSON array of `YYYY-MM-DD` strings.

use super::error::{RepoError, RepoResult};
use super::record::query_one;
use crate::model::now_epoch_ms;
use crate::model::organization::{OrganizationSettings, WorkingHours};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub struct SqliteOrganizationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrganizationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Stored settings, `None` when nothing was saved yet.
    pub fn get(&self) -> RepoResult<Option<OrganizationSettings>> {
        query_one(
            self.conn,
            "SELECT company_name, currency, timezone, working_hours_start, working_hours_end, holidays
             FROM organization_settings
             ORDER BY updated_at ASC, id ASC
             LIMIT 1;",
            [],
            parse_settings_row,
        )
    }

    pub fn upsert(&self, settings: &OrganizationSettings) -> RepoResult<()> {
        settings.validate()?;
        let mut settings = settings.clone();
        settings.normalize_holidays();
        let holidays = serde_json::to_string(&settings.holidays)
            .map_err(|err| RepoError::InvalidData(format!("holidays not serializable: {err}")))?;

        let existing: Option<String> = query_one(
            self.conn,
            "SELECT id FROM organization_settings ORDER BY updated_at ASC, id ASC LIMIT 1;",
            [],
            |row| Ok(row.get::<_, String>("id")?),
        )?;
        let id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());

        self.conn.execute(
            "INSERT INTO organization_settings (
                id, company_name, currency, timezone,
                working_hours_start, working_hours_end, holidays, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                company_name = excluded.company_name,
                currency = excluded.currency,
                timezone = excluded.timezone,
                working_hours_start = excluded.working_hours_start,
                working_hours_end = excluded.working_hours_end,
                holidays = excluded.holidays,
                updated_at = excluded.updated_at;",
            params![
                id,
                settings.company_name,
                settings.currency,
                settings.timezone,
                settings.working_hours.start,
                settings.working_hours.end,
                holidays,
                now_epoch_ms(),
            ],
        )?;
        Ok(())
    }
}

fn parse_settings_row(row: &Row<'_>) -> RepoResult<OrganizationSettings> {
    let holidays_json: String = row.get("holidays")?;
    let holidays: Vec<String> = serde_json::from_str(&holidays_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid holidays json in organization_settings: {err}"))
    })?;

    Ok(OrganizationSettings {
        company_name: row.get("company_name")?,
        currency: row.get("currency")?,
        timezone: row.get("timezone")?,
        working_hours: WorkingHours {
            start: row.get("working_hours_start")?,
            end: row.get("working_hours_end")?,
        },
        holidays,
    })
}
