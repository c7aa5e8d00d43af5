//! Per-user notifications (`notifications` table).

use super::error::{RepoError, RepoResult};
use super::record::{read_bool, read_id, read_label};
use crate::model::notification::{Notification, NotificationDraft, NotificationKind};
use crate::model::{now_epoch_ms, RecordId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Stores an unread notification and returns it with its assigned id.
    pub fn create(&self, user_id: RecordId, draft: &NotificationDraft) -> RepoResult<Notification> {
        draft.validate()?;
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            title: draft.title.clone(),
            message: draft.message.clone(),
            kind: draft.kind,
            read: false,
            created_at: now_epoch_ms(),
            link: draft.link.clone(),
        };
        self.conn.execute(
            "INSERT INTO notifications (id, user_id, title, message, type, read, link, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7);",
            params![
                notification.id.to_string(),
                user_id.to_string(),
                notification.title,
                notification.message,
                notification.kind.as_str(),
                notification.link,
                notification.created_at,
            ],
        )?;
        Ok(notification)
    }

    /// Notifications of one user, newest first.
    pub fn list_for_user(&self, user_id: RecordId) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, message, type, read, link, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    pub fn mark_read(&self, user_id: RecordId, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Returns the number of rows flipped from unread to read.
    pub fn mark_all_read(&self, user_id: RecordId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0;",
            [user_id.to_string()],
        )?;
        Ok(changed)
    }

    pub fn delete(&self, user_id: RecordId, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    Ok(Notification {
        id: read_id(row, "id")?,
        user_id: read_id(row, "user_id")?,
        title: row.get("title")?,
        message: row.get("message")?,
        kind: read_label(row, "type", NotificationKind::parse)?,
        read: read_bool(row, "read")?,
        created_at: row.get("created_at")?,
        link: row.get("link")?,
    })
}
