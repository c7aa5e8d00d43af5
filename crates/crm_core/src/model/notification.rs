//! Per-user notifications.

use super::{require_text, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

labelled_enum! {
    pub enum NotificationKind {
        Info => "info",
        Success => "success",
        Warning => "warning",
        Error => "error",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub user_id: RecordId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Optional in-app path the notification points at.
    pub link: Option<String>,
}

/// Caller-supplied part of a notification; id, timestamp and read flag are
/// assigned by whoever stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
}

impl NotificationDraft {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("message", &self.message)
    }
}

/// Text for the unread badge: empty at zero, capped at `9+`.
pub fn unread_badge(count: usize) -> String {
    match count {
        0 => String::new(),
        1..=9 => count.to_string(),
        _ => "9+".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{unread_badge, NotificationDraft, NotificationKind};

    #[test]
    fn badge_caps_at_nine() {
        assert_eq!(unread_badge(0), "");
        assert_eq!(unread_badge(7), "7");
        assert_eq!(unread_badge(9), "9");
        assert_eq!(unread_badge(10), "9+");
    }

    #[test]
    fn draft_requires_title_and_message() {
        assert!(NotificationDraft::new("", "body", NotificationKind::Info)
            .validate()
            .is_err());
        let draft = NotificationDraft::new("Deal won", "Acme signed", NotificationKind::Success)
            .with_link("/deals");
        assert_eq!(draft.link.as_deref(), Some("/deals"));
        assert!(draft.validate().is_ok());
    }
}
