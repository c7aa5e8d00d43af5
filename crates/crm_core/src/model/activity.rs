//! Activity records: tasks and logged communications.

use super::{require_date, require_text, RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

labelled_enum! {
    pub enum TaskKind {
        Task => "Task",
        Call => "Call",
        Meeting => "Meeting",
        FollowUp => "Follow-up",
    }
}

labelled_enum! {
    pub enum TaskPriority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

labelled_enum! {
    pub enum TaskStatus {
        Pending => "Pending",
        InProgress => "In Progress",
        Completed => "Completed",
    }
}

impl TaskStatus {
    /// Pending and in-progress tasks both count as open work.
    pub fn is_open(self) -> bool {
        self != TaskStatus::Completed
    }
}

labelled_enum! {
    pub enum CommunicationKind {
        Email => "Email",
        Call => "Call",
        Note => "Note",
        Document => "Document",
    }
}

labelled_enum! {
    /// Record types an activity can point at.
    pub enum RelatedType {
        Lead => "Lead",
        Contact => "Contact",
        Deal => "Deal",
        Account => "Account",
    }
}

/// Polymorphic link to a lead, contact, deal or account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTo {
    pub kind: RelatedType,
    pub id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub kind: TaskKind,
    pub priority: TaskPriority,
    /// `YYYY-MM-DD`.
    pub due_date: String,
    pub assigned_to: Option<RecordId>,
    pub related_to: Option<RelatedTo>,
    pub status: TaskStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            kind: TaskKind::Task,
            priority: TaskPriority::Medium,
            due_date: due_date.into(),
            assigned_to: None,
            related_to: None,
            status: TaskStatus::Pending,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_date("due_date", &self.due_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    pub id: RecordId,
    pub kind: CommunicationKind,
    pub subject: String,
    pub content: String,
    pub related_to: RelatedTo,
    /// Profile id of the author.
    pub created_by: RecordId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Communication {
    pub fn new(
        kind: CommunicationKind,
        subject: impl Into<String>,
        content: impl Into<String>,
        related_to: RelatedTo,
        created_by: RecordId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            subject: subject.into(),
            content: content.into(),
            related_to,
            created_by,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("subject", &self.subject)?;
        require_text("content", &self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskKind, TaskStatus};

    #[test]
    fn follow_up_label_keeps_hyphen() {
        assert_eq!(TaskKind::FollowUp.as_str(), "Follow-up");
        assert_eq!(TaskKind::parse("Follow-up"), Some(TaskKind::FollowUp));
    }

    #[test]
    fn open_statuses() {
        assert!(TaskStatus::Pending.is_open());
        assert!(TaskStatus::InProgress.is_open());
        assert!(!TaskStatus::Completed.is_open());
    }

    #[test]
    fn task_requires_title_and_date() {
        assert!(Task::new("Call back", "2025-01-15").validate().is_ok());
        assert!(Task::new("", "2025-01-15").validate().is_err());
        assert!(Task::new("Call back", "tomorrow").validate().is_err());
    }
}
