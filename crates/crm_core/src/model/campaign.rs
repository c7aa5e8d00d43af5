//! Marketing campaigns.

use super::{require_date, require_non_negative, require_text, RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

labelled_enum! {
    pub enum CampaignStatus {
        Planning => "Planning",
        Active => "Active",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: RecordId,
    pub name: String,
    /// Free-form channel label, e.g. `Email` or `Webinar`.
    pub kind: String,
    pub status: CampaignStatus,
    pub start_date: String,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub leads_generated: u32,
    /// Percent, `0..=100`.
    pub conversion_rate: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Campaign {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: kind.into(),
            status: CampaignStatus::Planning,
            start_date: start_date.into(),
            end_date: None,
            budget: None,
            leads_generated: 0,
            conversion_rate: 0.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("type", &self.kind)?;
        require_date("start_date", &self.start_date)?;
        if let Some(end_date) = &self.end_date {
            require_date("end_date", end_date)?;
            // ISO dates order lexically.
            if end_date.as_str() < self.start_date.as_str() {
                return Err(ValidationError::OutOfRange {
                    field: "end_date",
                    detail: format!("{end_date} is before start {}", self.start_date),
                });
            }
        }
        if let Some(budget) = self.budget {
            require_non_negative("budget", budget)?;
        }
        require_non_negative("conversion_rate", self.conversion_rate)?;
        if self.conversion_rate > 100.0 {
            return Err(ValidationError::OutOfRange {
                field: "conversion_rate",
                detail: format!("expected a percentage, got {}", self.conversion_rate),
            });
        }
        Ok(())
    }
}
