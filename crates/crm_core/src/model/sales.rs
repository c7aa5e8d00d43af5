//! Sales pipeline records: leads, contacts, accounts, deals.

use super::{
    require_date, require_email, require_non_negative, require_text, RecordId, ValidationError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

labelled_enum! {
    pub enum LeadStatus {
        New => "New",
        Contacted => "Contacted",
        Qualified => "Qualified",
        Lost => "Lost",
    }
}

labelled_enum! {
    /// Deal pipeline stage, declared in pipeline order.
    pub enum DealStage {
        Prospecting => "Prospecting",
        Proposal => "Proposal",
        Negotiation => "Negotiation",
        ClosedWon => "Closed Won",
        ClosedLost => "Closed Lost",
    }
}

impl DealStage {
    pub fn is_closed(self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }
}

/// Lead sources offered by the lead form.
pub const LEAD_SOURCES: &[&str] = &[
    "Website",
    "Referral",
    "LinkedIn",
    "Email Campaign",
    "Trade Show",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: LeadStatus,
    pub source: String,
    /// Profile id of the owner.
    pub assigned_to: Option<RecordId>,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Lead {
    pub fn new(name: impl Into<String>, email: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: None,
            company: None,
            status: LeadStatus::New,
            source: source.into(),
            assigned_to: None,
            value: None,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_email(&self.email)?;
        require_text("source", &self.source)?;
        if let Some(value) = self.value {
            require_non_negative("value", value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub account_id: Option<RecordId>,
    pub position: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contact {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            account_id: None,
            position: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_email(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: RecordId,
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub employees: Option<u32>,
    pub annual_revenue: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            industry: None,
            website: None,
            phone: None,
            address: None,
            employees: None,
            annual_revenue: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if let Some(revenue) = self.annual_revenue {
            require_non_negative("annual_revenue", revenue)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: RecordId,
    pub title: String,
    pub account_id: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub value: f64,
    pub stage: DealStage,
    /// Win likelihood in percent, `0..=100`.
    pub probability: u8,
    /// `YYYY-MM-DD`.
    pub expected_close_date: String,
    pub assigned_to: Option<RecordId>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Deal {
    pub fn new(title: impl Into<String>, value: f64, expected_close_date: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            account_id: None,
            contact_id: None,
            value,
            stage: DealStage::Prospecting,
            probability: 10,
            expected_close_date: expected_close_date.into(),
            assigned_to: None,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_non_negative("value", self.value)?;
        if self.probability > 100 {
            return Err(ValidationError::OutOfRange {
                field: "probability",
                detail: format!("expected 0..=100, got {}", self.probability),
            });
        }
        require_date("expected_close_date", &self.expected_close_date)
    }
}

#[cfg(test)]
mod tests {
    use super::{Deal, DealStage, Lead, LeadStatus};
    use crate::model::ValidationError;

    #[test]
    fn new_lead_starts_as_new_and_validates() {
        let lead = Lead::new("Grace", "grace@example.com", "Referral");
        assert_eq!(lead.status, LeadStatus::New);
        lead.validate().expect("valid lead");
    }

    #[test]
    fn deal_rejects_probability_above_hundred_and_bad_dates() {
        let mut deal = Deal::new("Renewal", 5_000.0, "2025-06-30");
        deal.validate().expect("valid deal");

        deal.probability = 101;
        assert!(matches!(
            deal.validate(),
            Err(ValidationError::OutOfRange {
                field: "probability",
                ..
            })
        ));

        deal.probability = 50;
        deal.expected_close_date = "30/06/2025".to_string();
        assert!(matches!(
            deal.validate(),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn closed_stages() {
        assert!(DealStage::ClosedWon.is_closed());
        assert!(DealStage::ClosedLost.is_closed());
        assert!(!DealStage::Negotiation.is_closed());
        assert_eq!(DealStage::parse("Closed Won"), Some(DealStage::ClosedWon));
    }
}
