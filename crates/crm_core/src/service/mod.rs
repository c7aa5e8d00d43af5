//! Use-case services behind the CRM screens.
//!
//! # Responsibility
//! - Give each screen one entry point for fetching and mutating its data.
//! - Keep screens storage-agnostic: services only see the backend traits.
//!
//! # Invariants
//! - Services never bypass backend validation or access checks.
//! - Failures are returned to the caller; services hold no view state.

use crate::backend::BackendError;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entity_service;
pub mod organization_service;
pub mod report_service;
pub mod user_admin_service;

pub use entity_service::{filter_records, EntityService, SearchFilter, Searchable};
pub use organization_service::OrganizationService;
pub use report_service::{
    CampaignSummary, DashboardKpis, DealSummary, MonthlySales, NamedCount, ReportService,
    SalesReport,
};
pub use user_admin_service::UserAdminService;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    Backend(BackendError),
    /// Input the screen should have rejected before calling.
    InvalidInput(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BackendError> for ServiceError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Validation(err) => Self::Validation(err),
            other => Self::Backend(other),
        }
    }
}
