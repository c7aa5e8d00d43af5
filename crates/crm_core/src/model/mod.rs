//! CRM domain model.
//!
//! # Responsibility
//! - Define the records the screens edit and the backend persists.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Every persisted record is identified by a stable [`RecordId`].
//! - Closed vocabularies (statuses, stages, roles) round-trip through the
//!   exact labels stored in the database.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod activity;
pub mod campaign;
pub mod notification;
pub mod organization;
pub mod profile;
pub mod role;
pub mod sales;

/// Stable identifier of any persisted CRM record.
pub type RecordId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex")
});
static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid clock regex"));

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(&'static str),
    InvalidEmail(String),
    InvalidDate {
        field: &'static str,
        value: String,
    },
    InvalidTime {
        field: &'static str,
        value: String,
    },
    OutOfRange {
        field: &'static str,
        detail: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::InvalidDate { field, value } => {
                write!(f, "`{field}` must be a YYYY-MM-DD date, got `{value}`")
            }
            Self::InvalidTime { field, value } => {
                write!(f, "`{field}` must be an HH:MM time, got `{value}`")
            }
            Self::OutOfRange { field, detail } => write!(f, "`{field}` out of range: {detail}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    if !is_valid_email(value) {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require_date(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !DATE_RE.is_match(value) {
        return Err(ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_clock(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !CLOCK_RE.is_match(value) {
        return Err(ValidationError::InvalidTime {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::OutOfRange {
            field,
            detail: format!("expected a finite value >= 0, got {value}"),
        });
    }
    Ok(())
}

/// Loose syntactic check: one `@`, no whitespace, a dot in the domain.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Month number (1-12) of a `YYYY-MM-DD` date, if well formed.
pub fn month_of(date: &str) -> Option<u32> {
    if !DATE_RE.is_match(date) {
        return None;
    }
    date.get(5..7)?.parse().ok()
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, month_of, require_clock, require_date, ValidationError};

    #[test]
    fn email_check_accepts_common_addresses() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("  first.last+tag@mail.example.org "));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaced name@example.com"));
    }

    #[test]
    fn dates_and_months() {
        assert!(require_date("due_date", "2024-02-29").is_ok());
        assert!(matches!(
            require_date("due_date", "2024-13-01"),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert_eq!(month_of("2024-11-03"), Some(11));
        assert_eq!(month_of("11/03/2024"), None);
    }

    #[test]
    fn clock_times() {
        assert!(require_clock("start", "09:00").is_ok());
        assert!(require_clock("start", "24:00").is_err());
    }
}
