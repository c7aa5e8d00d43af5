//! Organization-wide settings (single row).

use super::{require_clock, require_date, require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Currencies offered by the settings screen.
pub const SUPPORTED_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "INR", "AED", "JPY"];
/// Time zones offered by the settings screen.
pub const SUPPORTED_TIMEZONES: &[&str] = &[
    "UTC",
    "Asia/Kolkata",
    "America/New_York",
    "Europe/London",
    "Asia/Dubai",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    /// `HH:MM`.
    pub start: String,
    /// `HH:MM`.
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    pub company_name: String,
    pub currency: String,
    pub timezone: String,
    pub working_hours: WorkingHours,
    /// Sorted, de-duplicated `YYYY-MM-DD` dates.
    pub holidays: Vec<String>,
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            currency: "USD".to_string(),
            timezone: "UTC".to_string(),
            working_hours: WorkingHours {
                start: "09:00".to_string(),
                end: "18:00".to_string(),
            },
            holidays: Vec::new(),
        }
    }
}

impl OrganizationSettings {
    /// Adds a holiday keeping the list sorted; returns `false` for duplicates.
    pub fn add_holiday(&mut self, date: &str) -> Result<bool, ValidationError> {
        require_date("holidays", date)?;
        match self.holidays.binary_search_by(|held| held.as_str().cmp(date)) {
            Ok(_) => Ok(false),
            Err(index) => {
                self.holidays.insert(index, date.to_string());
                Ok(true)
            }
        }
    }

    /// Removes a holiday; returns whether it was present.
    pub fn remove_holiday(&mut self, date: &str) -> bool {
        let before = self.holidays.len();
        self.holidays.retain(|holiday| holiday != date);
        before != self.holidays.len()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("company_name", &self.company_name)?;
        if !SUPPORTED_CURRENCIES.contains(&self.currency.as_str()) {
            return Err(ValidationError::OutOfRange {
                field: "currency",
                detail: format!("unsupported currency `{}`", self.currency),
            });
        }
        require_text("timezone", &self.timezone)?;
        require_clock("working_hours.start", &self.working_hours.start)?;
        require_clock("working_hours.end", &self.working_hours.end)?;
        if self.working_hours.end <= self.working_hours.start {
            return Err(ValidationError::OutOfRange {
                field: "working_hours",
                detail: format!(
                    "end {} must be after start {}",
                    self.working_hours.end, self.working_hours.start
                ),
            });
        }
        for holiday in &self.holidays {
            require_date("holidays", holiday)?;
        }
        Ok(())
    }

    /// Sorts and de-duplicates holidays in place.
    pub fn normalize_holidays(&mut self) {
        self.holidays.sort();
        self.holidays.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::OrganizationSettings;

    #[test]
    fn holidays_stay_sorted_and_unique() {
        let mut settings = OrganizationSettings::default();
        assert!(settings.add_holiday("2025-12-25").expect("valid date"));
        assert!(settings.add_holiday("2025-01-01").expect("valid date"));
        assert!(!settings.add_holiday("2025-12-25").expect("valid date"));
        assert_eq!(settings.holidays, vec!["2025-01-01", "2025-12-25"]);
        assert!(settings.add_holiday("Christmas").is_err());

        assert!(settings.remove_holiday("2025-01-01"));
        assert!(!settings.remove_holiday("2025-01-01"));
    }

    #[test]
    fn defaults_need_a_company_name() {
        let mut settings = OrganizationSettings::default();
        assert!(settings.validate().is_err());
        settings.company_name = "Acme".to_string();
        settings.validate().expect("valid settings");

        settings.working_hours.end = "08:00".to_string();
        assert!(settings.validate().is_err());
    }
}
