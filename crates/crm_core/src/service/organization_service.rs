//! Organization settings screen.

use super::ServiceResult;
use crate::backend::OrganizationApi;
use crate::model::organization::OrganizationSettings;
use log::info;
use std::sync::Arc;

pub struct OrganizationService<B> {
    backend: Arc<B>,
}

impl<B: OrganizationApi> OrganizationService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Stored settings, or the defaults when nothing was saved yet.
    pub fn load(&self) -> ServiceResult<OrganizationSettings> {
        Ok(self
            .backend
            .get_organization_settings()?
            .unwrap_or_default())
    }

    pub fn save(&self, settings: &OrganizationSettings) -> ServiceResult<()> {
        settings.validate()?;
        self.backend.save_organization_settings(settings)?;
        info!(
            "event=organization_save module=service status=ok holidays={}",
            settings.holidays.len()
        );
        Ok(())
    }

    /// Adds a holiday and saves; returns the stored settings.
    pub fn add_holiday(&self, date: &str) -> ServiceResult<OrganizationSettings> {
        let mut settings = self.load()?;
        if settings.add_holiday(date)? {
            self.save(&settings)?;
        }
        Ok(settings)
    }

    pub fn remove_holiday(&self, date: &str) -> ServiceResult<OrganizationSettings> {
        let mut settings = self.load()?;
        if settings.remove_holiday(date) {
            self.save(&settings)?;
        }
        Ok(settings)
    }
}
