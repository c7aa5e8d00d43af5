//! Runtime configuration for the CRM core.
//!
//! Values are layered: built-in defaults, then an optional `crm.toml`, then
//! `CRM_*` environment variables (e.g. `CRM_DATABASE_PATH`).

use crate::model::role::Role;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Config file looked up next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "crm.toml";
/// Default notification poll interval.
pub const DEFAULT_NOTIFICATION_REFRESH_SECS: u64 = 60;

#[derive(Debug)]
pub enum ConfigError {
    Load(::config::ConfigError),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "failed to load configuration: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(value: ::config::ConfigError) -> Self {
        Self::Load(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// SQLite file backing the local backend.
    pub database_path: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: String,
    /// Seconds between background notification refreshes.
    pub notification_refresh_secs: u64,
    /// Role label given to profiles synthesized on first sign-in.
    pub default_role: String,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            database_path: "crm.sqlite3".to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: std::env::temp_dir()
                .join("crm-logs")
                .to_string_lossy()
                .into_owned(),
            notification_refresh_secs: DEFAULT_NOTIFICATION_REFRESH_SECS,
            default_role: Role::Customer.as_str().to_string(),
        }
    }
}

impl CrmConfig {
    /// Loads `crm.toml` (optional) and `CRM_*` overrides on top of defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`CrmConfig::load`] with an explicit config file path.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let loaded: Self = Config::builder()
            .set_default("database_path", defaults.database_path)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_dir", defaults.log_dir)?
            .set_default(
                "notification_refresh_secs",
                defaults.notification_refresh_secs as i64,
            )?
            .set_default("default_role", defaults.default_role)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("CRM").try_parsing(true))
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.notification_refresh_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "notification_refresh_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if Role::parse(self.default_role.trim()).is_none() {
            return Err(ConfigError::Invalid {
                field: "default_role",
                reason: format!("unknown role `{}`", self.default_role),
            });
        }
        Ok(())
    }

    /// Parsed [`CrmConfig::default_role`]; falls back to the least privileged role.
    pub fn default_role(&self) -> Role {
        Role::parse(self.default_role.trim()).unwrap_or(Role::Customer)
    }

    pub fn notification_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.notification_refresh_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CrmConfig};
    use crate::model::role::Role;
    use std::io::Write;

    #[test]
    fn defaults_validate_and_use_least_privileged_role() {
        let config = CrmConfig::default();
        config.validate().expect("defaults are valid");
        assert_eq!(config.default_role(), Role::Customer);
        assert_eq!(config.notification_refresh_interval().as_secs(), 60);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("crm.toml");
        let mut file = std::fs::File::create(&path).expect("create config");
        writeln!(file, "database_path = \"/tmp/other.sqlite3\"").expect("write");
        writeln!(file, "notification_refresh_secs = 15").expect("write");
        writeln!(file, "default_role = \"Sales Executive\"").expect("write");

        let config = CrmConfig::load_from(path.to_str().expect("utf-8 path")).expect("load");
        assert_eq!(config.database_path, "/tmp/other.sqlite3");
        assert_eq!(config.notification_refresh_secs, 15);
        assert_eq!(config.default_role(), Role::SalesExecutive);
    }

    #[test]
    fn validate_rejects_zero_interval_and_unknown_role() {
        let config = CrmConfig {
            notification_refresh_secs: 0,
            ..CrmConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "notification_refresh_secs",
                ..
            })
        ));

        let config = CrmConfig {
            default_role: "Overlord".to_string(),
            ..CrmConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "default_role",
                ..
            })
        ));
    }
}
