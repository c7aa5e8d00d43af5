//! Core domain logic for the CRM client.
//! This crate is the single source of truth for access rules and the
//! client-side stores the screens render from.

#[macro_use]
mod macros;

pub mod access;
pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod view;

pub use access::guard::{guard, navigate, GuardDecision, Navigation, Route, RouteRequirement};
pub use access::navigation::{compose_menu, quick_actions, MenuEntry, QuickAction};
pub use access::permissions::PermissionTable;
pub use backend::{AuthApi, BackendError, BackendResult, LocalBackend};
pub use config::{ConfigError, CrmConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::profile::UserProfile;
pub use model::role::{Module, Role};
pub use model::{RecordId, ValidationError};
pub use store::{NotificationRefresher, NotificationStore, SessionState, SessionStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
