//! Static role -> module permission table.
//!
//! # Invariants
//! - The built-in table is constructed once and never mutated.
//! - The wildcard entry grants every module id, including ids unknown today.
//! - A role missing from a table is denied every module.

use crate::model::role::{Module, Role};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Marker granting every module.
pub const WILDCARD_MODULE: &str = "*";

const BUILTIN_GRANTS: &[(Role, &[&str])] = &[
    (Role::SystemAdmin, &[WILDCARD_MODULE]),
    (
        Role::SalesManager,
        &[
            "dashboard",
            "deals",
            "reports",
            "leads",
            "contacts",
            "accounts",
            "tasks",
            "communications",
        ],
    ),
    (
        Role::SalesExecutive,
        &[
            "dashboard",
            "leads",
            "contacts",
            "accounts",
            "deals",
            "tasks",
            "communications",
        ],
    ),
    (
        Role::MarketingExecutive,
        &["dashboard", "campaigns", "leads", "reports"],
    ),
    (
        Role::SupportExecutive,
        &["dashboard", "contacts", "accounts", "communications"],
    ),
    (Role::Customer, &["dashboard", "tickets"]),
];

static BUILTIN_TABLE: Lazy<PermissionTable> =
    Lazy::new(|| PermissionTable::from_grants(BUILTIN_GRANTS));

/// Role -> ordered module ids (or the wildcard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    grants: BTreeMap<Role, Vec<&'static str>>,
}

impl PermissionTable {
    /// The table shipped with the application.
    pub fn builtin() -> &'static PermissionTable {
        &BUILTIN_TABLE
    }

    /// Builds a table; later entries for the same role replace earlier ones.
    pub fn from_grants(grants: &[(Role, &[&'static str])]) -> Self {
        Self {
            grants: grants
                .iter()
                .map(|(role, modules)| (*role, modules.to_vec()))
                .collect(),
        }
    }

    /// Configured module ids for `role` in table order; empty when absent.
    pub fn allowed_modules(&self, role: Role) -> &[&'static str] {
        self.grants.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `role` carries the wildcard grant.
    pub fn grants_all(&self, role: Role) -> bool {
        self.allowed_modules(role).contains(&WILDCARD_MODULE)
    }

    /// Whether `role` may open the module with id `module`.
    pub fn is_allowed(&self, role: Role, module: &str) -> bool {
        let modules = self.allowed_modules(role);
        modules.contains(&WILDCARD_MODULE) || modules.contains(&module)
    }

    /// Same as [`PermissionTable::is_allowed`] for a typed module.
    pub fn permits(&self, role: Role, module: Module) -> bool {
        self.is_allowed(role, module.as_str())
    }

    /// Check for a raw role label as stored in the database.
    ///
    /// Labels that do not name a known role are denied.
    pub fn is_allowed_label(&self, role_label: &str, module: &str) -> bool {
        Role::parse(role_label).is_some_and(|role| self.is_allowed(role, module))
    }
}

/// [`PermissionTable::allowed_modules`] on the built-in table.
pub fn allowed_modules(role: Role) -> &'static [&'static str] {
    PermissionTable::builtin().allowed_modules(role)
}

/// [`PermissionTable::is_allowed`] on the built-in table.
pub fn is_allowed(role: Role, module: &str) -> bool {
    PermissionTable::builtin().is_allowed(role, module)
}

#[cfg(test)]
mod tests {
    use super::{allowed_modules, is_allowed, PermissionTable, WILDCARD_MODULE};
    use crate::model::role::{Module, Role};

    #[test]
    fn system_admin_holds_wildcard_and_reaches_unseen_modules() {
        assert!(allowed_modules(Role::SystemAdmin).contains(&WILDCARD_MODULE));
        assert!(is_allowed(Role::SystemAdmin, "security"));
        assert!(is_allowed(Role::SystemAdmin, "some-future-module"));
        for module in Module::ALL {
            assert!(is_allowed(Role::SystemAdmin, module.as_str()));
        }
    }

    #[test]
    fn non_wildcard_roles_match_configured_list_exactly() {
        let table = PermissionTable::builtin();
        for role in Role::ALL.iter().copied().filter(|r| !table.grants_all(*r)) {
            let configured = table.allowed_modules(role);
            for module in Module::ALL {
                assert_eq!(
                    table.is_allowed(role, module.as_str()),
                    configured.contains(&module.as_str()),
                    "{role} / {module}"
                );
            }
            assert!(!table.is_allowed(role, "some-future-module"));
            assert!(!table.is_allowed(role, WILDCARD_MODULE));
        }
    }

    #[test]
    fn customer_sees_dashboard_and_tickets_only() {
        assert_eq!(allowed_modules(Role::Customer), &["dashboard", "tickets"]);
        assert!(!is_allowed(Role::Customer, "deals"));
        assert!(is_allowed(Role::Customer, "tickets"));
    }

    #[test]
    fn missing_role_fails_closed() {
        let table = PermissionTable::from_grants(&[(Role::SalesExecutive, &["leads"])]);
        assert!(table.allowed_modules(Role::Customer).is_empty());
        assert!(!table.is_allowed(Role::Customer, "dashboard"));
        assert!(!table.permits(Role::SystemAdmin, Module::Dashboard));
        assert!(table.permits(Role::SalesExecutive, Module::Leads));
    }

    #[test]
    fn raw_labels_fail_closed() {
        let table = PermissionTable::builtin();
        assert!(table.is_allowed_label("Sales Manager", "reports"));
        assert!(!table.is_allowed_label("Root", "dashboard"));
        assert!(!table.is_allowed_label("", "dashboard"));
    }

    #[test]
    fn lookups_are_deterministic() {
        let first = allowed_modules(Role::MarketingExecutive).to_vec();
        let second = allowed_modules(Role::MarketingExecutive).to_vec();
        assert_eq!(first, second);
        assert_eq!(first, vec!["dashboard", "campaigns", "leads", "reports"]);
    }
}
