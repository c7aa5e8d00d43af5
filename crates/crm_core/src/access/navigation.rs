//! Role-filtered sidebar menu and quick-add actions.
//!
//! # Invariants
//! - Filtering is stable: entries keep their master-list order.
//! - Admin-only entries never reach non-admin roles, whatever the table says.

use super::guard::Route;
use super::permissions::PermissionTable;
use crate::model::role::{Module, Role};
use serde::Serialize;

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub route: Route,
    pub module: Module,
    pub admin_only: bool,
}

const fn entry(label: &'static str, route: Route, module: Module, admin_only: bool) -> MenuEntry {
    MenuEntry {
        label,
        route,
        module,
        admin_only,
    }
}

/// Master sidebar in display order.
pub const MASTER_MENU: &[MenuEntry] = &[
    entry("Dashboard", Route::Dashboard, Module::Dashboard, false),
    entry("Leads", Route::Leads, Module::Leads, false),
    entry("Contacts", Route::Contacts, Module::Contacts, false),
    entry("Accounts", Route::Accounts, Module::Accounts, false),
    entry("Deals", Route::Deals, Module::Deals, false),
    entry("Tasks", Route::Tasks, Module::Tasks, false),
    entry(
        "Communications",
        Route::Communications,
        Module::Communications,
        false,
    ),
    entry("Campaigns", Route::Campaigns, Module::Campaigns, false),
    entry("Reports", Route::Reports, Module::Reports, false),
    entry("Users", Route::Users, Module::Users, true),
    entry("Organization", Route::Organization, Module::Organization, true),
    entry("Security", Route::Security, Module::Security, true),
];

/// Visible entries of `entries` for `role`, in input order.
pub fn compose_menu_from<'a>(
    table: &PermissionTable,
    entries: &'a [MenuEntry],
    role: Role,
) -> Vec<&'a MenuEntry> {
    entries
        .iter()
        .filter(|item| !item.admin_only || role.is_admin())
        .filter(|item| table.permits(role, item.module))
        .collect()
}

/// Visible entries of [`MASTER_MENU`] for `role` under the built-in table.
pub fn compose_menu(role: Role) -> Vec<&'static MenuEntry> {
    compose_menu_from(PermissionTable::builtin(), MASTER_MENU, role)
}

/// A floating "add" shortcut that opens a screen's create form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub label: &'static str,
    pub route: Route,
    pub module: Module,
}

impl QuickAction {
    /// Path including the `action=add` query the target screen reacts to.
    pub fn href(&self) -> String {
        format!("{}?action=add", self.route.path())
    }
}

pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "Add Lead",
        route: Route::Leads,
        module: Module::Leads,
    },
    QuickAction {
        label: "Add Deal",
        route: Route::Deals,
        module: Module::Deals,
    },
    QuickAction {
        label: "Add Task",
        route: Route::Tasks,
        module: Module::Tasks,
    },
];

/// Quick actions whose target module `role` may open.
pub fn quick_actions(table: &PermissionTable, role: Role) -> Vec<&'static QuickAction> {
    QUICK_ACTIONS
        .iter()
        .filter(|action| table.permits(role, action.module))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{compose_menu, compose_menu_from, quick_actions, MenuEntry, MASTER_MENU};
    use crate::access::permissions::PermissionTable;
    use crate::model::role::Role;

    fn labels(entries: &[&MenuEntry]) -> Vec<&'static str> {
        entries.iter().map(|entry| entry.label).collect()
    }

    #[test]
    fn marketing_executive_menu_keeps_master_order() {
        let menu = compose_menu(Role::MarketingExecutive);
        assert_eq!(
            labels(&menu),
            vec!["Dashboard", "Leads", "Campaigns", "Reports"]
        );
    }

    #[test]
    fn admin_only_entries_hidden_from_sales_executive_in_any_order() {
        let table = PermissionTable::builtin();
        let mut shuffled: Vec<MenuEntry> = MASTER_MENU.to_vec();
        shuffled.reverse();
        shuffled.rotate_left(4);

        for entries in [MASTER_MENU.to_vec(), shuffled] {
            let menu = compose_menu_from(table, &entries, Role::SalesExecutive);
            let visible = labels(&menu);
            for hidden in ["Users", "Organization", "Security"] {
                assert!(!visible.contains(&hidden), "{hidden} leaked");
            }
        }
    }

    #[test]
    fn admin_only_flag_wins_over_a_permissive_table() {
        let table = PermissionTable::from_grants(&[(Role::SalesExecutive, &["*"])]);
        let menu = compose_menu_from(&table, MASTER_MENU, Role::SalesExecutive);
        assert_eq!(menu.len(), MASTER_MENU.len() - 3);
    }

    #[test]
    fn system_admin_sees_everything_and_output_is_deterministic() {
        assert_eq!(compose_menu(Role::SystemAdmin).len(), MASTER_MENU.len());
        assert_eq!(compose_menu(Role::Customer), compose_menu(Role::Customer));
        assert_eq!(labels(&compose_menu(Role::Customer)), vec!["Dashboard"]);
    }

    #[test]
    fn quick_actions_follow_module_access() {
        let table = PermissionTable::builtin();
        let marketing: Vec<_> = quick_actions(table, Role::MarketingExecutive)
            .iter()
            .map(|action| action.href())
            .collect();
        assert_eq!(marketing, vec!["/leads?action=add"]);
        assert_eq!(quick_actions(table, Role::SalesExecutive).len(), 3);
        assert!(quick_actions(table, Role::Customer).is_empty());
    }
}
