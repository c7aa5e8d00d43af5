//! Roles and feature modules.
//!
//! A [`Role`] is assigned to a profile by an administrator and decides which
//! [`Module`]s the profile may reach. Modules are lookup literals, not records.

labelled_enum! {
    /// Closed set of CRM roles.
    pub enum Role {
        SystemAdmin => "System Admin",
        SalesManager => "Sales Manager",
        SalesExecutive => "Sales Executive",
        MarketingExecutive => "Marketing Executive",
        SupportExecutive => "Support Executive",
        Customer => "Customer",
    }
}

impl Role {
    /// True only for the System Admin role, which may open the admin screens.
    pub fn is_admin(self) -> bool {
        self == Role::SystemAdmin
    }
}

labelled_enum! {
    /// Feature areas gating menu visibility and route access.
    pub enum Module {
        Dashboard => "dashboard",
        Leads => "leads",
        Contacts => "contacts",
        Accounts => "accounts",
        Deals => "deals",
        Tasks => "tasks",
        Communications => "communications",
        Campaigns => "campaigns",
        Reports => "reports",
        Users => "users",
        Organization => "organization",
        Security => "security",
        Tickets => "tickets",
        Notifications => "notifications",
    }
}

#[cfg(test)]
mod tests {
    use super::{Module, Role};

    #[test]
    fn role_labels_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
        assert_eq!(Role::parse("system admin"), None);
        assert_eq!(Role::ALL.len(), 6);
    }

    #[test]
    fn role_serializes_as_label() {
        let json = serde_json::to_string(&Role::MarketingExecutive).expect("serialize");
        assert_eq!(json, "\"Marketing Executive\"");
        let back: Role = serde_json::from_str("\"Support Executive\"").expect("deserialize");
        assert_eq!(back, Role::SupportExecutive);
    }

    #[test]
    fn module_ids_are_lowercase_literals() {
        assert_eq!(Module::Communications.as_str(), "communications");
        assert_eq!(Module::parse("tickets"), Some(Module::Tickets));
        assert_eq!(Module::parse("Tickets"), None);
        assert!(Role::SystemAdmin.is_admin());
        assert!(!Role::SalesManager.is_admin());
    }
}
