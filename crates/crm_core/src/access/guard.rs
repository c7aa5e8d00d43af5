//! Route table and navigation guard.
//!
//! # Invariants
//! - No current user always redirects to `/login`, whatever else is required.
//! - A role requirement is checked before a module requirement.
//! - The guard holds no state; identical inputs give identical decisions.

use super::permissions::PermissionTable;
use crate::model::profile::UserProfile;
use crate::model::role::{Module, Role};
use serde::Serialize;

labelled_enum! {
    /// Client-side routes, labelled by path.
    pub enum Route {
        Home => "/",
        Login => "/login",
        Dashboard => "/dashboard",
        Leads => "/leads",
        Contacts => "/contacts",
        Accounts => "/accounts",
        Deals => "/deals",
        Tasks => "/tasks",
        Communications => "/communications",
        Campaigns => "/campaigns",
        Reports => "/reports",
        Users => "/users",
        Organization => "/organization",
        Notifications => "/notifications",
        Security => "/security",
    }
}

impl Route {
    /// The route's URL path, e.g. `/leads`.
    pub fn path(self) -> &'static str {
        self.as_str()
    }

    /// Access policy attached to this route.
    pub fn policy(self) -> RoutePolicy {
        match self {
            Route::Home | Route::Login => RoutePolicy::Public,
            Route::Users | Route::Organization | Route::Security => {
                RoutePolicy::RequiresRole(Role::SystemAdmin)
            }
            _ => RoutePolicy::SignedIn,
        }
    }

    /// Feature module a route belongs to, if any.
    pub fn module(self) -> Option<Module> {
        match self {
            Route::Home | Route::Login => None,
            Route::Dashboard => Some(Module::Dashboard),
            Route::Leads => Some(Module::Leads),
            Route::Contacts => Some(Module::Contacts),
            Route::Accounts => Some(Module::Accounts),
            Route::Deals => Some(Module::Deals),
            Route::Tasks => Some(Module::Tasks),
            Route::Communications => Some(Module::Communications),
            Route::Campaigns => Some(Module::Campaigns),
            Route::Reports => Some(Module::Reports),
            Route::Users => Some(Module::Users),
            Route::Organization => Some(Module::Organization),
            Route::Notifications => Some(Module::Notifications),
            Route::Security => Some(Module::Security),
        }
    }
}

/// How a route is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    Public,
    SignedIn,
    RequiresRole(Role),
}

impl RoutePolicy {
    /// Requirement checked by [`guard`]; `None` for public routes.
    pub fn requirement(self) -> Option<RouteRequirement> {
        match self {
            RoutePolicy::Public => None,
            RoutePolicy::SignedIn => Some(RouteRequirement::default()),
            RoutePolicy::RequiresRole(role) => Some(RouteRequirement::role(role)),
        }
    }
}

/// What a guarded view asks of the current user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    pub required_role: Option<Role>,
    pub required_module: Option<&'static str>,
}

impl RouteRequirement {
    pub fn role(role: Role) -> Self {
        Self {
            required_role: Some(role),
            required_module: None,
        }
    }

    pub fn module(module: Module) -> Self {
        Self {
            required_role: None,
            required_module: Some(module.as_str()),
        }
    }
}

/// Outcome of guarding one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuardDecision {
    Render,
    Redirect(Route),
}

/// Decides whether a guarded view renders for `current_user`.
pub fn guard(
    table: &PermissionTable,
    current_user: Option<&UserProfile>,
    requirement: &RouteRequirement,
) -> GuardDecision {
    let Some(user) = current_user else {
        return GuardDecision::Redirect(Route::Login);
    };

    if let Some(role) = requirement.required_role {
        if user.role != role {
            return GuardDecision::Redirect(Route::Dashboard);
        }
    }

    if let Some(module) = requirement.required_module {
        if !table.is_allowed(user.role, module) {
            return GuardDecision::Redirect(Route::Dashboard);
        }
    }

    GuardDecision::Render
}

/// Result of resolving a path against the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
    NotFound,
}

/// Matches a path (query string ignored) against the route table.
pub fn resolve_path(path: &str) -> Option<Route> {
    let bare = path.split(['?', '#']).next().unwrap_or(path);
    let bare = if bare.len() > 1 {
        bare.trim_end_matches('/')
    } else {
        bare
    };
    Route::parse(if bare.is_empty() { "/" } else { bare })
}

/// Resolves `path` and applies its route policy to `current_user`.
pub fn navigate(
    table: &PermissionTable,
    path: &str,
    current_user: Option<&UserProfile>,
) -> Navigation {
    let Some(route) = resolve_path(path) else {
        return Navigation::NotFound;
    };
    match route.policy().requirement() {
        None => Navigation::Render(route),
        Some(requirement) => match guard(table, current_user, &requirement) {
            GuardDecision::Render => Navigation::Render(route),
            GuardDecision::Redirect(target) => Navigation::Redirect(target),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{guard, navigate, resolve_path, GuardDecision, Navigation, Route, RouteRequirement};
    use crate::access::permissions::PermissionTable;
    use crate::model::profile::UserProfile;
    use crate::model::role::{Module, Role};

    fn user(role: Role) -> UserProfile {
        UserProfile::new("Test", "test@example.com", role)
    }

    #[test]
    fn anonymous_always_goes_to_login() {
        let table = PermissionTable::builtin();
        let requirements = [
            RouteRequirement::default(),
            RouteRequirement::role(Role::SystemAdmin),
            RouteRequirement::module(Module::Deals),
            RouteRequirement {
                required_role: Some(Role::Customer),
                required_module: Some("tickets"),
            },
        ];
        for requirement in requirements {
            assert_eq!(
                guard(table, None, &requirement),
                GuardDecision::Redirect(Route::Login)
            );
        }
    }

    #[test]
    fn role_mismatch_redirects_to_dashboard_even_with_module_access() {
        let table = PermissionTable::builtin();
        let manager = user(Role::SalesManager);
        let requirement = RouteRequirement {
            required_role: Some(Role::SalesExecutive),
            required_module: Some("deals"),
        };
        assert_eq!(
            guard(table, Some(&manager), &requirement),
            GuardDecision::Redirect(Route::Dashboard)
        );
    }

    #[test]
    fn module_requirement_uses_permission_table() {
        let table = PermissionTable::builtin();
        let customer = user(Role::Customer);
        assert_eq!(
            guard(table, Some(&customer), &RouteRequirement::module(Module::Deals)),
            GuardDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            guard(table, Some(&customer), &RouteRequirement::module(Module::Tickets)),
            GuardDecision::Render
        );
    }

    #[test]
    fn navigate_applies_route_policies() {
        let table = PermissionTable::builtin();
        let admin = user(Role::SystemAdmin);
        let seller = user(Role::SalesExecutive);

        assert_eq!(navigate(table, "/", None), Navigation::Render(Route::Home));
        assert_eq!(
            navigate(table, "/leads", None),
            Navigation::Redirect(Route::Login)
        );
        assert_eq!(
            navigate(table, "/users", Some(&seller)),
            Navigation::Redirect(Route::Dashboard)
        );
        assert_eq!(
            navigate(table, "/users", Some(&admin)),
            Navigation::Render(Route::Users)
        );
        assert_eq!(
            navigate(table, "/leads?action=add", Some(&seller)),
            Navigation::Render(Route::Leads)
        );
        assert_eq!(navigate(table, "/nope", Some(&admin)), Navigation::NotFound);
    }

    #[test]
    fn resolve_path_tolerates_trailing_slash() {
        assert_eq!(resolve_path("/deals/"), Some(Route::Deals));
        assert_eq!(resolve_path(""), Some(Route::Home));
        assert_eq!(resolve_path("/"), Some(Route::Home));
    }
}
