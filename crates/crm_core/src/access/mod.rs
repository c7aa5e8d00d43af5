//! Role-based access control for the CRM shell.
//!
//! # Responsibility
//! - Map roles to the modules they may open (`permissions`).
//! - Decide per navigation whether to render or redirect (`guard`).
//! - Compose the role-filtered menu and quick actions (`navigation`).
//!
//! # Invariants
//! - Every decision here is a pure function of its inputs.
//! - Unknown roles are denied everything.

pub mod guard;
pub mod navigation;
pub mod permissions;
