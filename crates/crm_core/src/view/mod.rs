//! Screen-side state shared by the list screens.
//!
//! # Responsibility
//! - Hold what a list screen renders: loading flag, rows, error banner.
//! - Tie background fetches to the screen's lifetime.

pub mod list_view;
pub mod scope;

pub use list_view::ListView;
pub use scope::{ScopeToken, ViewScope};
