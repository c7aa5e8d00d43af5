//! Context stores owned by the application root.
//!
//! Each store is constructed explicitly and shared by reference (or `Arc`)
//! with the views that need it; there is no global instance.

pub mod notification_store;
pub mod refresher;
pub mod session_store;

pub use notification_store::{NotificationError, NotificationStore, PendingAdd};
pub use refresher::NotificationRefresher;
pub use session_store::{SessionError, SessionState, SessionStore};
