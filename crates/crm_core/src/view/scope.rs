//! Cancellation scope tying background work to a screen's lifetime.
//!
//! # Invariants
//! - Once a scope is cancelled or dropped, every token reports cancelled.
//! - Results delivered through a cancelled token are discarded.

use super::list_view::ListView;
use log::info;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Owned by a screen; cancels its tokens when dropped.
#[derive(Debug, Default)]
pub struct ViewScope {
    cancelled: Arc<AtomicBool>,
}

/// Cheap handle carried by work started inside a [`ViewScope`].
#[derive(Debug, Clone)]
pub struct ScopeToken {
    cancelled: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> ScopeToken {
        ScopeToken {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Runs `fetch` on a worker thread and applies its result to `view`
    /// unless the scope was cancelled first.
    ///
    /// The handle yields whether the result was applied.
    pub fn spawn_fetch<T, E, F>(&self, view: Arc<Mutex<ListView<T>>>, fetch: F) -> JoinHandle<bool>
    where
        T: Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Result<Vec<T>, E> + Send + 'static,
    {
        let token = self.token();
        view.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .begin_fetch();
        std::thread::spawn(move || {
            let result = fetch();
            let mut view = view.lock().unwrap_or_else(PoisonError::into_inner);
            view.apply_fetch_scoped(&token, result)
        })
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl ScopeToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Passes `value` through while the scope is live.
    pub fn settle<T>(&self, value: T) -> Option<T> {
        if self.is_cancelled() {
            info!("event=view_result module=view status=skip reason=cancelled");
            return None;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::ViewScope;

    #[test]
    fn dropping_the_scope_cancels_its_tokens() {
        let scope = ViewScope::new();
        let token = scope.token();
        assert_eq!(token.settle(3), Some(3));
        drop(scope);
        assert!(token.is_cancelled());
        assert_eq!(token.settle(3), None);
    }
}
