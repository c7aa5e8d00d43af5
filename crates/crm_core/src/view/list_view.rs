//! State of one list screen.
//!
//! # Invariants
//! - A failed fetch keeps the last-known rows and raises the banner.
//! - A failed mutation leaves the rows untouched and is returned to the caller.
//! - Successful mutations are applied in place without a refetch.

use super::scope::ScopeToken;
use crate::model::RecordId;
use log::warn;
use std::fmt::Display;

pub struct ListView<T> {
    key: fn(&T) -> RecordId,
    loading: bool,
    items: Vec<T>,
    banner: Option<String>,
}

impl<T> ListView<T> {
    /// `key` extracts the identity used to match updated and removed rows.
    pub fn new(key: fn(&T) -> RecordId) -> Self {
        Self {
            key,
            loading: false,
            items: Vec::new(),
            banner: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
    }

    /// Settles a fetch. Returns whether it succeeded.
    pub fn apply_fetch<E: Display>(&mut self, result: Result<Vec<T>, E>) -> bool {
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.banner = None;
                true
            }
            Err(err) => {
                warn!(
                    "event=list_fetch module=view status=error kept={} error={err}",
                    self.items.len()
                );
                self.banner = Some(err.to_string());
                false
            }
        }
    }

    /// Like [`ListView::apply_fetch`], but drops the result once `token` is
    /// cancelled. A dropped result still ends the loading state. Returns
    /// whether anything was applied.
    pub fn apply_fetch_scoped<E: Display>(
        &mut self,
        token: &ScopeToken,
        result: Result<Vec<T>, E>,
    ) -> bool {
        match token.settle(result) {
            Some(result) => {
                self.apply_fetch(result);
                true
            }
            None => {
                self.loading = false;
                false
            }
        }
    }

    /// Prepends a created row.
    pub fn apply_created<E>(&mut self, result: Result<T, E>) -> Result<(), E> {
        let item = result?;
        self.items.insert(0, item);
        Ok(())
    }

    /// Replaces the row with the same identity, if present.
    pub fn apply_updated<E>(&mut self, result: Result<T, E>) -> Result<(), E> {
        let item = result?;
        let key = self.key;
        let id = key(&item);
        if let Some(slot) = self.items.iter_mut().find(|row| key(row) == id) {
            *slot = item;
        }
        Ok(())
    }

    /// Drops the row `id` once the backend confirmed the delete.
    pub fn apply_removed<E>(&mut self, id: RecordId, result: Result<(), E>) -> Result<(), E> {
        result?;
        let key = self.key;
        self.items.retain(|row| key(row) != id);
        Ok(())
    }
}
