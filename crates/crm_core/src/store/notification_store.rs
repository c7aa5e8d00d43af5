//! Client-side cache of the signed-in user's notifications.
//!
//! # Responsibility
//! - Keep a newest-first cache in step with the backend.
//! - Apply mutations optimistically and undo them when the backend refuses.
//!
//! # Invariants
//! - `unread_count` is derived from the cache on every call.
//! - A failed mutation restores exactly the records it touched and returns
//!   the error; unrelated concurrent edits are kept.
//! - With no user the cache is empty.

use crate::backend::{BackendError, NotificationApi};
use crate::model::notification::{unread_badge, Notification, NotificationDraft};
use crate::model::{now_epoch_ms, RecordId, ValidationError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug)]
pub enum NotificationError {
    NoUser,
    Validation(ValidationError),
    Backend(BackendError),
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoUser => write!(f, "no signed-in user"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoUser => None,
            Self::Validation(err) => Some(err),
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<ValidationError> for NotificationError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BackendError> for NotificationError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

/// Optimistic insert waiting for the backend create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdd {
    /// Temporary id of the cached placeholder.
    pub temp_id: RecordId,
    user_id: RecordId,
    draft: NotificationDraft,
}

struct CacheState {
    user_id: Option<RecordId>,
    items: Vec<Notification>,
}

pub struct NotificationStore<B> {
    backend: Arc<B>,
    cache: Mutex<CacheState>,
}

impl<B: NotificationApi> NotificationStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            cache: Mutex::new(CacheState {
                user_id: None,
                items: Vec::new(),
            }),
        }
    }

    /// Switches the cached user; a different user starts from an empty cache.
    pub fn set_user(&self, user_id: Option<RecordId>) {
        let mut cache = self.cache();
        if cache.user_id != user_id {
            cache.user_id = user_id;
            cache.items.clear();
        }
    }

    pub fn user_id(&self) -> Option<RecordId> {
        self.cache().user_id
    }

    /// Snapshot of the cache, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.cache().items.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.cache().items.iter().filter(|item| !item.read).count()
    }

    /// Badge text for the header bell.
    pub fn badge(&self) -> String {
        unread_badge(self.unread_count())
    }

    /// Replaces the cache with the backend's rows for the current user.
    ///
    /// On failure the previous cache is kept.
    pub fn refresh(&self) -> Result<(), NotificationError> {
        let Some(user_id) = self.user_id() else {
            self.cache().items.clear();
            return Ok(());
        };

        let fetched = self.backend.list_notifications(user_id).map_err(|err| {
            warn!(
                "event=notifications_refresh module=notifications status=error error_code={} error={err}",
                err.code()
            );
            err
        })?;

        let mut cache = self.cache();
        // The user may have changed while the request was in flight.
        if cache.user_id != Some(user_id) {
            info!("event=notifications_refresh module=notifications status=skip reason=user_changed");
            return Ok(());
        }
        info!(
            "event=notifications_refresh module=notifications status=ok count={}",
            fetched.len()
        );
        cache.items = fetched;
        Ok(())
    }

    /// Synchronous half of `add`: inserts an unread placeholder at the front.
    pub fn begin_add(&self, draft: NotificationDraft) -> Result<PendingAdd, NotificationError> {
        draft.validate()?;
        let mut cache = self.cache();
        let user_id = cache.user_id.ok_or(NotificationError::NoUser)?;
        let temp_id = Uuid::new_v4();
        cache.items.insert(
            0,
            Notification {
                id: temp_id,
                user_id,
                title: draft.title.clone(),
                message: draft.message.clone(),
                kind: draft.kind,
                read: false,
                created_at: now_epoch_ms(),
                link: draft.link.clone(),
            },
        );
        Ok(PendingAdd {
            temp_id,
            user_id,
            draft,
        })
    }

    /// Settles a [`PendingAdd`]: creates the row, then reconciles by refresh.
    ///
    /// A failed create removes the placeholder. A failed refresh swaps the
    /// placeholder for the created row in place.
    pub fn complete_add(&self, pending: PendingAdd) -> Result<Notification, NotificationError> {
        let created = match self
            .backend
            .create_notification(pending.user_id, &pending.draft)
        {
            Ok(created) => created,
            Err(err) => {
                self.cache().items.retain(|item| item.id != pending.temp_id);
                warn!(
                    "event=notifications_add module=notifications status=error error_code={} error={err}",
                    err.code()
                );
                return Err(err.into());
            }
        };

        if self.refresh().is_err() {
            let mut cache = self.cache();
            if let Some(slot) = cache
                .items
                .iter_mut()
                .find(|item| item.id == pending.temp_id)
            {
                *slot = created.clone();
            }
        }
        info!(
            "event=notifications_add module=notifications status=ok notification_id={}",
            created.id
        );
        Ok(created)
    }

    pub fn add(&self, draft: NotificationDraft) -> Result<Notification, NotificationError> {
        let pending = self.begin_add(draft)?;
        self.complete_add(pending)
    }

    pub fn mark_read(&self, id: RecordId) -> Result<(), NotificationError> {
        let (user_id, previous) = {
            let mut cache = self.cache();
            let user_id = cache.user_id.ok_or(NotificationError::NoUser)?;
            let previous = cache.items.iter_mut().find(|item| item.id == id).map(|item| {
                let was_read = item.read;
                item.read = true;
                was_read
            });
            (user_id, previous)
        };

        if let Err(err) = self.backend.mark_notification_read(user_id, id) {
            if let Some(was_read) = previous {
                self.restore_read_flags(&[(id, was_read)]);
            }
            warn!(
                "event=notifications_mark_read module=notifications status=error notification_id={id} error_code={} error={err}",
                err.code()
            );
            return Err(err.into());
        }
        Ok(())
    }

    pub fn mark_all_read(&self) -> Result<(), NotificationError> {
        let (user_id, flipped) = {
            let mut cache = self.cache();
            let user_id = cache.user_id.ok_or(NotificationError::NoUser)?;
            let flipped: Vec<(RecordId, bool)> = cache
                .items
                .iter_mut()
                .filter(|item| !item.read)
                .map(|item| {
                    item.read = true;
                    (item.id, false)
                })
                .collect();
            (user_id, flipped)
        };

        if let Err(err) = self.backend.mark_all_notifications_read(user_id) {
            self.restore_read_flags(&flipped);
            warn!(
                "event=notifications_mark_all_read module=notifications status=error restored={} error_code={} error={err}",
                flipped.len(),
                err.code()
            );
            return Err(err.into());
        }
        Ok(())
    }

    pub fn remove(&self, id: RecordId) -> Result<(), NotificationError> {
        let (user_id, removed) = {
            let mut cache = self.cache();
            let user_id = cache.user_id.ok_or(NotificationError::NoUser)?;
            let index = cache.items.iter().position(|item| item.id == id);
            let removed = index.map(|index| (index, cache.items.remove(index)));
            (user_id, removed)
        };

        if let Err(err) = self.backend.delete_notification(user_id, id) {
            if let Some((index, record)) = removed {
                let mut cache = self.cache();
                if cache.user_id == Some(user_id) && cache.items.iter().all(|item| item.id != id) {
                    let index = index.min(cache.items.len());
                    cache.items.insert(index, record);
                }
            }
            warn!(
                "event=notifications_remove module=notifications status=error notification_id={id} error_code={} error={err}",
                err.code()
            );
            return Err(err.into());
        }
        Ok(())
    }

    fn restore_read_flags(&self, previous: &[(RecordId, bool)]) {
        let mut cache = self.cache();
        for (id, was_read) in previous {
            if let Some(item) = cache.items.iter_mut().find(|item| item.id == *id) {
                item.read = *was_read;
            }
        }
    }

    fn cache(&self) -> MutexGuard<'_, CacheState> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
