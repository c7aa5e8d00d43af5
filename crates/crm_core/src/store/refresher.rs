//! Periodic notification refresh on a background thread.
//!
//! # Invariants
//! - `stop()` and drop both end the thread and wait for it.
//! - A failed refresh is logged and the next tick runs as scheduled.

use super::notification_store::NotificationStore;
use crate::backend::NotificationApi;
use log::{error, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to a running refresh loop.
pub struct NotificationRefresher {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicUsize>,
}

impl NotificationRefresher {
    /// Refreshes once immediately, then every `interval` until stopped.
    pub fn start<B>(store: Arc<NotificationStore<B>>, interval: Duration) -> Self
    where
        B: NotificationApi + 'static,
    {
        let (stop_tx, stop_rx) = channel::<()>();
        let ticks = Arc::new(AtomicUsize::new(0));
        let worker_ticks = Arc::clone(&ticks);

        let spawned = thread::Builder::new()
            .name("crm-notification-refresh".to_string())
            .spawn(move || {
                info!(
                    "event=notification_refresher module=notifications status=start interval_ms={}",
                    interval.as_millis()
                );
                loop {
                    if let Err(err) = store.refresh() {
                        warn!("event=notification_refresher module=notifications status=error error={err}");
                    }
                    worker_ticks.fetch_add(1, Ordering::SeqCst);
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("event=notification_refresher module=notifications status=ok stopped=true");
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("event=notification_refresher module=notifications status=error error_code=spawn_failed error={err}");
                None
            }
        };

        Self {
            stop: Some(stop_tx),
            handle,
            ticks,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Completed refresh attempts so far.
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=notification_refresher module=notifications status=error error_code=worker_panicked");
            }
        }
    }
}

impl Drop for NotificationRefresher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
