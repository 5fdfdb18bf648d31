//! Debounced search input
//!
//! Typing in the search box should not refetch on every keystroke. Each call
//! to [`SearchDebouncer::push`] replaces the pending search and schedules it
//! after an idle delay. Only one timer is alive at a time; the previous one is
//! aborted, and so is the last one on `cancel` or drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};

use crate::api::TimeCoreApi;
use crate::sync::SyncCoordinator;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct SearchDebouncer<A> {
    coordinator: SyncCoordinator<A>,
    delay: Duration,
    version: Arc<AtomicU64>,
    pending: Mutex<Option<AbortHandle>>,
}

impl<A: TimeCoreApi> SearchDebouncer<A> {
    pub fn new(coordinator: SyncCoordinator<A>) -> Self {
        Self::with_delay(coordinator, DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_delay(coordinator: SyncCoordinator<A>, delay: Duration) -> Self {
        Self {
            coordinator,
            delay,
            version: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Schedule `search` to be applied once input has been idle for the delay.
    ///
    /// The returned handle resolves to `true` once this call's search was
    /// applied. It is cancelled if newer input arrives while it still waits.
    pub fn push(&self, search: impl Into<String>) -> JoinHandle<bool> {
        let search = search.into();
        let current = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        let version = Arc::clone(&self.version);
        let coordinator = self.coordinator.clone();
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if version.load(Ordering::Acquire) != current {
                return false;
            }
            // Detached so aborting the timer never interrupts a running refetch.
            let refetch = tokio::spawn(async move { coordinator.set_search(search).await });
            match refetch.await {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => tracing::warn!(%error, "Search refetch failed"),
                Err(error) => tracing::warn!(%error, "Search refetch task failed"),
            }
            true
        });

        if let Some(previous) = self.replace_pending(Some(task.abort_handle())) {
            previous.abort();
        }
        task
    }

    /// Drop any search still waiting for its delay.
    pub fn cancel(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
        if let Some(previous) = self.replace_pending(None) {
            previous.abort();
        }
    }

    fn replace_pending(&self, next: Option<AbortHandle>) -> Option<AbortHandle> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *pending, next)
    }
}

impl<A> Drop for SearchDebouncer<A> {
    fn drop(&mut self) {
        self.version.fetch_add(1, Ordering::AcqRel);
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}
