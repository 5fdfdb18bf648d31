//! Change polling
//!
//! Each tick asks the backend for the latest mutation time of the filtered
//! set and compares it with the version the local rows reflect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{FetchMode, FetchOutcome, StalePolicy, SyncCoordinator};
use crate::api::TimeCoreApi;

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another tick was still reconciling
    Busy,
    /// First version seen for this query; adopted without refreshing
    Adopted(i64),
    Unchanged,
    /// Rows were refreshed in place and the baseline moved to this version
    Refreshed(i64),
    /// Newer data exists; waiting for the user to confirm
    MarkedStale(i64),
    /// The query changed while the tick was in flight
    Discarded,
    /// The backend reports no version (empty set)
    NoVersion,
    Failed,
}

/// Background poll loop; stops when dropped.
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Marks a tick as reconciling for as long as it lives.
struct ReconcileGuard<'a>(&'a AtomicBool);

impl<'a> ReconcileGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: TimeCoreApi> SyncCoordinator<A> {
    /// Run a single poll tick.
    ///
    /// Ticks never overlap: a tick that starts while another one is still
    /// reconciling returns [`PollOutcome::Busy`] without touching the backend.
    pub async fn poll_once(&self) -> PollOutcome {
        let Some(_guard) = ReconcileGuard::acquire(&self.inner.reconciling) else {
            tracing::debug!("Previous poll tick still running; skipping");
            return PollOutcome::Busy;
        };

        let (generation, params, baseline) = {
            let state = self.inner.state.lock().await;
            (state.generation, state.params.clone(), state.baseline_version)
        };

        let latest = match self.inner.api.latest_change(&params, baseline).await {
            Ok(Some(latest)) => latest,
            Ok(None) => return PollOutcome::NoVersion,
            Err(error) => {
                tracing::warn!(%error, "Change poll failed");
                return PollOutcome::Failed;
            }
        };

        let deferred = matches!(self.inner.options.stale_policy, StalePolicy::Defer { .. });
        let pending = {
            let mut state = self.inner.state.lock().await;
            if state.generation != generation {
                return PollOutcome::Discarded;
            }
            match state.baseline_version {
                None => {
                    state.advance_baseline(latest);
                    tracing::debug!(version = latest, "Adopted initial change version");
                    return PollOutcome::Adopted(latest);
                }
                Some(current) if latest > current => {
                    let pending = state
                        .pending_version
                        .map_or(latest, |pending| pending.max(latest));
                    state.pending_version = Some(pending);
                    if deferred {
                        state.stale = true;
                    }
                    pending
                }
                Some(_) => match state.pending_version {
                    Some(pending) if state.stale => pending,
                    _ => return PollOutcome::Unchanged,
                },
            }
        };

        match &self.inner.options.stale_policy {
            StalePolicy::AutoRefresh => self.reconcile(generation, pending).await,
            StalePolicy::Defer { ready } => {
                if ready.as_ref().is_some_and(|ready| ready()) {
                    self.reconcile(generation, pending).await
                } else {
                    tracing::info!(version = pending, "Newer reports available");
                    PollOutcome::MarkedStale(pending)
                }
            }
        }
    }

    /// Poll every `interval` on a background task until the handle is dropped.
    ///
    /// The first tick fires one full interval after spawning.
    pub fn spawn_poller(&self, interval: Duration) -> PollerHandle {
        let coordinator = self.clone();
        let interval = interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = coordinator.poll_once().await;
                tracing::trace!(?outcome, "Poll tick finished");
            }
        });
        PollerHandle { task }
    }

    async fn reconcile(&self, generation: u64, version: i64) -> PollOutcome {
        match self
            .fetch_first_page(FetchMode::InPlace {
                surface_errors: false,
            })
            .await
        {
            Ok(FetchOutcome::Applied) => {
                let mut state = self.inner.state.lock().await;
                if state.generation != generation {
                    return PollOutcome::Discarded;
                }
                state.advance_baseline(version);
                tracing::info!(version, "Refreshed reports after remote change");
                PollOutcome::Refreshed(version)
            }
            Ok(FetchOutcome::Superseded) => PollOutcome::Discarded,
            Err(error) => {
                tracing::debug!(%error, "Background refresh failed; rows kept");
                PollOutcome::Failed
            }
        }
    }
}
