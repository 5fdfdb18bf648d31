//! Sync coordinator for the paginated time report list.
//!
//! [`SyncCoordinator`] owns the rows of one report query. It loads them page by
//! page, applies edits optimistically and rolls them back when the backend
//! rejects a write, and (through the poller) keeps the list fresh by comparing
//! the server's change version with the version the local rows reflect.
//!
//! All state sits behind one async mutex that is never held across a network
//! call. Interleaved completions are resolved with request ids:
//!
//! - every first-page load (`refetch`, `refresh_visible`) takes a new id and
//!   only the response carrying the latest id is applied;
//! - every query change bumps a generation, so responses issued for an older
//!   query (load-more pages, poll ticks, summaries) are dropped.

mod poller;

pub use poller::{PollOutcome, PollerHandle};

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::api::TimeCoreApi;
use crate::cache::ProjectCache;
use crate::delta::compute_items_delta;
use crate::error::Result;
use crate::models::{
    clamp_page_size, Item, Project, ReportId, ReportQuery, ReportScope, ReportSummary, TimeReport,
    TimeReportPatch, WorkingItem, MAX_PAGE_SIZE,
};

/// Scroll container of whatever renders the rows.
///
/// Replacing the row list can reset the container's offset as a side effect,
/// so in-place refreshes read it before and restore it after.
pub trait Viewport: Send + Sync {
    fn scroll_top(&self) -> f64;
    fn set_scroll_top(&self, offset: f64);
}

/// Caller-supplied check deciding whether a deferred refresh may run now
/// (for example "the list is scrolled to the top").
pub type ReadyPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// What the poller does once it sees a server version newer than the baseline.
#[derive(Clone, Default)]
pub enum StalePolicy {
    /// Refresh the visible rows in place right away.
    #[default]
    AutoRefresh,
    /// Flag the list as stale and wait for [`SyncCoordinator::confirm_refresh`],
    /// or for `ready` to return true on a later tick.
    Defer { ready: Option<ReadyPredicate> },
}

impl fmt::Debug for StalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoRefresh => f.write_str("AutoRefresh"),
            Self::Defer { ready } => f
                .debug_struct("Defer")
                .field("ready", &ready.as_ref().map(|_| "<predicate>"))
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub stale_policy: StalePolicy,
    /// Keep `summary` up to date after loads and writes
    pub track_summary: bool,
}

/// Whether a first-page response was applied or dropped as superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Superseded,
}

/// Read-only copy of the coordinator state, for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncSnapshot {
    pub rows: Vec<TimeReport>,
    pub next_cursor: Option<String>,
    pub params: ReportQuery,
    pub baseline_version: Option<i64>,
    pub loading_first: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    /// Set under [`StalePolicy::Defer`] when the server has newer data
    pub stale: bool,
    pub summary: Option<ReportSummary>,
}

impl SyncSnapshot {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Clear rows first; the new query has no valid previous page.
    Replace,
    /// Keep rows visible until the response lands.
    InPlace { surface_errors: bool },
}

#[derive(Debug, Clone, Copy)]
enum VersionGuard {
    Request(u64),
    Generation(u64),
}

struct State {
    rows: Vec<TimeReport>,
    next_cursor: Option<String>,
    params: ReportQuery,
    baseline_version: Option<i64>,
    pending_version: Option<i64>,
    stale: bool,
    loading_first: bool,
    loading_more: bool,
    error: Option<String>,
    summary: Option<ReportSummary>,
    /// Bumped on every query change
    generation: u64,
    /// Id of the latest first-page request
    fetch_seq: u64,
    viewport: Option<Arc<dyn Viewport>>,
}

impl State {
    fn new(params: ReportQuery) -> Self {
        Self {
            rows: Vec::new(),
            next_cursor: None,
            params,
            baseline_version: None,
            pending_version: None,
            stale: false,
            loading_first: false,
            loading_more: false,
            error: None,
            summary: None,
            generation: 0,
            fetch_seq: 0,
            viewport: None,
        }
    }

    const fn holds(&self, guard: VersionGuard) -> bool {
        match guard {
            VersionGuard::Request(id) => self.fetch_seq == id,
            VersionGuard::Generation(generation) => self.generation == generation,
        }
    }

    /// Move the baseline forward, never back.
    fn advance_baseline(&mut self, version: i64) {
        let next = self
            .baseline_version
            .map_or(version, |current| current.max(version));
        self.baseline_version = Some(next);
        if self.pending_version.is_some_and(|pending| pending <= next) {
            self.pending_version = None;
            self.stale = false;
        }
    }

    fn position(&self, id: ReportId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }
}

struct Inner<A> {
    api: A,
    options: SyncOptions,
    state: Mutex<State>,
    reconciling: AtomicBool,
    projects: ProjectCache,
}

/// Owner of one report list; cheap to clone, clones share state.
pub struct SyncCoordinator<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for SyncCoordinator<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: TimeCoreApi> SyncCoordinator<A> {
    pub fn new(api: A, params: ReportQuery, options: SyncOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                options,
                state: Mutex::new(State::new(params.normalized())),
                reconciling: AtomicBool::new(false),
                projects: ProjectCache::new(),
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn options(&self) -> &SyncOptions {
        &self.inner.options
    }

    pub async fn snapshot(&self) -> SyncSnapshot {
        let state = self.inner.state.lock().await;
        SyncSnapshot {
            rows: state.rows.clone(),
            next_cursor: state.next_cursor.clone(),
            params: state.params.clone(),
            baseline_version: state.baseline_version,
            loading_first: state.loading_first,
            loading_more: state.loading_more,
            error: state.error.clone(),
            stale: state.stale,
            summary: state.summary.clone(),
        }
    }

    /// Currently loaded row with `id`, if any.
    pub async fn row(&self, id: ReportId) -> Option<TimeReport> {
        let state = self.inner.state.lock().await;
        state.rows.iter().find(|row| row.id == id).cloned()
    }

    pub async fn attach_viewport(&self, viewport: Arc<dyn Viewport>) {
        self.inner.state.lock().await.viewport = Some(viewport);
    }

    pub async fn detach_viewport(&self) {
        self.inner.state.lock().await.viewport = None;
    }

    pub async fn clear_error(&self) {
        self.inner.state.lock().await.error = None;
    }

    /// Load the first page of the current query, replacing all rows.
    pub async fn refetch(&self) -> Result<FetchOutcome> {
        self.fetch_first_page(FetchMode::Replace).await
    }

    /// Reload the visible rows without clearing them first and restore the
    /// attached viewport's scroll offset afterwards.
    ///
    /// All loaded rows are requested again in one page, capped at
    /// [`MAX_PAGE_SIZE`]; rows past the cap drop off until loaded again.
    pub async fn refresh_visible(&self) -> Result<FetchOutcome> {
        self.fetch_first_page(FetchMode::InPlace {
            surface_errors: true,
        })
        .await
    }

    /// Append the next page. Returns how many rows were appended; `0` when
    /// there is nothing more to load, a load is already running, or the
    /// response belonged to a list that has since been reloaded.
    pub async fn load_more(&self) -> Result<usize> {
        let (lineage, params, cursor) = {
            let mut state = self.inner.state.lock().await;
            if state.loading_more {
                return Ok(0);
            }
            let Some(cursor) = state.next_cursor.clone() else {
                return Ok(0);
            };
            state.loading_more = true;
            (state.fetch_seq, state.params.clone(), cursor)
        };

        tracing::debug!(cursor = %cursor, "Loading next report page");
        let result = self.inner.api.list_reports(&params, Some(&cursor)).await;

        let mut state = self.inner.state.lock().await;
        if state.fetch_seq != lineage {
            tracing::debug!("Dropping page for a list that was reloaded meanwhile");
            return Ok(0);
        }
        state.loading_more = false;
        // An in-place refresh may have landed meanwhile and moved the tail.
        if state.next_cursor.as_deref() != Some(cursor.as_str()) {
            tracing::debug!(cursor = %cursor, "Dropping page loaded from a replaced cursor");
            return Ok(0);
        }
        match result {
            Ok(page) => {
                let appended = page.items.len();
                state.rows.extend(page.items);
                state.next_cursor = page.next_cursor;
                Ok(appended)
            }
            Err(error) => {
                tracing::warn!(%error, "Loading more reports failed");
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    pub async fn set_query(&self, query: ReportQuery) -> Result<FetchOutcome> {
        self.replace_params(move |params| *params = query).await
    }

    pub async fn set_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<FetchOutcome> {
        self.replace_params(move |params| {
            params.start = start;
            params.end = end;
        })
        .await
    }

    pub async fn set_search(&self, search: impl Into<String> + Send) -> Result<FetchOutcome> {
        let search = search.into();
        self.replace_params(move |params| params.search = Some(search))
            .await
    }

    pub async fn set_scope(&self, scope: ReportScope) -> Result<FetchOutcome> {
        self.replace_params(move |params| params.scope = scope).await
    }

    pub async fn set_page_size(&self, limit: u32) -> Result<FetchOutcome> {
        self.replace_params(move |params| params.limit = limit).await
    }

    pub async fn set_billed(&self, billed: Option<bool>) -> Result<FetchOutcome> {
        self.replace_params(move |params| params.billed = billed)
            .await
    }

    pub async fn set_users(&self, user_id: Option<i64>, user_ids: Vec<i64>) -> Result<FetchOutcome> {
        self.replace_params(move |params| {
            params.user_id = user_id;
            params.user_ids = user_ids;
        })
        .await
    }

    /// Optimistically patch a row, then confirm with the backend.
    ///
    /// On success the row becomes the server's response. On failure the row
    /// is restored to its state right before the patch and `error` is set.
    pub async fn update(&self, id: ReportId, patch: TimeReportPatch) -> Result<TimeReport> {
        let (scope, generation, lineage, original) = {
            let mut state = self.inner.state.lock().await;
            let original = state.position(id).map(|index| {
                let original = state.rows[index].clone();
                patch.apply_to(&mut state.rows[index]);
                original
            });
            (state.params.scope, state.generation, state.fetch_seq, original)
        };

        let result = self.inner.api.update_report(scope, id, &patch).await;

        let outcome = {
            let mut state = self.inner.state.lock().await;
            match result {
                Ok(report) => {
                    if let Some(index) = state.position(id) {
                        state.rows[index] = report.clone();
                    }
                    state.error = None;
                    Ok(report)
                }
                Err(error) => {
                    tracing::warn!(id, %error, "Report update failed; rolling back");
                    if state.fetch_seq == lineage {
                        if let (Some(original), Some(index)) = (original, state.position(id)) {
                            state.rows[index] = original;
                        }
                    }
                    state.error = Some(error.to_string());
                    Err(error)
                }
            }
        };

        self.after_write(outcome.is_ok(), generation).await;
        outcome
    }

    /// Save an edited items list together with any other patch fields.
    ///
    /// Returns `Ok(None)` without contacting the backend when neither the
    /// items nor the other fields changed.
    pub async fn update_items(
        &self,
        id: ReportId,
        baseline: &[Item],
        working: &[WorkingItem],
        mut patch: TimeReportPatch,
    ) -> Result<Option<TimeReport>> {
        let delta = compute_items_delta(baseline, working);
        patch.items = (!delta.is_noop()).then_some(delta);
        if patch.is_empty() {
            tracing::debug!(id, "Nothing to save for report");
            return Ok(None);
        }
        self.update(id, patch).await.map(Some)
    }

    /// Optimistically remove a row, then confirm with the backend.
    pub async fn delete(&self, id: ReportId) -> Result<()> {
        let (scope, generation, lineage, removed) = {
            let mut state = self.inner.state.lock().await;
            let removed = state
                .position(id)
                .map(|index| (index, state.rows.remove(index)));
            (state.params.scope, state.generation, state.fetch_seq, removed)
        };

        let result = self.inner.api.delete_report(scope, id).await;

        let outcome = {
            let mut state = self.inner.state.lock().await;
            match result {
                Ok(()) => {
                    state.error = None;
                    Ok(())
                }
                Err(error) => {
                    tracing::warn!(id, %error, "Report delete failed; rolling back");
                    if state.fetch_seq == lineage && state.position(id).is_none() {
                        if let Some((index, row)) = removed {
                            let index = index.min(state.rows.len());
                            state.rows.insert(index, row);
                        }
                    }
                    state.error = Some(error.to_string());
                    Err(error)
                }
            }
        };

        self.after_write(outcome.is_ok(), generation).await;
        outcome
    }

    /// Reload the aggregate totals for the current query.
    ///
    /// Falls back to aggregating the loaded rows when the summary endpoint
    /// fails; never reports an error.
    pub async fn refresh_summary(&self) -> ReportSummary {
        let (generation, params) = {
            let state = self.inner.state.lock().await;
            (state.generation, state.params.clone())
        };

        let summary = match self.inner.api.report_summary(&params).await {
            Ok(summary) => summary,
            Err(error) => {
                tracing::warn!(%error, "Summary request failed; aggregating loaded rows");
                let state = self.inner.state.lock().await;
                ReportSummary::from_rows(&state.rows)
            }
        };

        let mut state = self.inner.state.lock().await;
        if state.generation == generation {
            state.summary = Some(summary.clone());
        }
        summary
    }

    /// Apply a deferred refresh the user asked for.
    pub async fn confirm_refresh(&self) -> Result<FetchOutcome> {
        let (generation, pending) = {
            let state = self.inner.state.lock().await;
            (state.generation, state.pending_version)
        };
        let outcome = self.refresh_visible().await?;
        if let (FetchOutcome::Applied, Some(version)) = (outcome, pending) {
            let mut state = self.inner.state.lock().await;
            if state.generation == generation {
                state.advance_baseline(version);
            }
        }
        Ok(outcome)
    }

    /// Projects of a customer, loaded once and cached for this list's lifetime.
    pub async fn projects_for(&self, customer_id: i64) -> Result<Vec<Project>> {
        self.inner
            .projects
            .get_or_load(&self.inner.api, customer_id)
            .await
    }

    pub async fn invalidate_projects(&self, customer_id: Option<i64>) {
        match customer_id {
            Some(customer_id) => self.inner.projects.invalidate(customer_id).await,
            None => self.inner.projects.clear().await,
        }
    }

    async fn replace_params(
        &self,
        update: impl FnOnce(&mut ReportQuery) + Send,
    ) -> Result<FetchOutcome> {
        {
            let mut state = self.inner.state.lock().await;
            let mut next = state.params.clone();
            update(&mut next);
            let next = next.normalized();
            if next == state.params {
                tracing::debug!("Report query unchanged; forcing a re-sync");
            }
            state.params = next;
            state.generation += 1;
            state.rows.clear();
            state.next_cursor = None;
            state.baseline_version = None;
            state.pending_version = None;
            state.stale = false;
            state.summary = None;
        }
        self.refetch().await
    }

    async fn fetch_first_page(&self, mode: FetchMode) -> Result<FetchOutcome> {
        let (request_id, params, scroll) = {
            let mut state = self.inner.state.lock().await;
            state.fetch_seq += 1;
            state.loading_first = true;
            state.loading_more = false;
            let mut params = state.params.clone();
            let scroll = match mode {
                FetchMode::Replace => {
                    state.rows.clear();
                    state.next_cursor = None;
                    None
                }
                FetchMode::InPlace { .. } => {
                    // Re-request everything on screen so loaded pages do not collapse.
                    let visible = u32::try_from(state.rows.len()).unwrap_or(u32::MAX);
                    if visible > MAX_PAGE_SIZE {
                        tracing::debug!(
                            visible,
                            limit = MAX_PAGE_SIZE,
                            "Refreshing only the first rows of a long list"
                        );
                    }
                    params.limit = clamp_page_size(params.limit.max(visible));
                    state
                        .viewport
                        .as_ref()
                        .map(|viewport| (Arc::clone(viewport), viewport.scroll_top()))
                }
            };
            (state.fetch_seq, params, scroll)
        };

        tracing::debug!(request_id, ?mode, "Loading first report page");
        let result = self.inner.api.list_reports(&params, None).await;

        {
            let mut state = self.inner.state.lock().await;
            if state.fetch_seq != request_id {
                tracing::debug!(request_id, "Dropping superseded first-page response");
                return Ok(FetchOutcome::Superseded);
            }
            state.loading_first = false;
            match result {
                Ok(page) => {
                    state.rows = page.items;
                    state.next_cursor = page.next_cursor;
                    state.error = None;
                }
                Err(error) => {
                    tracing::warn!(%error, "Loading reports failed");
                    match mode {
                        FetchMode::Replace => {
                            state.rows.clear();
                            state.next_cursor = None;
                            state.error = Some(error.to_string());
                        }
                        FetchMode::InPlace { surface_errors } => {
                            if surface_errors {
                                state.error = Some(error.to_string());
                            }
                        }
                    }
                    return Err(error);
                }
            }
        }

        if let Some((viewport, offset)) = scroll {
            viewport.set_scroll_top(offset);
        }

        self.adopt_server_version(VersionGuard::Request(request_id))
            .await;
        if self.inner.options.track_summary {
            self.refresh_summary().await;
        }
        Ok(FetchOutcome::Applied)
    }

    async fn after_write(&self, succeeded: bool, generation: u64) {
        if succeeded {
            // Our own write is not news; move the baseline past it.
            self.adopt_server_version(VersionGuard::Generation(generation))
                .await;
        }
        if self.inner.options.track_summary {
            self.refresh_summary().await;
        }
    }

    async fn adopt_server_version(&self, guard: VersionGuard) {
        let (params, since) = {
            let state = self.inner.state.lock().await;
            (state.params.clone(), state.baseline_version)
        };

        match self.inner.api.latest_change(&params, since).await {
            Ok(Some(version)) => {
                let mut state = self.inner.state.lock().await;
                if state.holds(guard) {
                    state.advance_baseline(version);
                }
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(%error, "Reading the change version failed; baseline kept");
            }
        }
    }
}
