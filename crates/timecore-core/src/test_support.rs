//! Scripted in-memory backend for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::api::{Page, TimeCoreApi};
use crate::error::{Error, Result};
use crate::models::{
    Project, ReportId, ReportQuery, ReportScope, ReportSummary, TimeReport, TimeReportPatch,
};

pub fn report(id: ReportId, hours: f64) -> TimeReport {
    TimeReport::new(id, hours)
}

pub fn page(ids: &[ReportId], next_cursor: Option<&str>) -> Page {
    Page {
        items: ids.iter().map(|id| report(*id, 1.0)).collect(),
        next_cursor: next_cursor.map(ToString::to_string),
    }
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Release handle for a gated reply.
pub type Gate = oneshot::Sender<()>;

struct Reply<T> {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<T>,
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T> {
        if let Some(gate) = self.gate {
            let _ = gate.await;
        }
        self.result
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Script<T> {
    fn push(&self, result: Result<T>) {
        lock(&self.replies).push_back(Reply { gate: None, result });
    }

    fn push_gated(&self, result: Result<T>) -> Gate {
        let (release, gate) = oneshot::channel();
        lock(&self.replies).push_back(Reply {
            gate: Some(gate),
            result,
        });
        release
    }

    fn pop(&self) -> Option<Reply<T>> {
        lock(&self.replies).pop_front()
    }
}

/// Every endpoint answers from a FIFO script; unscripted calls fall back to
/// an empty page, the configured latest version, or an error for writes.
#[derive(Default)]
pub struct FakeApi {
    lists: Script<Page>,
    changes: Script<Option<i64>>,
    updates: Script<TimeReport>,
    deletes: Script<()>,
    summaries: Script<ReportSummary>,
    latest: Mutex<Option<i64>>,
    list_calls: Mutex<Vec<(ReportQuery, Option<String>)>>,
    change_calls: AtomicUsize,
    update_calls: Mutex<Vec<(ReportId, TimeReportPatch)>>,
    delete_calls: Mutex<Vec<ReportId>>,
    project_calls: AtomicUsize,
    fail_projects: AtomicBool,
}

impl FakeApi {
    pub fn push_page(&self, page: Page) {
        self.lists.push(Ok(page));
    }

    pub fn push_page_gated(&self, page: Page) -> Gate {
        self.lists.push_gated(Ok(page))
    }

    pub fn push_list_error(&self, status: u16) {
        self.lists.push(Err(Error::api(status, "list failed")));
    }

    pub fn push_list_error_gated(&self, status: u16) -> Gate {
        self.lists.push_gated(Err(Error::api(status, "list failed")))
    }

    pub fn set_latest(&self, latest: Option<i64>) {
        *lock(&self.latest) = latest;
    }

    pub fn push_change_gated(&self, latest: Option<i64>) -> Gate {
        self.changes.push_gated(Ok(latest))
    }

    pub fn push_change_error(&self) {
        self.changes.push(Err(Error::api(502, "changes failed")));
    }

    pub fn push_update(&self, report: TimeReport) {
        self.updates.push(Ok(report));
    }

    pub fn push_update_error_gated(&self, status: u16) -> Gate {
        self.updates
            .push_gated(Err(Error::api(status, "update rejected")))
    }

    pub fn push_delete_error_gated(&self, status: u16) -> Gate {
        self.deletes
            .push_gated(Err(Error::api(status, "delete rejected")))
    }

    pub fn push_summary(&self, summary: ReportSummary) {
        self.summaries.push(Ok(summary));
    }

    pub fn fail_projects(&self) {
        self.fail_projects.store(true, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> Vec<(ReportQuery, Option<String>)> {
        lock(&self.list_calls).clone()
    }

    pub fn last_list_query(&self) -> Option<ReportQuery> {
        lock(&self.list_calls).last().map(|(query, _)| query.clone())
    }

    pub fn change_calls(&self) -> usize {
        self.change_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> Vec<(ReportId, TimeReportPatch)> {
        lock(&self.update_calls).clone()
    }

    pub fn delete_calls(&self) -> Vec<ReportId> {
        lock(&self.delete_calls).clone()
    }

    pub fn project_calls(&self) -> usize {
        self.project_calls.load(Ordering::SeqCst)
    }
}

impl TimeCoreApi for FakeApi {
    async fn list_reports(&self, query: &ReportQuery, cursor: Option<&str>) -> Result<Page> {
        lock(&self.list_calls).push((query.clone(), cursor.map(ToString::to_string)));
        match self.lists.pop() {
            Some(reply) => reply.resolve().await,
            None => Ok(Page::default()),
        }
    }

    async fn report_summary(&self, _query: &ReportQuery) -> Result<ReportSummary> {
        match self.summaries.pop() {
            Some(reply) => reply.resolve().await,
            None => Err(Error::api(404, "no summary endpoint")),
        }
    }

    async fn latest_change(&self, _query: &ReportQuery, _since: Option<i64>) -> Result<Option<i64>> {
        self.change_calls.fetch_add(1, Ordering::SeqCst);
        match self.changes.pop() {
            Some(reply) => reply.resolve().await,
            None => Ok(*lock(&self.latest)),
        }
    }

    async fn update_report(
        &self,
        _scope: ReportScope,
        id: ReportId,
        patch: &TimeReportPatch,
    ) -> Result<TimeReport> {
        lock(&self.update_calls).push((id, patch.clone()));
        match self.updates.pop() {
            Some(reply) => reply.resolve().await,
            None => Err(Error::api(500, "unscripted update")),
        }
    }

    async fn delete_report(&self, _scope: ReportScope, id: ReportId) -> Result<()> {
        lock(&self.delete_calls).push(id);
        match self.deletes.pop() {
            Some(reply) => reply.resolve().await,
            None => Ok(()),
        }
    }

    async fn list_projects(&self, customer_id: i64) -> Result<Vec<Project>> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_projects.load(Ordering::SeqCst) {
            return Err(Error::api(503, "projects unavailable"));
        }
        Ok(vec![Project {
            id: customer_id * 10,
            customer_id: Some(customer_id),
            name: format!("Project of {customer_id}"),
            archived: false,
        }])
    }
}
