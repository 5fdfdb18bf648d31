//! Backend API seam.
//!
//! [`TimeCoreApi`] is the contract the sync coordinator and caches talk to;
//! [`HttpApi`] implements it over JSON/HTTP with `reqwest`.

mod http;

use std::future::Future;

use serde::Deserialize;

use crate::error::Result;
use crate::models::{Project, ReportId, ReportQuery, ReportScope, ReportSummary, TimeReport, TimeReportPatch};

pub use http::HttpApi;

/// One page of the report list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "PageWire")]
pub struct Page {
    pub items: Vec<TimeReport>,
    /// Continuation cursor; `None` when this is the last page
    pub next_cursor: Option<String>,
}

/// The list endpoint answers with either `{ items, nextCursor }` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageWire {
    Paged {
        items: Vec<TimeReport>,
        #[serde(default, rename = "nextCursor")]
        next_cursor: Option<String>,
    },
    Bare(Vec<TimeReport>),
}

impl From<PageWire> for Page {
    fn from(wire: PageWire) -> Self {
        match wire {
            PageWire::Paged { items, next_cursor } => Self {
                items,
                next_cursor: next_cursor.filter(|cursor| !cursor.is_empty()),
            },
            PageWire::Bare(items) => Self {
                items,
                next_cursor: None,
            },
        }
    }
}

/// Response of the changes endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesResponse {
    #[serde(default)]
    pub latest_ms: Option<i64>,
}

/// Operations the TimeCore backend offers to report list clients.
pub trait TimeCoreApi: Send + Sync + 'static {
    /// Fetch one page of reports matching `query`.
    fn list_reports(
        &self,
        query: &ReportQuery,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<Page>> + Send;

    /// Server-computed totals for `query`'s filters.
    fn report_summary(&self, query: &ReportQuery)
        -> impl Future<Output = Result<ReportSummary>> + Send;

    /// Latest mutation time (ms) across the filtered set, if any row exists.
    fn latest_change(
        &self,
        query: &ReportQuery,
        since: Option<i64>,
    ) -> impl Future<Output = Result<Option<i64>>> + Send;

    fn update_report(
        &self,
        scope: ReportScope,
        id: ReportId,
        patch: &TimeReportPatch,
    ) -> impl Future<Output = Result<TimeReport>> + Send;

    fn delete_report(
        &self,
        scope: ReportScope,
        id: ReportId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn list_projects(&self, customer_id: i64) -> impl Future<Output = Result<Vec<Project>>> + Send;
}
