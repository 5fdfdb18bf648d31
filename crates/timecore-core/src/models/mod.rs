//! Data models for TimeCore

mod item;
mod project;
mod query;
mod report;

pub use item::{
    normalize_amount, normalize_article_id, ArticleId, Item, ItemFields, ItemId, ItemsDelta,
    UpsertItem, WorkingItem, MIN_AMOUNT,
};
pub use project::Project;
pub use query::{clamp_page_size, ReportQuery, ReportScope, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use report::{ReportId, ReportSummary, TimeReport, TimeReportPatch};
