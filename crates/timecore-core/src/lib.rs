//! timecore-core - Core library for TimeCore
//!
//! This crate contains the report models, the items delta engine, the HTTP
//! client for the TimeCore REST backend, and the sync coordinator that keeps a
//! paginated report list fresh with optimistic writes and change polling.

pub mod api;
pub mod cache;
pub mod config;
pub mod debounce;
pub mod delta;
pub mod error;
pub mod models;
pub mod sync;
pub mod util;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use delta::compute_items_delta;
pub use error::{Error, Result};
pub use models::{Item, ItemsDelta, ReportId, ReportQuery, ReportScope, TimeReport, WorkingItem};
pub use sync::{SyncCoordinator, SyncOptions, SyncSnapshot};
