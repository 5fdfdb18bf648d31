//! Report list query parameters

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::util::normalize_text_option;

/// Default number of rows requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size the backend accepts
pub const MAX_PAGE_SIZE: u32 = 500;

/// Which report family a list operates on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportScope {
    /// Every user's reports, admin endpoints
    Admin,
    /// The signed-in user's own reports
    #[default]
    User,
}

impl ReportScope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Path of the list endpoint, relative to the API base URL.
    #[must_use]
    pub const fn list_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin/time-reports",
            Self::User => "/time-reports",
        }
    }
}

impl fmt::Display for ReportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown report scope '{other}' (expected admin or user)")),
        }
    }
}

/// Filter and paging parameters of a report list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Free-text search
    #[serde(default)]
    pub search: Option<String>,
    /// `Some(false)` restricts to unbilled time
    #[serde(default)]
    pub billed: Option<bool>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_ids: Vec<i64>,
    /// Page size
    pub limit: u32,
    #[serde(default)]
    pub scope: ReportScope,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            search: None,
            billed: None,
            user_id: None,
            user_ids: Vec::new(),
            limit: DEFAULT_PAGE_SIZE,
            scope: ReportScope::default(),
        }
    }
}

impl ReportQuery {
    #[must_use]
    pub fn with_scope(scope: ReportScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Normalize search text and clamp the page size.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.search = normalize_text_option(self.search);
        self.limit = clamp_page_size(self.limit);
        self
    }

    /// Query pairs shared by the list, summary and changes endpoints.
    #[must_use]
    pub fn filter_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start {
            pairs.push(("start", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("end", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(search) = self.search.as_deref() {
            pairs.push(("q", search.to_string()));
        }
        if let Some(billed) = self.billed {
            pairs.push(("billed", billed.to_string()));
        }
        if let Some(user_id) = self.user_id {
            pairs.push(("userId", user_id.to_string()));
        }
        if !self.user_ids.is_empty() {
            let joined = self
                .user_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("userIds", joined));
        }
        pairs
    }

    /// Query pairs for one page of the list endpoint.
    #[must_use]
    pub fn list_pairs(&self, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut pairs = self.filter_pairs();
        pairs.push(("limit", self.limit.to_string()));
        if let Some(cursor) = cursor {
            pairs.push(("cursor", cursor.to_string()));
        }
        pairs.push(("scope", self.scope.as_str().to_string()));
        pairs
    }
}

#[must_use]
pub fn clamp_page_size(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}
