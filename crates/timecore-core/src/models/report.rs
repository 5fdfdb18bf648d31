//! Time report model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::item::{Item, ItemsDelta};

/// Server-assigned time report identifier
pub type ReportId = i64;

/// A row of the report list, in the server's normalized shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeReport {
    pub id: ReportId,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Worked hours
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub billed: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Server-computed fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimeReport {
    /// Minimal report, mostly useful for fixtures and fakes.
    #[must_use]
    pub fn new(id: ReportId, hours: f64) -> Self {
        Self {
            id,
            date: None,
            hours,
            description: None,
            billed: false,
            user_id: None,
            user_name: None,
            customer_id: None,
            customer_name: None,
            project_id: None,
            project_name: None,
            items: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Partial update for a time report.
///
/// Only the fields that are set are sent; `items` carries an items delta
/// instead of the full list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeReportPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsDelta>,
}

impl TimeReportPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.hours.is_none()
            && self.description.is_none()
            && self.billed.is_none()
            && self.customer_id.is_none()
            && self.project_id.is_none()
            && self.items.as_ref().map_or(true, ItemsDelta::is_noop)
    }

    /// Shallow-merge the scalar fields into `report`.
    ///
    /// Items are left alone: the server response carries the authoritative
    /// list once the write succeeds.
    pub fn apply_to(&self, report: &mut TimeReport) {
        if let Some(date) = self.date {
            report.date = Some(date);
        }
        if let Some(hours) = self.hours {
            report.hours = hours;
        }
        if let Some(description) = &self.description {
            report.description = Some(description.clone());
        }
        if let Some(billed) = self.billed {
            report.billed = billed;
        }
        if let Some(customer_id) = self.customer_id {
            report.customer_id = Some(customer_id);
        }
        if let Some(project_id) = self.project_id {
            report.project_id = Some(project_id);
        }
    }
}

/// Aggregate totals for the filtered report set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub billed_hours: f64,
    #[serde(default)]
    pub unbilled_hours: f64,
    #[serde(default)]
    pub report_count: u64,
}

impl ReportSummary {
    /// Client-side fallback aggregation over the rows currently loaded.
    ///
    /// Only covers loaded pages, so it underestimates when more pages exist.
    #[must_use]
    pub fn from_rows(rows: &[TimeReport]) -> Self {
        rows.iter().fold(Self::default(), |mut summary, row| {
            summary.total_hours += row.hours;
            if row.billed {
                summary.billed_hours += row.hours;
            } else {
                summary.unbilled_hours += row.hours;
            }
            summary.report_count += 1;
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_keeps_unknown_fields() {
        let report: TimeReport = serde_json::from_str(
            r#"{"id": 7, "hours": 2, "billed": true, "invoiceId": 31, "date": "2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(report.id, 7);
        assert!(report.billed);
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(report.extra.get("invoiceId"), Some(&Value::from(31)));
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let mut report = TimeReport::new(7, 2.0);
        report.description = Some("Install".to_string());

        let patch = TimeReportPatch {
            hours: Some(5.0),
            ..Default::default()
        };
        patch.apply_to(&mut report);

        assert_eq!(report.hours, 5.0);
        assert_eq!(report.description.as_deref(), Some("Install"));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = TimeReportPatch {
            billed: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "billed": true }));
    }

    #[test]
    fn empty_items_delta_keeps_patch_empty() {
        let patch = TimeReportPatch {
            items: Some(ItemsDelta::default()),
            ..Default::default()
        };
        assert!(patch.is_empty());
    }

    #[test]
    fn summary_from_rows_splits_billed_hours() {
        let mut billed = TimeReport::new(1, 3.0);
        billed.billed = true;
        let open = TimeReport::new(2, 1.5);

        let summary = ReportSummary::from_rows(&[billed, open]);
        assert_eq!(
            summary,
            ReportSummary {
                total_hours: 4.5,
                billed_hours: 3.0,
                unbilled_hours: 1.5,
                report_count: 2,
            }
        );
    }
}
