use std::path::Path;

use chrono::NaiveDate;
use timecore_core::models::{Item, TimeReportPatch, WorkingItem};
use timecore_core::util::normalize_text_option;
use timecore_core::{ClientConfig, ReportQuery, SyncOptions};

use crate::commands::common::{format_report_line, open_coordinator, read_json_file};
use crate::error::CliError;

/// Scalar fields of `reports update`.
#[derive(Debug, Clone, Default)]
pub struct ReportEdit {
    pub hours: Option<f64>,
    pub description: Option<String>,
    pub billed: Option<bool>,
    pub date: Option<NaiveDate>,
    pub project_id: Option<i64>,
}

impl ReportEdit {
    pub fn into_patch(self) -> Result<TimeReportPatch, CliError> {
        if let Some(hours) = self.hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(timecore_core::Error::InvalidInput(
                    "hours must be a non-negative number".to_string(),
                )
                .into());
            }
        }
        Ok(TimeReportPatch {
            date: self.date,
            hours: self.hours,
            description: normalize_text_option(self.description),
            billed: self.billed,
            project_id: self.project_id,
            ..TimeReportPatch::default()
        })
    }
}

pub async fn run_update(
    config: &ClientConfig,
    id: i64,
    edit: ReportEdit,
    items: Option<(&Path, &Path)>,
    as_json: bool,
) -> Result<(), CliError> {
    let patch = edit.into_patch()?;
    if items.is_none() && patch.is_empty() {
        return Err(CliError::EmptyPatch);
    }

    let query = ReportQuery::with_scope(config.scope);
    let coordinator = open_coordinator(config, query, SyncOptions::default())?;
    let saved = match items {
        Some((baseline, working)) => {
            let baseline: Vec<Item> = read_json_file(baseline)?;
            let working: Vec<WorkingItem> = read_json_file(working)?;
            coordinator
                .update_items(id, &baseline, &working, patch)
                .await?
        }
        None => Some(coordinator.update(id, patch).await?),
    };

    match saved {
        None => println!("Nothing to save for report {id}"),
        Some(report) if as_json => println!("{}", serde_json::to_string_pretty(&report)?),
        Some(report) => println!("{}", format_report_line(&report)),
    }
    Ok(())
}
