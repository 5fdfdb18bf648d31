use serde::Serialize;
use timecore_core::models::TimeReport;
use timecore_core::{ClientConfig, SyncOptions};

use crate::cli::FilterArgs;
use crate::commands::common::{build_query, format_report_lines, open_coordinator};
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportListOutput {
    rows: Vec<TimeReport>,
    next_cursor: Option<String>,
}

pub async fn run_list(
    config: &ClientConfig,
    filters: &FilterArgs,
    pages: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let coordinator = open_coordinator(config, build_query(config, filters), SyncOptions::default())?;
    coordinator.refetch().await?;

    for _ in 1..pages.max(1) {
        if coordinator.load_more().await? == 0 {
            break;
        }
    }

    let snapshot = coordinator.snapshot().await;
    if as_json {
        let output = ReportListOutput {
            rows: snapshot.rows,
            next_cursor: snapshot.next_cursor,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_report_lines(&snapshot.rows) {
            println!("{line}");
        }
        if snapshot.next_cursor.is_some() {
            println!("(more reports available; pass --pages to load further)");
        }
    }

    Ok(())
}
