use timecore_core::{ClientConfig, SyncOptions};

use crate::cli::FilterArgs;
use crate::commands::common::{build_query, format_summary_lines, open_coordinator};
use crate::error::CliError;

pub async fn run_summary(
    config: &ClientConfig,
    filters: &FilterArgs,
    as_json: bool,
) -> Result<(), CliError> {
    let options = SyncOptions {
        track_summary: true,
        ..SyncOptions::default()
    };
    let coordinator = open_coordinator(config, build_query(config, filters), options)?;
    coordinator.refetch().await?;

    let summary = match coordinator.snapshot().await.summary {
        Some(summary) => summary,
        None => coordinator.refresh_summary().await,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(&summary) {
            println!("{line}");
        }
    }
    Ok(())
}
