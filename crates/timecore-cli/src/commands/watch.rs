use std::time::Duration;

use timecore_core::api::HttpApi;
use timecore_core::sync::{FetchOutcome, PollOutcome, StalePolicy};
use timecore_core::{ClientConfig, SyncCoordinator, SyncOptions};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, MissedTickBehavior};

use crate::cli::FilterArgs;
use crate::commands::common::{build_query, format_report_lines, open_coordinator};
use crate::error::CliError;

pub async fn run_watch(
    config: &ClientConfig,
    filters: &FilterArgs,
    interval: Option<u64>,
    defer: bool,
) -> Result<(), CliError> {
    let stale_policy = if defer {
        StalePolicy::Defer { ready: None }
    } else {
        StalePolicy::AutoRefresh
    };
    let options = SyncOptions {
        stale_policy,
        ..SyncOptions::default()
    };
    let coordinator = open_coordinator(config, build_query(config, filters), options)?;
    coordinator.refetch().await?;
    print_rows(&coordinator).await;

    let period = interval
        .map_or_else(|| config.poll_interval(), Duration::from_secs)
        .max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    tracing::info!(
        interval_secs = period.as_secs(),
        "Watching reports. Press Enter to refresh, Ctrl-C to stop."
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => match coordinator.poll_once().await {
                PollOutcome::Refreshed(version) => {
                    println!("-- refreshed (change {version})");
                    print_rows(&coordinator).await;
                }
                PollOutcome::MarkedStale(_) => {
                    println!("-- newer reports available, press Enter to refresh");
                }
                outcome => tracing::debug!(?outcome, "Poll tick"),
            },
            line = input.next_line(), if stdin_open => {
                if line?.is_none() {
                    stdin_open = false;
                    continue;
                }
                match coordinator.confirm_refresh().await {
                    Ok(FetchOutcome::Applied) => print_rows(&coordinator).await,
                    Ok(FetchOutcome::Superseded) => {}
                    Err(error) => eprintln!("Refresh failed: {error}"),
                }
            }
        }
    }

    Ok(())
}

async fn print_rows(coordinator: &SyncCoordinator<HttpApi>) {
    let snapshot = coordinator.snapshot().await;
    for line in format_report_lines(&snapshot.rows) {
        println!("{line}");
    }
    if snapshot.rows.is_empty() {
        println!("(no reports)");
    }
}
