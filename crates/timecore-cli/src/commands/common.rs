use std::path::Path;

use serde::de::DeserializeOwned;
use timecore_core::api::HttpApi;
use timecore_core::models::{ReportSummary, TimeReport};
use timecore_core::{ClientConfig, ReportQuery, ReportScope, SyncCoordinator, SyncOptions};

use crate::cli::FilterArgs;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

const DESCRIPTION_PREVIEW_CHARS: usize = 60;

/// Resolve the client config for the selected profile, environment included.
pub fn load_client_config(
    profile: Option<&str>,
    scope: Option<ReportScope>,
) -> Result<ClientConfig, CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let name = profiles.resolve_profile_name(profile);
    tracing::debug!(profile = %name, "Using CLI profile");

    let mut config = profiles
        .profile(&name)
        .cloned()
        .unwrap_or_default()
        .client_config(|key| std::env::var(key).ok())?;
    if let Some(scope) = scope {
        config.scope = scope;
    }
    Ok(config)
}

pub fn build_query(config: &ClientConfig, filters: &FilterArgs) -> ReportQuery {
    ReportQuery {
        start: filters.start,
        end: filters.end,
        search: filters.search.clone(),
        billed: filters.billed,
        user_id: filters.user,
        user_ids: filters.users.clone(),
        limit: filters.limit.unwrap_or(config.page_size),
        scope: config.scope,
    }
    .normalized()
}

pub fn open_coordinator(
    config: &ClientConfig,
    query: ReportQuery,
    options: SyncOptions,
) -> Result<SyncCoordinator<HttpApi>, CliError> {
    let api = HttpApi::new(config)?;
    Ok(SyncCoordinator::new(api, query, options))
}

pub fn format_hours(hours: f64) -> String {
    format!("{hours:.2}h")
}

pub fn format_report_line(report: &TimeReport) -> String {
    let date = report
        .date
        .map_or_else(|| "----------".to_string(), |date| date.to_string());
    let billed = if report.billed { "billed" } else { "open" };
    let who = report.user_name.as_deref().unwrap_or("-");
    let project = match (&report.customer_name, &report.project_name) {
        (Some(customer), Some(project)) => format!("{customer} / {project}"),
        (Some(customer), None) => customer.clone(),
        (None, Some(project)) => project.clone(),
        (None, None) => "-".to_string(),
    };
    let description = report
        .description
        .as_deref()
        .map(description_preview)
        .unwrap_or_default();

    format!(
        "{:>6}  {date}  {:>7}  {billed:<6}  {who}  {project}  {description}",
        report.id,
        format_hours(report.hours)
    )
    .trim_end()
    .to_string()
}

pub fn format_report_lines(reports: &[TimeReport]) -> Vec<String> {
    reports.iter().map(format_report_line).collect()
}

pub fn format_summary_lines(summary: &ReportSummary) -> Vec<String> {
    vec![
        format!("Reports:  {}", summary.report_count),
        format!("Total:    {}", format_hours(summary.total_hours)),
        format!("Billed:   {}", format_hours(summary.billed_hours)),
        format!("Unbilled: {}", format_hours(summary.unbilled_hours)),
    ]
}

fn description_preview(description: &str) -> String {
    let compact = description.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = compact.chars();
    let preview: String = chars.by_ref().take(DESCRIPTION_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Read a JSON array of items (baseline or working rows) from `path`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|error| CliError::ItemsFile {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|error| CliError::ItemsFile {
        path: path.display().to_string(),
        message: error.to_string(),
    })
}
