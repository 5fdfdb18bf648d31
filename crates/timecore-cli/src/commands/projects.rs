use timecore_core::{ClientConfig, ReportQuery, SyncOptions};

use crate::commands::common::open_coordinator;
use crate::error::CliError;

pub async fn run_projects(
    config: &ClientConfig,
    customer_id: i64,
    as_json: bool,
) -> Result<(), CliError> {
    let query = ReportQuery::with_scope(config.scope);
    let coordinator = open_coordinator(config, query, SyncOptions::default())?;
    let projects = coordinator.projects_for(customer_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else {
        for project in &projects {
            let archived = if project.archived { "  (archived)" } else { "" };
            println!("{:>6}  {}{archived}", project.id, project.name);
        }
    }
    Ok(())
}
