use timecore_core::{ClientConfig, ReportQuery, SyncOptions};

use crate::commands::common::open_coordinator;
use crate::error::CliError;

pub async fn run_delete(config: &ClientConfig, id: i64) -> Result<(), CliError> {
    let query = ReportQuery::with_scope(config.scope);
    let coordinator = open_coordinator(config, query, SyncOptions::default())?;
    coordinator.delete(id).await?;
    println!("Deleted report {id}");
    Ok(())
}
