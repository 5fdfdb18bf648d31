//! TimeCore CLI - time reports from the terminal
//!
//! Lists, watches and edits time reports through the same sync coordinator
//! the graphical clients use.

mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ItemCommands, ReportCommands};
use crate::commands::common::load_client_config;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::diff::run_items_diff;
use crate::commands::list::run_list;
use crate::commands::projects::run_projects;
use crate::commands::summary::run_summary;
use crate::commands::update::{run_update, ReportEdit};
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timecore=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Reports { command } => {
            let config = load_client_config(profile, cli.scope)?;
            match command {
                ReportCommands::List {
                    filters,
                    pages,
                    json,
                } => run_list(&config, &filters, pages, json).await?,
                ReportCommands::Watch {
                    filters,
                    interval,
                    defer,
                } => run_watch(&config, &filters, interval, defer).await?,
                ReportCommands::Update {
                    id,
                    hours,
                    description,
                    billed,
                    date,
                    project,
                    items_baseline,
                    items_working,
                    json,
                } => {
                    let edit = ReportEdit {
                        hours,
                        description,
                        billed,
                        date,
                        project_id: project,
                    };
                    let items = items_baseline
                        .as_deref()
                        .zip(items_working.as_deref());
                    run_update(&config, id, edit, items, json).await?;
                }
                ReportCommands::Delete { id } => run_delete(&config, id).await?,
                ReportCommands::Summary { filters, json } => {
                    run_summary(&config, &filters, json).await?;
                }
                ReportCommands::Projects { customer_id, json } => {
                    run_projects(&config, customer_id, json).await?;
                }
            }
        }
        Commands::Items {
            command: ItemCommands::Diff { baseline, working },
        } => run_items_diff(&baseline, &working)?,
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
