use std::path::Path;

use timecore_core::compute_items_delta;
use timecore_core::models::{Item, ItemsDelta, WorkingItem};

use crate::commands::common::read_json_file;
use crate::error::CliError;

pub fn items_delta_from_files(baseline: &Path, working: &Path) -> Result<ItemsDelta, CliError> {
    let baseline: Vec<Item> = read_json_file(baseline)?;
    let working: Vec<WorkingItem> = read_json_file(working)?;
    Ok(compute_items_delta(&baseline, &working))
}

pub fn run_items_diff(baseline: &Path, working: &Path) -> Result<(), CliError> {
    let delta = items_delta_from_files(baseline, working)?;
    println!("{}", serde_json::to_string_pretty(&delta)?);
    Ok(())
}
