//! Plan command implementation.
//!
//! Diff a saved listing against a desired state and print the commands that
//! `apply` would run.

use std::path::Path;

use anyhow::Result;

use pbsconf_qmgr::plan_from_records;

use super::common::{load_config, load_desired, print_report, read_file};

/// Execute the plan command.
pub fn execute(config: Option<&Path>, current: &Path, desired: &Path, format: &str) -> Result<()> {
    let config = load_config(config)?;
    let records = pbsconf_qmgr::parse(&read_file(current)?);
    let state = load_desired(desired)?;

    let report = plan_from_records(&config.differ(), &records, &state)
        .map_err(|e| anyhow::anyhow!("Failed to plan: {e}"))?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        _ => print_report(&report),
    }

    Ok(())
}
