//! Apply command implementation.
//!
//! Reconcile live PBS configuration with a desired-state file.

use std::path::Path;

use anyhow::Result;
use console::style;

use super::common::{create_client, load_config, load_desired, print_report};

/// Execute the apply command.
pub async fn execute(config: Option<&Path>, file: &Path, dry_run: bool) -> Result<()> {
    let config = load_config(config)?;
    let state = load_desired(file)?;
    let client = create_client(&config);

    println!(
        "{} {} {} object(s) from {}",
        style("→").cyan().bold(),
        if dry_run { "Planning" } else { "Applying" },
        state.len(),
        style(file.display()).dim()
    );

    let report = client
        .apply(&state, dry_run)
        .await
        .map_err(|e| anyhow::anyhow!("Apply failed (earlier commands stay applied): {e}"))?;

    print_report(&report);
    Ok(())
}
