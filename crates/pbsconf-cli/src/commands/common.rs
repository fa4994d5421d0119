//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use pbsconf_qmgr::{
    ApplyReport, ChangeAction, Command, DesiredState, ObjectKind, QmgrClient, QmgrConfig,
    ShellExecutor,
};

/// Load configuration from an optional file plus `PBSCONF_` variables.
pub fn load_config(path: Option<&Path>) -> Result<QmgrConfig> {
    let config = QmgrConfig::load(path)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;
    tracing::debug!(
        qmgr_path = config.qmgr_path.as_str(),
        escape_map_values = config.escape_map_values,
        "loaded configuration"
    );
    Ok(config)
}

/// Create a client running commands on this host.
pub fn create_client(config: &QmgrConfig) -> QmgrClient<ShellExecutor> {
    QmgrClient::from_config(config, ShellExecutor::new(config.executor.clone()))
}

/// Read a text file.
pub fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Load a desired-state document, rejecting duplicate object names.
pub fn load_desired(path: &Path) -> Result<DesiredState> {
    let text = read_file(path)?;
    let state = DesiredState::from_yaml(&text)
        .with_context(|| format!("Invalid desired state: {}", path.display()))?;

    let duplicates = state.duplicates();
    if !duplicates.is_empty() {
        anyhow::bail!("Duplicate objects in {}: {}", path.display(), duplicates.join(", "));
    }
    Ok(state)
}

/// Parse an object kind argument.
pub fn parse_kind(kind: &str) -> Result<ObjectKind> {
    kind.parse()
        .map_err(|_| anyhow::anyhow!("Unknown object kind: '{kind}'. Available: queue, node, hook, resource, server"))
}

/// Print a command list, one per line.
pub fn print_commands(commands: &[Command]) {
    for command in commands {
        println!("    {}", style(command).dim());
    }
}

/// Print a plan or apply report as a table.
pub fn print_report(report: &ApplyReport) {
    if report.changes.is_empty() {
        println!("Nothing to reconcile.");
        return;
    }

    for change in &report.changes {
        let action = match change.action {
            ChangeAction::Create => style("create").green(),
            ChangeAction::Update => style("update").yellow(),
            ChangeAction::Unchanged => style("unchanged").dim(),
        };
        let name = if change.name.is_empty() {
            "-"
        } else {
            change.name.as_str()
        };
        println!("  {:<10} {:<10} {}", action, change.kind.keyword(), name);
        print_commands(&change.commands);
    }

    let total = report.commands().count();
    println!();
    if report.is_noop() {
        println!("{} Everything up to date.", style("✓").green().bold());
    } else if report.applied {
        println!(
            "{} {} object(s) changed, {} command(s) executed.",
            style("✓").green().bold(),
            report.changed(),
            total
        );
    } else {
        println!(
            "{} {} object(s) to change, {} command(s).",
            style("→").cyan().bold(),
            report.changed(),
            total
        );
    }
}
