//! Delete command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use pbsconf_qmgr::{Hook, Node, ObjectKind, Queue, Resource};

use super::common::{create_client, load_config, parse_kind};

/// Execute the delete command.
pub async fn execute(config: Option<&Path>, kind: &str, name: &str) -> Result<()> {
    let config = load_config(config)?;
    let kind = parse_kind(kind)?;
    let client = create_client(&config);

    let result = match kind {
        ObjectKind::Queue => client.delete::<Queue>(name).await,
        ObjectKind::Node => client.delete::<Node>(name).await,
        ObjectKind::Hook => client.delete::<Hook>(name).await,
        ObjectKind::Resource => client.delete::<Resource>(name).await,
        ObjectKind::Server => anyhow::bail!("The server object cannot be deleted"),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to delete {kind} {name}: {e}"))?;

    println!(
        "{} Deleted {} {}",
        style("✓").green().bold(),
        kind,
        style(name).bold()
    );
    Ok(())
}
