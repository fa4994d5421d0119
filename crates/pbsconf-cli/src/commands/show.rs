//! Show command implementation.
//!
//! Read live objects through qmgr and print them as YAML or JSON.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use pbsconf_qmgr::{
    CommandExecutor, Hook, Node, ObjectKind, PbsObject, QmgrClient, Queue, Resource,
};

use super::common::{create_client, load_config, parse_kind};

/// Execute the show command.
pub async fn execute(
    config: Option<&Path>,
    kind: &str,
    name: Option<&str>,
    format: &str,
) -> Result<()> {
    let config = load_config(config)?;
    let kind = parse_kind(kind)?;
    let client = create_client(&config);

    match kind {
        ObjectKind::Queue => show::<Queue, _>(&client, name, format).await,
        ObjectKind::Node => show::<Node, _>(&client, name, format).await,
        ObjectKind::Hook => show::<Hook, _>(&client, name, format).await,
        ObjectKind::Resource => show::<Resource, _>(&client, name, format).await,
        ObjectKind::Server => {
            let server = client
                .server()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read server: {e}"))?
                .ok_or_else(|| anyhow::anyhow!("server not found"))?;
            print(&server, format)
        }
    }
}

async fn show<T, E>(client: &QmgrClient<E>, name: Option<&str>, format: &str) -> Result<()>
where
    T: PbsObject + Serialize,
    E: CommandExecutor,
{
    match name {
        Some(name) => {
            let object = client
                .get::<T>(name)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", T::KIND))?
                .ok_or_else(|| anyhow::anyhow!("{} not found: {name}", T::KIND))?;
            print(&object, format)
        }
        None => {
            let objects = client
                .list::<T>()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list {}: {e}", T::KIND))?;
            if objects.is_empty() {
                println!("No {} objects found.", T::KIND);
                return Ok(());
            }
            print(&objects, format)
        }
    }
}

fn print<S: Serialize + ?Sized>(value: &S, format: &str) -> Result<()> {
    let text = match format {
        "json" => serde_json::to_string_pretty(value)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?,
        _ => serde_yaml_ng::to_string(value)
            .map_err(|e| anyhow::anyhow!("YAML serialization failed: {e}"))?,
    };
    println!("{}", text.trim_end());
    Ok(())
}
