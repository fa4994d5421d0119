//! Parse command implementation.
//!
//! Run the listing parser on a saved qmgr listing, without contacting PBS.

use std::path::Path;

use anyhow::Result;
use console::style;

use pbsconf_qmgr::{AttributeValue, RawRecord};

use super::common::read_file;

/// Execute the parse command.
pub fn execute(file: &Path, format: &str) -> Result<()> {
    let text = read_file(file)?;
    let records = pbsconf_qmgr::parse(&text);

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&records)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        _ => print_records(&records),
    }

    Ok(())
}

fn print_records(records: &[RawRecord]) {
    if records.is_empty() {
        println!("No objects found.");
        return;
    }

    println!("{} {} object(s):\n", style("→").cyan().bold(), records.len());

    for record in records {
        println!("{} {}", style(&record.object_kind).bold(), record.name);
        for (name, value) in record.attributes.iter() {
            match value {
                AttributeValue::Scalar(value) => println!("    {name} = {value}"),
                AttributeValue::SubMap(entries) => {
                    for (key, value) in entries {
                        println!("    {name}.{key} = {value}");
                    }
                }
            }
        }
        println!();
    }
}
