//! `remap`: show the name-remap table for one historical schema.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::info;

use crate::{cli::RemapArgs, schema::Schema, super_schema::SuperSchema, table};

pub fn execute(args: &RemapArgs) -> Result<()> {
    let super_schema = SuperSchema::load(&args.super_schema)
        .with_context(|| format!("Loading superset from {:?}", args.super_schema))?;
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    let name_map = super_schema
        .name_map_for_schema(&schema)
        .with_context(|| format!("Mapping {:?} onto the superset", args.schema))?;

    if args.json {
        let ordered: BTreeMap<&String, &String> = name_map.iter().collect();
        let rendered =
            serde_json::to_string_pretty(&ordered).context("Serializing name map to JSON")?;
        println!("{rendered}");
        return Ok(());
    }

    let rows = schema
        .columns
        .iter()
        .map(|column| {
            let target = name_map.get(&column.name).cloned().unwrap_or_default();
            let marker = if target == column.name { "" } else { "renamed" };
            vec![
                column.tag.to_string(),
                column.name.clone(),
                target,
                marker.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&["tag", "from", "to", "note"], &rows);
    info!(
        "Mapped {} column(s) from {:?}",
        rows.len(),
        args.schema
    );
    Ok(())
}
