//! Column listing for a superset file.
//!
//! Prints one row per tag in superset order: the materialized name, the
//! definition, and every name the column has carried.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;

use crate::{cli::ColumnsArgs, super_schema::SuperSchema, table};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let super_schema = SuperSchema::load(&args.super_schema)
        .with_context(|| format!("Loading superset from {:?}", args.super_schema))?;

    if super_schema.is_empty() {
        info!("Superset {:?} does not define any columns", args.super_schema);
        return Ok(());
    }

    let rows = listing_rows(&super_schema);
    table::print_table(&["tag", "name", "type", "kind", "pk", "history"], &rows);
    info!(
        "Listed {} column(s) from {:?}",
        rows.len(),
        args.super_schema
    );
    Ok(())
}

fn listing_rows(super_schema: &SuperSchema) -> Vec<Vec<String>> {
    let names = super_schema.name_columns();
    super_schema
        .iter()
        .map(|column| {
            vec![
                column.tag.to_string(),
                names.get(&column.tag).cloned().unwrap_or_default(),
                column.type_info.to_string(),
                column.kind.to_string(),
                if column.is_part_of_pk { "yes" } else { "" }.to_string(),
                super_schema.all_column_names(column.tag).iter().join(", "),
            ]
        })
        .collect()
}
