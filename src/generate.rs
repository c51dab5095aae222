use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;

use crate::{cli::GenerateArgs, io_utils, schema::Schema, super_schema::SuperSchema};

pub fn execute(args: &GenerateArgs) -> Result<()> {
    let super_schema = SuperSchema::load(&args.super_schema)
        .with_context(|| format!("Loading superset from {:?}", args.super_schema))?;
    let schema = super_schema
        .generate_schema()
        .context("Generating schema from superset")?;
    schema
        .validate_names()
        .context("Checking generated column names")?;

    let yaml = schema.to_yaml_string()?;
    io_utils::write_text(args.output.as_deref(), &yaml)?;
    match &args.output {
        Some(path) => info!(
            "Generated schema with {} written to {:?}",
            key_summary(&schema),
            path
        ),
        None => info!("Generated schema with {}", key_summary(&schema)),
    }
    Ok(())
}

fn key_summary(schema: &Schema) -> String {
    let keys = schema.pk_columns().map(|column| column.name.as_str()).join(", ");
    format!(
        "{} key column(s) [{}] and {} other column(s)",
        schema.pk_columns().count(),
        keys,
        schema.non_pk_columns().count()
    )
}
