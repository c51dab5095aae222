//! `build`: ingest historical schema files into a superset file.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::BuildArgs,
    schema::{self, Schema},
    super_schema::SuperSchema,
};

pub fn execute(args: &BuildArgs) -> Result<()> {
    let schemas = args
        .schemas
        .iter()
        .map(|path| {
            Schema::load(path).with_context(|| format!("Loading schema from {path:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut super_schema = match &args.base {
        Some(path) => SuperSchema::load(path)
            .with_context(|| format!("Loading base superset from {path:?}"))?,
        None => SuperSchema::new(),
    };
    let before = super_schema.len();

    for (path, schema) in args.schemas.iter().zip(&schemas) {
        debug!(
            "Ingesting {} column(s) from {:?}",
            schema.columns.len(),
            path
        );
        super_schema
            .add_schemas([schema])
            .with_context(|| format!("Ingesting schema {path:?}"))?;
    }

    super_schema
        .save(&args.output)
        .with_context(|| format!("Writing superset to {:?}", args.output))?;
    info!(
        "Ingested {} schema(s) referencing {} tag(s); superset has {} column(s) ({} new) written to {:?}",
        schemas.len(),
        schema::distinct_tags(&schemas).len(),
        super_schema.len(),
        super_schema.len() - before,
        args.output
    );
    Ok(())
}
