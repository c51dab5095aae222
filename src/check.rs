use anyhow::{Context, Result, bail};
use log::{info, warn};

use crate::{cli::CheckArgs, schema::Schema, super_schema::SuperSchema};

pub fn execute(args: &CheckArgs) -> Result<()> {
    let super_schema = SuperSchema::load(&args.super_schema)
        .with_context(|| format!("Loading superset from {:?}", args.super_schema))?;

    let mut uncovered = Vec::new();
    for path in &args.schemas {
        let schema =
            Schema::load(path).with_context(|| format!("Loading schema from {path:?}"))?;
        if super_schema.is_superset_of_schema(&schema) {
            info!("✓ {:?} is covered by the superset", path);
        } else {
            warn!("✗ {:?} is not covered by the superset", path);
            uncovered.push(path.display().to_string());
        }
    }

    if !uncovered.is_empty() {
        bail!(
            "{} schema(s) not covered by {:?}: {}",
            uncovered.len(),
            args.super_schema,
            uncovered.join(", ")
        );
    }
    Ok(())
}
