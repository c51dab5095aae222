//! `union`: merge superset files.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::UnionArgs, super_schema::SuperSchema};

pub fn execute(args: &UnionArgs) -> Result<()> {
    let inputs = args
        .inputs
        .iter()
        .map(|path| {
            SuperSchema::load(path).with_context(|| format!("Loading superset from {path:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let merged = SuperSchema::union(&inputs).context("Merging supersets")?;
    merged
        .save(&args.output)
        .with_context(|| format!("Writing superset to {:?}", args.output))?;
    info!(
        "Merged {} superset(s) into {} column(s) written to {:?}",
        inputs.len(),
        merged.len(),
        args.output
    );
    Ok(())
}
