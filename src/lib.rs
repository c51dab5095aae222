//! Superset schema reconciliation for tables with a versioned schema history.
//!
//! The engine lives in [`super_schema`]; the data model it works over lives in
//! [`schema`]. The remaining modules implement the `superschema` command line.

pub mod cli;
pub mod convert;
pub mod error;
pub mod io_utils;
pub mod schema;
pub mod super_schema;
pub mod table;

mod build_cmd;
mod check;
mod columns;
mod generate;
mod merge;
mod remap;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use crate::error::SchemaError;
pub use crate::schema::{ColCollection, Column, Schema, Tag};
pub use crate::super_schema::SuperSchema;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("superschema", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Build(args) => build_cmd::execute(&args),
        Commands::Union(args) => merge::execute(&args),
        Commands::Generate(args) => generate::execute(&args),
        Commands::Remap(args) => remap::execute(&args),
        Commands::Check(args) => check::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Convert(args) => convert::execute(&args),
    }
}
