use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile a table's schema history into one superset schema",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest historical schema files (oldest first) into a superset file
    Build(BuildArgs),
    /// Merge several superset files into one
    Union(UnionArgs),
    /// Materialize a schema with one unique name per column
    Generate(GenerateArgs),
    /// Show how a historical schema's column names map onto the superset
    Remap(RemapArgs),
    /// Check that the superset covers one or more historical schemas
    Check(CheckArgs),
    /// List superset columns with every name they have carried
    Columns(ColumnsArgs),
    /// Rewrite a CSV written under a historical schema into superset columns
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Historical schema files, ingested in the order given
    #[arg(short = 's', long = "schema", required = true, action = clap::ArgAction::Append)]
    pub schemas: Vec<PathBuf>,
    /// Existing superset file to extend instead of starting empty
    #[arg(long)]
    pub base: Option<PathBuf>,
    /// Destination superset file
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct UnionArgs {
    /// Superset files to merge; the first definition seen for a tag wins
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Destination superset file
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Superset file to materialize
    #[arg(long = "super")]
    pub super_schema: PathBuf,
    /// Destination schema file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RemapArgs {
    /// Superset file providing canonical names
    #[arg(long = "super")]
    pub super_schema: PathBuf,
    /// Historical schema whose column names are mapped
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Emit the mapping as a JSON object instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Superset file to check against
    #[arg(long = "super")]
    pub super_schema: PathBuf,
    /// Historical schema files that must be covered
    #[arg(short = 's', long = "schema", required = true, action = clap::ArgAction::Append)]
    pub schemas: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Superset file to list
    #[arg(long = "super")]
    pub super_schema: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Superset file providing the canonical columns
    #[arg(long = "super")]
    pub super_schema: PathBuf,
    /// Historical schema the input file was written under
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Input CSV file (`-` for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => match other.as_bytes() {
            [] => Err("Delimiter cannot be empty".to_string()),
            [byte] if byte.is_ascii() => Ok(*byte),
            [_] => Err("Delimiter must be ASCII".to_string()),
            _ => Err("Delimiter must be a single character".to_string()),
        },
    }
}
