//! Row conversion from a historical schema into superset columns.
//!
//! A CSV file written under an older schema is rewritten with the header of
//! the materialized superset schema. Input columns are matched to superset
//! columns through the name-remap table; superset columns the file does not
//! carry are left empty.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, ensure};
use log::{debug, info};

use crate::{cli::ConvertArgs, io_utils, schema::Schema, super_schema::SuperSchema};

/// Positions of input fields for each output column, in superset order.
#[derive(Debug, Clone)]
pub struct RowConverter {
    headers: Vec<String>,
    sources: Vec<Option<usize>>,
}

impl RowConverter {
    pub fn new(
        super_schema: &SuperSchema,
        schema: &Schema,
        input_headers: &[String],
    ) -> Result<Self> {
        let name_map = super_schema
            .name_map_for_schema(schema)
            .context("Building name map for conversion")?;
        let target = super_schema
            .generate_schema()
            .context("Generating superset schema")?;

        let mut by_target: HashMap<&str, usize> = HashMap::with_capacity(input_headers.len());
        for (idx, header) in input_headers.iter().enumerate() {
            let column = schema.columns.get_by_name(header).ok_or_else(|| {
                anyhow!("Column '{header}' is not described by the historical schema")
            })?;
            let mapped = name_map.get(&column.name).ok_or_else(|| {
                anyhow!("Column '{header}' (tag {}) has no superset name", column.tag)
            })?;
            if let Some(previous) = by_target.insert(mapped.as_str(), idx) {
                return Err(anyhow!(
                    "Columns '{}' and '{}' both map to '{}'",
                    input_headers[previous],
                    header,
                    mapped
                ));
            }
        }

        let headers = target.column_names();
        let sources = headers
            .iter()
            .map(|name| by_target.get(name.as_str()).copied())
            .collect::<Vec<_>>();
        debug!(
            "Converter fills {} of {} superset column(s) from input",
            sources.iter().flatten().count(),
            sources.len()
        );
        Ok(Self { headers, sources })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn convert<'a>(&self, row: &'a [String]) -> Vec<&'a str> {
        self.sources
            .iter()
            .map(|source| {
                source
                    .and_then(|idx| row.get(idx))
                    .map(String::as_str)
                    .unwrap_or("")
            })
            .collect()
    }
}

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let super_schema = SuperSchema::load(&args.super_schema)
        .with_context(|| format!("Loading superset from {:?}", args.super_schema))?;
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    ensure!(
        super_schema.is_superset_of_schema(&schema),
        "Schema {:?} is not covered by superset {:?}",
        args.schema,
        args.super_schema
    );

    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let converter = RowConverter::new(&super_schema, &schema, &headers)
        .with_context(|| format!("Matching header of {:?}", args.input))?;

    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), delimiter)?;
    writer
        .write_record(converter.headers())
        .context("Writing output header")?;
    let mut rows = 0usize;
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record
            .with_context(|| format!("Reading row {} in {:?}", row_idx + 2, args.input))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        writer
            .write_record(converter.convert(&decoded))
            .with_context(|| format!("Writing row {}", row_idx + 2))?;
        rows += 1;
    }
    writer.flush().context("Flushing output")?;
    info!(
        "Converted {} row(s) from {:?} into {} superset column(s)",
        rows,
        args.input,
        converter.headers().len()
    );
    Ok(())
}
