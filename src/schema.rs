//! Column and schema data model.
//!
//! A [`Column`] is identified by its [`Tag`], a stable 64-bit identifier that
//! survives renames. Its display name is presentation only. Columns live in a
//! [`ColCollection`], an ordered container indexed by tag, and a [`Schema`] is
//! one concrete version of a table built from such a collection.
//!
//! ## Responsibilities
//!
//! - Primitive storage kinds ([`Kind`]) and richer type descriptors ([`TypeInfo`])
//! - Textual type tokens such as `varchar(64)` or `decimal(18,4)`
//! - Tag-unique column collections with insertion-ordered iteration
//! - YAML loading and saving of concrete schemas via `serde_yaml`

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
    str::FromStr,
};

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::SchemaError;

pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

const DECIMAL_MAX_PRECISION: u32 = 65;
const VARCHAR_MAX_LENGTH: u32 = 65_535;

/// Stable identifier of a logical column across every version of a table.
pub type Tag = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    Uuid,
    Timestamp,
    Decimal,
    Blob,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Uuid => "uuid",
            Kind::Timestamp => "timestamp",
            Kind::Decimal => "decimal",
            Kind::Blob => "blob",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalSpec {
    pub precision: u32,
    pub scale: u32,
}

impl DecimalSpec {
    pub fn new(precision: u32, scale: u32) -> Result<Self> {
        ensure!(precision > 0, "Decimal precision must be positive");
        ensure!(
            precision <= DECIMAL_MAX_PRECISION,
            "Decimal precision must be <= {}",
            DECIMAL_MAX_PRECISION
        );
        ensure!(
            scale <= precision,
            "Decimal scale ({}) cannot exceed precision ({})",
            scale,
            precision
        );
        Ok(Self { precision, scale })
    }
}

/// Type descriptor compared structurally when checking tag identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    Varchar { length: u32 },
    Text,
    Int { bits: u8 },
    Uint { bits: u8 },
    Float { bits: u8 },
    Bool,
    Uuid,
    Date,
    DateTime,
    Decimal(DecimalSpec),
    Blob,
}

impl TypeInfo {
    /// Storage kind a column of this type uses unless told otherwise.
    pub fn kind(&self) -> Kind {
        match self {
            TypeInfo::Varchar { .. } | TypeInfo::Text => Kind::String,
            TypeInfo::Int { .. } => Kind::Int,
            TypeInfo::Uint { .. } => Kind::Uint,
            TypeInfo::Float { .. } => Kind::Float,
            TypeInfo::Bool => Kind::Bool,
            TypeInfo::Uuid => Kind::Uuid,
            TypeInfo::Date | TypeInfo::DateTime => Kind::Timestamp,
            TypeInfo::Decimal(_) => Kind::Decimal,
            TypeInfo::Blob => Kind::Blob,
        }
    }

    pub fn signature(&self) -> String {
        match self {
            TypeInfo::Varchar { length } => format!("varchar({length})"),
            TypeInfo::Text => "text".to_string(),
            TypeInfo::Int { bits } => format!("int{bits}"),
            TypeInfo::Uint { bits } => format!("uint{bits}"),
            TypeInfo::Float { bits } => format!("float{bits}"),
            TypeInfo::Bool => "bool".to_string(),
            TypeInfo::Uuid => "uuid".to_string(),
            TypeInfo::Date => "date".to_string(),
            TypeInfo::DateTime => "datetime".to_string(),
            TypeInfo::Decimal(spec) => format!("decimal({},{})", spec.precision, spec.scale),
            TypeInfo::Blob => "blob".to_string(),
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "varchar(length)",
            "text",
            "int8|int16|int32|int64",
            "uint8|uint16|uint32|uint64",
            "float32|float64",
            "bool",
            "uuid",
            "date",
            "datetime",
            "decimal(precision,scale)",
            "blob",
        ]
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

impl FromStr for TypeInfo {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "text" | "string" => Ok(TypeInfo::Text),
            "tinyint" | "int8" => Ok(TypeInfo::Int { bits: 8 }),
            "smallint" | "int16" => Ok(TypeInfo::Int { bits: 16 }),
            "int" | "integer" | "int32" => Ok(TypeInfo::Int { bits: 32 }),
            "bigint" | "int64" => Ok(TypeInfo::Int { bits: 64 }),
            "uint8" => Ok(TypeInfo::Uint { bits: 8 }),
            "uint16" => Ok(TypeInfo::Uint { bits: 16 }),
            "uint" | "uint32" => Ok(TypeInfo::Uint { bits: 32 }),
            "uint64" => Ok(TypeInfo::Uint { bits: 64 }),
            "float" | "float32" => Ok(TypeInfo::Float { bits: 32 }),
            "double" | "float64" => Ok(TypeInfo::Float { bits: 64 }),
            "bool" | "boolean" => Ok(TypeInfo::Bool),
            "uuid" | "guid" => Ok(TypeInfo::Uuid),
            "date" => Ok(TypeInfo::Date),
            "datetime" | "timestamp" => Ok(TypeInfo::DateTime),
            "blob" | "bytes" => Ok(TypeInfo::Blob),
            other if other.starts_with("varchar") => parse_varchar_type(&normalized),
            other if other.starts_with("decimal") => parse_decimal_type(&normalized),
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                TypeInfo::variants().join(", ")
            )),
        }
    }
}

impl Serialize for TypeInfo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.signature())
    }
}

impl<'de> Deserialize<'de> for TypeInfo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        TypeInfo::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

fn type_arguments<'a>(value: &'a str, type_name: &str) -> Result<Vec<&'a str>> {
    let start = value
        .find('(')
        .ok_or_else(|| anyhow!("Type '{value}' must specify arguments, e.g. {type_name}(...)"))?;
    ensure!(
        value.ends_with(')'),
        "Type '{value}' must close with ')'"
    );
    ensure!(
        value[..start].trim() == type_name,
        "Unknown column type '{value}'"
    );
    Ok(value[start + 1..value.len() - 1]
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect())
}

fn parse_varchar_type(value: &str) -> Result<TypeInfo> {
    let args = type_arguments(value, "varchar")?;
    ensure!(
        args.len() == 1,
        "Varchar type requires exactly one length argument, e.g. varchar(64)"
    );
    let length: u32 = args[0]
        .parse()
        .with_context(|| format!("Invalid varchar length '{}'", args[0]))?;
    ensure!(
        (1..=VARCHAR_MAX_LENGTH).contains(&length),
        "Varchar length must be between 1 and {}",
        VARCHAR_MAX_LENGTH
    );
    Ok(TypeInfo::Varchar { length })
}

fn parse_decimal_type(value: &str) -> Result<TypeInfo> {
    let args = type_arguments(value, "decimal")?;
    let mut precision: Option<u32> = None;
    let mut scale: Option<u32> = None;
    let mut positional = Vec::new();

    for token in args {
        if let Some((key, raw)) = token
            .split_once(['=', ':'])
            .map(|(k, v)| (k.trim(), v.trim()))
        {
            let parsed: u32 = raw
                .parse()
                .with_context(|| format!("Invalid decimal {key} '{raw}'"))?;
            match key {
                "precision" => precision = Some(parsed),
                "scale" => scale = Some(parsed),
                other => return Err(anyhow!("Unknown decimal key '{other}'")),
            }
        } else {
            let parsed: u32 = token
                .parse()
                .with_context(|| format!("Invalid decimal argument '{token}'"))?;
            positional.push(parsed);
        }
    }

    let mut positional = positional.into_iter();
    let precision = precision
        .or_else(|| positional.next())
        .ok_or_else(|| anyhow!("Decimal type requires a precision value, e.g. decimal(18,4)"))?;
    let scale = scale
        .or_else(|| positional.next())
        .ok_or_else(|| anyhow!("Decimal type requires a scale value, e.g. decimal(18,4)"))?;
    ensure!(
        positional.next().is_none(),
        "Decimal type accepts only precision and scale"
    );
    Ok(TypeInfo::Decimal(DecimalSpec::new(precision, scale)?))
}

/// Per-version column constraint. Not part of a column's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColConstraint {
    NotNull,
    Unique,
    Default(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ColumnRecord", into = "ColumnRecord")]
pub struct Column {
    pub name: String,
    pub tag: Tag,
    pub kind: Kind,
    pub type_info: TypeInfo,
    pub is_part_of_pk: bool,
    pub constraints: Vec<ColConstraint>,
}

impl Column {
    pub fn new(name: impl Into<String>, tag: Tag, type_info: TypeInfo) -> Self {
        Self {
            name: name.into(),
            tag,
            kind: type_info.kind(),
            type_info,
            is_part_of_pk: false,
            constraints: Vec::new(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_part_of_pk = true;
        self
    }

    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_constraint(mut self, constraint: ColConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Same definition as stored inside a superset: no name, no constraints.
    pub fn stripped(&self) -> Self {
        Self {
            name: String::new(),
            constraints: Vec::new(),
            ..self.clone()
        }
    }

    /// True when both columns agree on everything that makes up tag identity.
    pub fn same_definition(&self, other: &Column) -> bool {
        self.is_part_of_pk == other.is_part_of_pk
            && self.kind == other.kind
            && self.type_info == other.type_info
    }
}

/// On-disk shape of a column; `kind` falls back to the type's natural kind.
#[derive(Serialize, Deserialize)]
struct ColumnRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    tag: Tag,
    #[serde(rename = "type")]
    type_info: TypeInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<Kind>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    primary_key: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<ColConstraint>,
}

impl From<ColumnRecord> for Column {
    fn from(record: ColumnRecord) -> Self {
        Column {
            kind: record.kind.unwrap_or_else(|| record.type_info.kind()),
            name: record.name,
            tag: record.tag,
            type_info: record.type_info,
            is_part_of_pk: record.primary_key,
            constraints: record.constraints,
        }
    }
}

impl From<Column> for ColumnRecord {
    fn from(column: Column) -> Self {
        let kind = (column.kind != column.type_info.kind()).then_some(column.kind);
        ColumnRecord {
            name: column.name,
            tag: column.tag,
            type_info: column.type_info,
            kind,
            primary_key: column.is_part_of_pk,
            constraints: column.constraints,
        }
    }
}

/// Ordered columns with unique tags. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct ColCollection {
    columns: Vec<Column>,
    by_tag: HashMap<Tag, usize>,
}

impl ColCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_from_columns(columns: Vec<Column>) -> Result<Self, SchemaError> {
        let mut collection = Self::new();
        for column in columns {
            collection.append(column)?;
        }
        Ok(collection)
    }

    pub fn append(&mut self, column: Column) -> Result<(), SchemaError> {
        if self.by_tag.contains_key(&column.tag) {
            return Err(SchemaError::DuplicateTag { tag: column.tag });
        }
        self.by_tag.insert(column.tag, self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    pub fn get_by_tag(&self, tag: Tag) -> Option<&Column> {
        self.by_tag.get(&tag).map(|&idx| &self.columns[idx])
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn contains_tag(&self, tag: Tag) -> bool {
        self.by_tag.contains_key(&tag)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.columns.iter().map(|column| column.tag)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl TryFrom<Vec<Column>> for ColCollection {
    type Error = SchemaError;

    fn try_from(columns: Vec<Column>) -> Result<Self, Self::Error> {
        Self::try_from_columns(columns)
    }
}

impl From<ColCollection> for Vec<Column> {
    fn from(collection: ColCollection) -> Self {
        collection.columns
    }
}

impl<'a> IntoIterator for &'a ColCollection {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One concrete version of a table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub columns: ColCollection,
}

impl Schema {
    pub fn from_collection(columns: ColCollection) -> Self {
        Schema {
            schema_version: None,
            columns,
        }
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, SchemaError> {
        Ok(Self::from_collection(ColCollection::try_from_columns(
            columns,
        )?))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn pk_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_part_of_pk)
    }

    pub fn non_pk_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_part_of_pk)
    }

    /// Rejects two columns sharing a display name.
    pub fn validate_names(&self) -> Result<(), SchemaError> {
        let mut seen: HashMap<&str, Tag> = HashMap::new();
        for column in &self.columns {
            if let Some(&first) = seen.get(column.name.as_str()) {
                return Err(SchemaError::DuplicateName {
                    name: column.name.clone(),
                    first,
                    second: column.tag,
                });
            }
            seen.insert(&column.name, column.tag);
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, &self.versioned()).context("Writing schema YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.versioned()).context("Serializing schema to YAML string")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema: Schema = serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        ensure!(
            schema.columns.iter().all(|c| !c.name.is_empty()),
            "Schema {path:?} contains a column without a name"
        );
        schema
            .validate_names()
            .with_context(|| format!("Validating column names in {path:?}"))?;
        Ok(schema)
    }

    fn versioned(&self) -> Schema {
        let mut schema = self.clone();
        if schema.schema_version.is_none() {
            schema.schema_version = Some(CURRENT_SCHEMA_VERSION.to_string());
        }
        schema
    }
}

/// Distinct tags appearing in any of the given schemas, first appearance first.
pub fn distinct_tags<'a, I>(schemas: I) -> Vec<Tag>
where
    I: IntoIterator<Item = &'a Schema>,
{
    let mut seen = HashSet::new();
    schemas
        .into_iter()
        .flat_map(|schema| schema.columns.tags())
        .filter(|tag| seen.insert(*tag))
        .collect()
}
