use thiserror::Error;

use crate::schema::Tag;

/// Recoverable failures raised by the column collection and the superset engine.
///
/// Tag collisions (one tag carrying two incompatible definitions) are not
/// represented here: they abort the process instead of being returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Column tag {tag} already exists in the collection")]
    DuplicateTag { tag: Tag },
    #[error("Duplicate column name '{name}' (tags {first} and {second})")]
    DuplicateName { name: String, first: Tag, second: Tag },
    #[error("failed to map columns: tag {tag} (column '{name}') is unknown to the superset")]
    UnknownTag { tag: Tag, name: String },
    #[error("Inconsistent superset parts: {0}")]
    InconsistentParts(String),
}
