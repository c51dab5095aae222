//! Superset schema: the union of every column a table has ever had.
//!
//! Columns are keyed by tag and stored without their names or constraints.
//! Every name a tag has carried is recorded separately, so a rename adds a
//! name to an existing tag rather than a new column. A presentable schema is
//! regenerated on demand by picking one name per tag and suffixing names that
//! several tags would otherwise share.
//!
//! Reusing a tag for a column with a different kind, type or primary key role
//! is an identity collision and aborts with a panic.

pub mod file;

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use log::debug;

use crate::{
    error::SchemaError,
    schema::{ColCollection, Column, Schema, Tag},
};

// The first recorded name stands in for the current one, which is not tracked.
const CANDIDATE_NAME_INDEX: usize = 0;

#[derive(Debug, Clone, Default)]
pub struct SuperSchema {
    all_cols: ColCollection,
    tag_names: HashMap<Tag, Vec<String>>,
}

impl SuperSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schemas<'a, I>(schemas: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a Schema>,
    {
        let mut super_schema = Self::new();
        super_schema.add_schemas(schemas)?;
        Ok(super_schema)
    }

    /// Rebuilds a superset from previously persisted parts without validation.
    pub fn from_parts(all_cols: ColCollection, tag_names: HashMap<Tag, Vec<String>>) -> Self {
        Self {
            all_cols,
            tag_names,
        }
    }

    /// Like [`SuperSchema::from_parts`], but requires every column to be
    /// stripped and to have at least one recorded name, and every named tag to
    /// have a column.
    pub fn try_from_parts(
        all_cols: ColCollection,
        tag_names: HashMap<Tag, Vec<String>>,
    ) -> Result<Self, SchemaError> {
        for column in &all_cols {
            if *column != column.stripped() {
                return Err(SchemaError::InconsistentParts(format!(
                    "column with tag {} carries a name or constraints",
                    column.tag
                )));
            }
            match tag_names.get(&column.tag) {
                Some(names) if !names.is_empty() => {}
                _ => {
                    return Err(SchemaError::InconsistentParts(format!(
                        "column with tag {} has no recorded names",
                        column.tag
                    )));
                }
            }
        }
        if let Some(orphan) = tag_names
            .keys()
            .filter(|tag| !all_cols.contains_tag(**tag))
            .min()
        {
            return Err(SchemaError::InconsistentParts(format!(
                "names recorded for tag {orphan} which has no column"
            )));
        }
        Ok(Self::from_parts(all_cols, tag_names))
    }

    pub fn parts(&self) -> (&ColCollection, &HashMap<Tag, Vec<String>>) {
        (&self.all_cols, &self.tag_names)
    }

    pub fn into_parts(self) -> (ColCollection, HashMap<Tag, Vec<String>>) {
        (self.all_cols, self.tag_names)
    }

    /// Records `column` under its tag.
    ///
    /// # Panics
    ///
    /// Panics when the tag is already known with a different kind, type or
    /// primary key role.
    pub fn add_column(&mut self, column: &Column) -> Result<(), SchemaError> {
        if let Some(existing) = self.all_cols.get_by_tag(column.tag)
            && !existing.same_definition(column)
        {
            let existing_name = self
                .tag_names
                .get(&column.tag)
                .and_then(|names| names.get(CANDIDATE_NAME_INDEX))
                .map(String::as_str)
                .unwrap_or_default();
            panic!(
                "tag collision for columns {} and {}, different definitions (tag: {})",
                existing_name, column.name, column.tag
            );
        }

        if let Some(names) = self.tag_names.get_mut(&column.tag) {
            if !names.contains(&column.name) {
                debug!("Tag {} gains name '{}'", column.tag, column.name);
                names.push(column.name.clone());
            }
            return Ok(());
        }

        debug!("New column '{}' (tag {})", column.name, column.tag);
        self.tag_names.insert(column.tag, vec![column.name.clone()]);
        self.all_cols.append(column.stripped())
    }

    /// Ingests each schema's columns in order, stopping at the first failure.
    /// Columns ingested before a failure stay recorded.
    pub fn add_schemas<'a, I>(&mut self, schemas: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = &'a Schema>,
    {
        for schema in schemas {
            schema
                .columns
                .iter()
                .try_for_each(|column| self.add_column(column))?;
        }
        Ok(())
    }

    pub fn get_column(&self, tag: Tag) -> Option<&Column> {
        self.all_cols.get_by_tag(tag)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.all_cols.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.all_cols.tags()
    }

    /// Every name recorded for `tag`, in the order first seen.
    pub fn all_column_names(&self, tag: Tag) -> &[String] {
        self.tag_names.get(&tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.all_cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_cols.is_empty()
    }

    pub fn equals(&self, other: &SuperSchema) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let columns_equal = self
            .iter()
            .all(|column| other.get_column(column.tag) == Some(column));
        if !columns_equal || self.tag_names.len() != other.tag_names.len() {
            return false;
        }
        self.tag_names.iter().all(|(tag, names)| {
            other.tag_names.get(tag).is_some_and(|other_names| {
                names.len() == other_names.len()
                    && names.iter().sorted().eq(other_names.iter().sorted())
            })
        })
    }

    /// True when every column of `schema` is covered: the tag exists with
    /// the same definition and the column's name is recorded for it.
    pub fn is_superset_of_schema(&self, schema: &Schema) -> bool {
        schema.columns.iter().all(|column| {
            self.get_column(column.tag).is_some_and(|existing| {
                existing.type_info == column.type_info
                    && existing.is_part_of_pk == column.is_part_of_pk
                    && existing.kind == column.kind
            }) && self.all_column_names(column.tag).contains(&column.name)
        })
    }

    /// One name per tag, unique across the superset. Names claimed by several
    /// tags become `name_<tag>`. When a suffixed name is also another tag's
    /// literal name, the literal holder is suffixed in turn until no name is
    /// shared.
    pub fn name_columns(&self) -> HashMap<Tag, String> {
        let mut unique: HashMap<Tag, String> = self
            .tag_names
            .iter()
            .filter_map(|(tag, names)| {
                names
                    .get(CANDIDATE_NAME_INDEX)
                    .map(|candidate| (*tag, candidate.clone()))
            })
            .collect();
        let mut suffixed: HashSet<Tag> = HashSet::new();

        loop {
            let mut claims: BTreeMap<&str, Vec<Tag>> = BTreeMap::new();
            for (tag, name) in &unique {
                claims.entry(name.as_str()).or_default().push(*tag);
            }

            // Two suffixed names end in different tags, so every shared name
            // has at least one holder that is still unsuffixed.
            let mut renames = Vec::new();
            for (name, tags) in claims {
                if tags.len() < 2 {
                    continue;
                }
                for tag in tags {
                    if !suffixed.contains(&tag) {
                        renames.push((tag, format!("{name}_{tag}")));
                    }
                }
            }
            if renames.is_empty() {
                return unique;
            }

            for (tag, name) in renames {
                debug!("Tag {tag} materializes as '{name}'");
                suffixed.insert(tag);
                unique.insert(tag, name);
            }
        }
    }

    /// Materializes a schema in superset column order using [`Self::name_columns`].
    pub fn generate_schema(&self) -> Result<Schema, SchemaError> {
        let names = self.name_columns();
        let mut columns = ColCollection::new();
        for column in self.iter() {
            let mut named = column.clone();
            named.name = names.get(&column.tag).cloned().unwrap_or_default();
            columns.append(named)?;
        }
        Ok(Schema::from_collection(columns))
    }

    /// Maps each column name of `schema` to the superset's name for the same tag.
    pub fn name_map_for_schema(
        &self,
        schema: &Schema,
    ) -> Result<HashMap<String, String>, SchemaError> {
        let names = self.name_columns();
        schema
            .columns
            .iter()
            .map(|column| match names.get(&column.tag) {
                Some(out) => Ok((column.name.clone(), out.clone())),
                None => Err(SchemaError::UnknownTag {
                    tag: column.tag,
                    name: column.name.clone(),
                }),
            })
            .collect()
    }

    /// Combines supersets. The first definition seen for a tag is kept and the
    /// name lists of every input are merged. Definitions are not compared.
    pub fn union<'a, I>(super_schemas: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a SuperSchema>,
    {
        let mut merged = Self::new();
        for super_schema in super_schemas {
            for column in super_schema.iter() {
                let incoming = super_schema.all_column_names(column.tag);
                match merged.tag_names.get_mut(&column.tag) {
                    Some(names) => {
                        for name in incoming {
                            if !names.contains(name) {
                                names.push(name.clone());
                            }
                        }
                    }
                    None => {
                        merged
                            .tag_names
                            .insert(column.tag, incoming.iter().unique().cloned().collect());
                        merged.all_cols.append(column.stripped())?;
                    }
                }
            }
        }
        Ok(merged)
    }
}

impl PartialEq for SuperSchema {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColConstraint, Kind, TypeInfo};

    fn schema(columns: Vec<Column>) -> Schema {
        Schema::from_columns(columns).expect("valid schema")
    }

    fn text(name: &str, tag: Tag) -> Column {
        Column::new(name, tag, TypeInfo::Text)
    }

    #[test]
    fn empty_superset_has_no_columns() {
        let ss = SuperSchema::new();
        assert!(ss.is_empty());
        assert_eq!(ss.len(), 0);
        assert!(ss.all_column_names(1).is_empty());
        assert!(ss.generate_schema().expect("generate").columns.is_empty());
    }

    #[test]
    fn add_column_strips_name_and_constraints() {
        let mut ss = SuperSchema::new();
        ss.add_column(&text("email", 4).with_constraint(ColConstraint::Unique))
            .expect("add");
        let stored = ss.get_column(4).expect("stored column");
        assert!(stored.name.is_empty());
        assert!(stored.constraints.is_empty());
        assert_eq!(ss.all_column_names(4), ["email".to_string()]);
    }

    #[test]
    fn add_column_is_idempotent_for_known_names() {
        let mut ss = SuperSchema::new();
        ss.add_column(&text("a", 1)).unwrap();
        ss.add_column(&text("a", 1)).unwrap();
        ss.add_column(&text("b", 1)).unwrap();
        ss.add_column(&text("a", 1)).unwrap();
        assert_eq!(ss.len(), 1);
        assert_eq!(ss.all_column_names(1), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    #[should_panic(expected = "tag collision for columns id and id, different definitions (tag: 1)")]
    fn add_column_panics_on_pk_mismatch() {
        let mut ss = SuperSchema::new();
        ss.add_column(&Column::new("id", 1, TypeInfo::Int { bits: 64 }).primary_key())
            .unwrap();
        let _ = ss.add_column(&Column::new("id", 1, TypeInfo::Int { bits: 64 }));
    }

    #[test]
    #[should_panic(expected = "tag collision")]
    fn add_column_panics_on_kind_mismatch() {
        let mut ss = SuperSchema::new();
        ss.add_column(&text("note", 2)).unwrap();
        let _ = ss.add_column(&text("note", 2).with_kind(Kind::Blob));
    }

    #[test]
    #[should_panic(expected = "tag collision for columns price and cost")]
    fn add_column_panics_on_type_mismatch() {
        let mut ss = SuperSchema::new();
        ss.add_column(&Column::new("price", 3, TypeInfo::Float { bits: 64 }))
            .unwrap();
        let _ = ss.add_column(&Column::new("cost", 3, TypeInfo::Float { bits: 32 }));
    }

    #[test]
    fn name_columns_suffixes_shared_candidates() {
        let mut ss = SuperSchema::new();
        ss.add_column(&text("x", 7)).unwrap();
        ss.add_column(&text("y", 6)).unwrap();
        ss.add_column(&text("x", 5)).unwrap();
        let names = ss.name_columns();
        assert_eq!(names[&7], "x_7");
        assert_eq!(names[&5], "x_5");
        assert_eq!(names[&6], "y");

        let generated = ss.generate_schema().expect("generate");
        assert_eq!(generated.column_names(), vec!["x_7", "y", "x_5"]);
    }

    #[test]
    fn name_columns_suffixes_literal_holder_of_a_generated_name() {
        let mut ss = SuperSchema::new();
        ss.add_column(&text("x", 5)).unwrap();
        ss.add_column(&text("x_5", 9)).unwrap();
        ss.add_column(&text("x", 7)).unwrap();
        let names = ss.name_columns();
        assert_eq!(names[&5], "x_5");
        assert_eq!(names[&7], "x_7");
        assert_eq!(names[&9], "x_5_9");

        let generated = ss.generate_schema().expect("generate");
        assert_eq!(generated.column_names(), vec!["x_5", "x_5_9", "x_7"]);
        assert!(generated.validate_names().is_ok());
    }

    #[test]
    fn name_columns_resolves_chained_literal_suffixes() {
        let mut ss = SuperSchema::new();
        for (name, tag) in [("x", 5), ("x", 7), ("x_5", 9), ("x_5_9", 12)] {
            ss.add_column(&text(name, tag)).unwrap();
        }
        let names = ss.name_columns();
        assert_eq!(names[&9], "x_5_9");
        assert_eq!(names[&12], "x_5_9_12");
        let distinct: HashSet<&String> = names.values().collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn name_columns_uses_first_recorded_name() {
        let mut ss = SuperSchema::new();
        ss.add_column(&text("first", 1)).unwrap();
        ss.add_column(&text("second", 1)).unwrap();
        assert_eq!(ss.name_columns()[&1], "first");
    }

    #[test]
    fn name_map_reports_unknown_tags() {
        let ss = SuperSchema::from_schemas([&schema(vec![text("a", 1)])]).unwrap();
        let err = ss
            .name_map_for_schema(&schema(vec![text("a", 1), text("z", 26)]))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownTag {
                tag: 26,
                name: "z".to_string()
            }
        );
        assert!(err.to_string().contains("failed to map columns"));
    }

    #[test]
    fn equality_ignores_name_order() {
        let mut left = SuperSchema::new();
        left.add_column(&text("a", 1)).unwrap();
        left.add_column(&text("b", 1)).unwrap();
        let mut right = SuperSchema::new();
        right.add_column(&text("b", 1)).unwrap();
        right.add_column(&text("a", 1)).unwrap();
        assert_eq!(left, right);

        right.add_column(&text("c", 1)).unwrap();
        assert_ne!(left, right);
    }

    #[test]
    fn equality_detects_column_differences() {
        let left = SuperSchema::from_schemas([&schema(vec![text("a", 1)])]).unwrap();
        let right =
            SuperSchema::from_schemas([&schema(vec![Column::new("a", 1, TypeInfo::Bool)])]).unwrap();
        assert!(!left.equals(&right));
        let other_tag = SuperSchema::from_schemas([&schema(vec![text("a", 2)])]).unwrap();
        assert!(!left.equals(&other_tag));
    }

    #[test]
    fn superset_check_requires_recorded_name() {
        let v1 = schema(vec![text("a", 1), text("b", 2)]);
        let ss = SuperSchema::from_schemas([&v1]).unwrap();
        assert!(ss.is_superset_of_schema(&v1));
        assert!(!ss.is_superset_of_schema(&schema(vec![text("renamed", 1)])));
        assert!(!ss.is_superset_of_schema(&schema(vec![text("c", 3)])));
        assert!(!ss.is_superset_of_schema(&schema(vec![text("a", 1).primary_key()])));
        assert!(ss.is_superset_of_schema(&schema(Vec::new())));
    }

    #[test]
    fn union_merges_name_lists_and_keeps_first_definition() {
        let a = SuperSchema::from_schemas([&schema(vec![text("id", 1), text("only_a", 2)])])
            .unwrap();
        let b = SuperSchema::from_schemas([&schema(vec![text("pk", 1), text("only_b", 3)])])
            .unwrap();
        let merged = SuperSchema::union([&a, &b]).expect("union");
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.all_column_names(1), ["id".to_string(), "pk".to_string()]);
        assert_eq!(merged.get_column(2), a.get_column(2));
        assert_eq!(merged.tags().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn union_does_not_revalidate_definitions() {
        let a = SuperSchema::from_schemas([&schema(vec![text("v", 1)])]).unwrap();
        let b = SuperSchema::from_schemas([&schema(vec![Column::new("w", 1, TypeInfo::Bool)])])
            .unwrap();
        let merged = SuperSchema::union([&a, &b]).expect("union");
        assert_eq!(merged.get_column(1).map(|c| c.type_info), Some(TypeInfo::Text));
        assert_eq!(merged.all_column_names(1), ["v".to_string(), "w".to_string()]);
    }

    #[test]
    fn union_of_nothing_is_empty() {
        let merged = SuperSchema::union(std::iter::empty()).expect("union");
        assert!(merged.is_empty());
    }

    #[test]
    fn try_from_parts_rejects_mismatched_tags() {
        let cols = ColCollection::try_from_columns(vec![text("", 1).stripped()]).unwrap();
        let err = SuperSchema::try_from_parts(cols.clone(), HashMap::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InconsistentParts(_)));

        let mut names = HashMap::new();
        names.insert(1, vec!["a".to_string()]);
        names.insert(9, vec!["ghost".to_string()]);
        let err = SuperSchema::try_from_parts(cols.clone(), names).unwrap_err();
        assert!(err.to_string().contains("tag 9"));

        let mut names = HashMap::new();
        names.insert(1, vec!["a".to_string()]);
        let ss = SuperSchema::try_from_parts(cols, names).expect("consistent parts");
        assert_eq!(ss.all_column_names(1), ["a".to_string()]);
    }

    #[test]
    fn from_schemas_returns_nothing_when_ingestion_aborts() {
        let v1 = schema(vec![text("a", 1), text("b", 2)]);
        let retyped = schema(vec![Column::new("a", 1, TypeInfo::Bool)]);
        let outcome = std::panic::catch_unwind(|| SuperSchema::from_schemas([&v1, &retyped]));
        assert!(outcome.is_err());
    }

    #[test]
    fn add_schemas_into_seeded_superset_surfaces_duplicate_tag() {
        let mut cols = ColCollection::new();
        cols.append(text("", 2)).unwrap();
        let mut ss = SuperSchema::from_parts(cols, HashMap::new());
        let err = ss
            .add_schemas([&schema(vec![text("a", 1), text("b", 2), text("c", 3)])])
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateTag { tag: 2 });
        assert_eq!(ss.all_column_names(1), ["a".to_string()]);
        assert!(ss.get_column(3).is_none());
    }

    #[test]
    fn try_from_parts_rejects_named_columns() {
        let mut names = HashMap::new();
        names.insert(1, vec!["a".to_string()]);

        let named = ColCollection::try_from_columns(vec![text("a", 1)]).unwrap();
        let err = SuperSchema::try_from_parts(named, names.clone()).unwrap_err();
        assert!(err.to_string().contains("carries a name or constraints"));

        let constrained = ColCollection::try_from_columns(vec![
            text("", 1).with_constraint(ColConstraint::NotNull),
        ])
        .unwrap();
        let err = SuperSchema::try_from_parts(constrained, names).unwrap_err();
        assert!(matches!(err, SchemaError::InconsistentParts(_)));
    }

    #[test]
    fn parts_round_trip_through_from_parts() {
        let ss = SuperSchema::from_schemas([
            &schema(vec![text("a", 1)]),
            &schema(vec![text("b", 1), text("c", 2)]),
        ])
        .unwrap();
        let (cols, names) = ss.clone().into_parts();
        let rebuilt = SuperSchema::from_parts(cols, names);
        assert_eq!(rebuilt, ss);
        let (cols, names) = rebuilt.parts();
        assert_eq!(cols.len(), 2);
        assert_eq!(names.len(), 2);
    }
}
