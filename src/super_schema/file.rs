//! YAML persistence for superset schemas.
//!
//! The file holds the stripped columns in superset order and, separately, the
//! names recorded for each tag. Tags are written in ascending order; each name
//! list keeps the order the names were first recorded in.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::SuperSchema;
use crate::schema::{CURRENT_SCHEMA_VERSION, ColCollection, Tag};

#[derive(Debug, Serialize, Deserialize)]
struct SuperSchemaFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_version: Option<String>,
    columns: ColCollection,
    #[serde(default)]
    tag_names: BTreeMap<Tag, Vec<String>>,
}

impl SuperSchema {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening superset file {path:?}"))?;
        let reader = BufReader::new(file);
        let stored: SuperSchemaFile =
            serde_yaml::from_reader(reader).context("Parsing superset YAML")?;
        SuperSchema::try_from_parts(stored.columns, stored.tag_names.into_iter().collect())
            .with_context(|| format!("Validating superset {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating superset file {path:?}"))?;
        serde_yaml::to_writer(file, &self.to_file()).context("Writing superset YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_file()).context("Serializing superset to YAML string")
    }

    fn to_file(&self) -> SuperSchemaFile {
        let (columns, tag_names) = self.parts();
        SuperSchemaFile {
            schema_version: Some(CURRENT_SCHEMA_VERSION.to_string()),
            columns: columns.clone(),
            tag_names: tag_names
                .iter()
                .map(|(tag, names)| (*tag, names.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Schema, TypeInfo};
    use tempfile::tempdir;

    #[test]
    fn save_and_load_preserve_name_history() {
        let v1 = Schema::from_columns(vec![
            Column::new("name", 1, TypeInfo::Varchar { length: 40 }).primary_key(),
            Column::new("age", 2, TypeInfo::Int { bits: 32 }),
        ])
        .unwrap();
        let v2 = Schema::from_columns(vec![
            Column::new("full_name", 1, TypeInfo::Varchar { length: 40 }).primary_key(),
        ])
        .unwrap();
        let ss = SuperSchema::from_schemas([&v1, &v2]).unwrap();

        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("people.super.yml");
        ss.save(&path).expect("save superset");
        let loaded = SuperSchema::load(&path).expect("load superset");

        assert_eq!(loaded, ss);
        assert_eq!(
            loaded.all_column_names(1),
            ["name".to_string(), "full_name".to_string()]
        );
        assert_eq!(loaded.tags().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn yaml_omits_stripped_names() {
        let v1 = Schema::from_columns(vec![Column::new("id", 3, TypeInfo::Uuid)]).unwrap();
        let ss = SuperSchema::from_schemas([&v1]).unwrap();
        let yaml = ss.to_yaml_string().expect("yaml");
        assert!(yaml.contains("tag_names"));
        assert!(yaml.contains("type: uuid"));
        assert!(!yaml.contains("name: id"));
    }

    #[test]
    fn load_rejects_columns_without_names() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.yml");
        std::fs::write(&path, "columns:\n  - tag: 1\n    type: text\ntag_names: {}\n")
            .expect("write");
        let err = SuperSchema::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("has no recorded names"));
    }

    #[test]
    fn load_rejects_columns_that_keep_their_name() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("named.yml");
        std::fs::write(
            &path,
            "columns:\n  - name: id\n    tag: 1\n    type: text\ntag_names:\n  1: [id]\n",
        )
        .expect("write");
        let err = SuperSchema::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("carries a name or constraints"));
    }
}
