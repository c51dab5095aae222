#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use superschema::schema::{Column, Schema, TypeInfo};
use tempfile::{TempDir, tempdir};

/// Scratch directory for files a test case writes and reads back.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read temp file")
    }
}

pub const PEOPLE_V1: &str = "\
columns:
  - name: name
    tag: 1
    type: varchar(64)
    primary_key: true
    constraints: [not_null]
  - name: age
    tag: 2
    type: int32
";

pub const PEOPLE_V2: &str = "\
columns:
  - name: full_name
    tag: 1
    type: varchar(64)
    primary_key: true
  - name: city
    tag: 3
    type: text
";

/// v1 = {1:"name" pk varchar, 2:"age" int}; v2 = {1:"full_name" pk varchar, 3:"city" text}.
pub fn people_versions() -> (Schema, Schema) {
    let v1 = Schema::from_columns(vec![
        Column::new("name", 1, TypeInfo::Varchar { length: 64 }).primary_key(),
        Column::new("age", 2, TypeInfo::Int { bits: 32 }),
    ])
    .expect("v1");
    let v2 = Schema::from_columns(vec![
        Column::new("full_name", 1, TypeInfo::Varchar { length: 64 }).primary_key(),
        Column::new("city", 3, TypeInfo::Text),
    ])
    .expect("v2");
    (v1, v2)
}
