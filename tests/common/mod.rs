#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use listing_prep::frame::{Column, Table};
use tempfile::{TempDir, tempdir};

pub const LISTINGS: &str = "listings_sample.csv";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Single-column table holding raw multi-valued cells.
pub fn text_table(column: &str, cells: &[Option<&str>]) -> Table {
    Table::from_columns(vec![Column::from_strings(column, cells.iter().copied())])
        .expect("build table")
}

/// Boolean cells of `column`, panicking on anything else.
pub fn flags(table: &Table, column: &str) -> Vec<bool> {
    table
        .column(column)
        .expect("indicator column")
        .values
        .iter()
        .map(|value| match value {
            Some(listing_prep::data::Value::Boolean(b)) => *b,
            other => panic!("expected boolean in '{column}', got {other:?}"),
        })
        .collect()
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes raw bytes, for inputs that are not UTF-8.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("write temp file bytes");
        path
    }
}
