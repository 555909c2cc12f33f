//! Columnar in-memory table.
//!
//! A [`Table`] is an ordered list of equally long [`Column`]s with unique names.
//! Every pipeline step takes the table by `&mut` and widens, narrows, or
//! rewrites it in place; nothing is streamed.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    data::{Value, parse_typed_value},
    io_utils,
    schema::{ColumnType, infer_column_type},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Column '{0}' not found")]
    UnknownColumn(String),
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),
    #[error("Column '{name}' has {actual} value(s) but the table has {expected} row(s)")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Row mask has {actual} entries but the table has {expected} row(s)")]
    MaskLength { expected: usize, actual: usize },
    #[error("Column '{name}' is {actual} but {expected} was required")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: ColumnType,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
    pub values: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn from_bools(name: impl Into<String>, flags: impl IntoIterator<Item = bool>) -> Self {
        Self::new(
            name,
            ColumnType::Boolean,
            flags.into_iter().map(|b| Some(Value::Boolean(b))).collect(),
        )
    }

    pub fn from_strings<S, I>(name: impl Into<String>, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = Option<S>>,
    {
        Self::new(
            name,
            ColumnType::String,
            values
                .into_iter()
                .map(|v| v.map(|s| Value::String(s.into())))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Cell rendered as text; missing cells become the empty string.
    pub fn display_at(&self, row: usize) -> String {
        self.values
            .get(row)
            .and_then(|v| v.as_ref())
            .map(Value::as_display)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::COMMA,
            encoding: UTF_8,
        }
    }
}

impl LoadOptions {
    /// Options for reading `path`. An explicit delimiter wins over the file
    /// extension; `encoding` is an `encoding_rs` label such as `latin1`.
    pub fn for_input(path: &Path, delimiter: Option<u8>, encoding: Option<&str>) -> Result<Self> {
        let encoding = match encoding {
            Some(label) => Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| anyhow!("Unknown encoding '{label}'"))?,
            None => UTF_8,
        };
        let delimiter = delimiter
            .or_else(|| io_utils::delimiter_for_extension(path))
            .unwrap_or(io_utils::COMMA);
        Ok(Self {
            delimiter,
            encoding,
        })
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, FrameError> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Loads a delimited file, inferring one kind per column.
    pub fn read_csv(path: &Path, options: &LoadOptions) -> Result<Self> {
        let mut reader = io_utils::csv_reader(path, options.delimiter)?;
        let header_record = reader
            .byte_headers()
            .with_context(|| format!("Reading headers from {path:?}"))?
            .clone();
        let (headers, lossy) = io_utils::decode_fields(&header_record, options.encoding);
        if lossy {
            warn!(
                "Header row of {path:?} is not valid {}; bad bytes were replaced",
                options.encoding.name()
            );
        }
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

        for (row_idx, record) in reader.byte_records().enumerate() {
            let line = row_idx + 2;
            let record = record.with_context(|| format!("Reading row {line}"))?;
            let (decoded, lossy) = io_utils::decode_fields(&record, options.encoding);
            if lossy {
                warn!(
                    "Row {line} is not valid {}; bad bytes were replaced",
                    options.encoding.name()
                );
            }
            for (idx, cell) in decoded.into_iter().enumerate() {
                let trimmed = cell.trim();
                raw[idx].push((!trimmed.is_empty()).then(|| trimmed.to_string()));
            }
        }

        let mut table = Table::new();
        for (name, cells) in headers.into_iter().zip(raw) {
            let kind = infer_column_type(cells.iter().map(|c| c.as_deref()));
            debug!("Inferred column '{name}' as {kind}");
            let values = cells
                .iter()
                .map(|cell| match cell {
                    Some(text) => parse_typed_value(text, &kind),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Parsing column '{name}'"))?;
            table.push_column(Column::new(name, kind, values))?;
        }
        Ok(table)
    }

    pub fn write_csv(&self, path: Option<&Path>, delimiter: u8) -> Result<()> {
        let mut writer = io_utils::csv_writer(path, delimiter)?;
        writer
            .write_record(self.column_names())
            .context("Writing CSV header")?;
        for row in 0..self.row_count() {
            writer
                .write_record(self.row_display(row))
                .with_context(|| format!("Writing row {}", row + 2))?;
        }
        writer.flush().context("Flushing CSV output")?;
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, FrameError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    pub fn push_column(&mut self, column: Column) -> Result<(), FrameError> {
        if self.has_column(&column.name) {
            return Err(FrameError::DuplicateColumn(column.name));
        }
        self.check_length(&column)?;
        self.columns.push(column);
        Ok(())
    }

    /// Replaces a same-named column in place, or appends. Returns `true` on replace.
    pub fn upsert_column(&mut self, column: Column) -> Result<bool, FrameError> {
        self.check_length(&column)?;
        match self.column_index(&column.name) {
            Some(idx) => {
                self.columns[idx] = column;
                Ok(true)
            }
            None => {
                self.columns.push(column);
                Ok(false)
            }
        }
    }

    pub fn drop_column(&mut self, name: &str) -> Result<Column, FrameError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))?;
        Ok(self.columns.remove(idx))
    }

    /// Copy of the table holding only rows whose mask entry is `true`.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Table, FrameError> {
        if mask.len() != self.row_count() {
            return Err(FrameError::MaskLength {
                expected: self.row_count(),
                actual: mask.len(),
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                kind: column.kind,
                values: column
                    .values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(value, _)| value.clone())
                    .collect(),
            })
            .collect();
        Ok(Table { columns })
    }

    pub fn row_display(&self, row: usize) -> Vec<String> {
        self.columns.iter().map(|c| c.display_at(row)).collect()
    }

    fn check_length(&self, column: &Column) -> Result<(), FrameError> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(FrameError::LengthMismatch {
                name: column.name.clone(),
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::from_strings("room_type", [Some("Entire home/apt"), None, Some("Private room")]),
            Column::new(
                "accommodates",
                ColumnType::Integer,
                vec![Some(Value::Integer(4)), Some(Value::Integer(2)), None],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn push_column_rejects_duplicates_and_bad_lengths() {
        let mut table = sample();
        assert_eq!(
            table.push_column(Column::from_bools("room_type", [true, false, true])),
            Err(FrameError::DuplicateColumn("room_type".into()))
        );
        assert!(matches!(
            table.push_column(Column::from_bools("flag", [true])),
            Err(FrameError::LengthMismatch { expected: 3, actual: 1, .. })
        ));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut table = sample();
        let replaced = table
            .upsert_column(Column::from_bools("room_type", [true, false, true]))
            .unwrap();
        assert!(replaced);
        assert_eq!(table.column_names(), vec!["room_type", "accommodates"]);
        assert_eq!(table.column("room_type").unwrap().kind, ColumnType::Boolean);
    }

    #[test]
    fn filter_rows_keeps_masked_rows_in_order() {
        let table = sample();
        let filtered = table.filter_rows(&[true, false, true]).unwrap();
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.row_display(1), vec!["Private room", ""]);
        assert!(table.filter_rows(&[true]).is_err());
    }

    #[test]
    fn drop_column_reports_unknown_names() {
        let mut table = sample();
        assert!(table.drop_column("accommodates").is_ok());
        assert_eq!(
            table.drop_column("accommodates"),
            Err(FrameError::UnknownColumn("accommodates".into()))
        );
    }

    #[test]
    fn load_options_resolve_delimiter_and_encoding() {
        let tsv = LoadOptions::for_input(Path::new("listings.tsv"), None, None).unwrap();
        assert_eq!(tsv.delimiter, b'\t');
        assert_eq!(tsv.encoding, UTF_8);

        let forced = LoadOptions::for_input(Path::new("listings.tsv"), Some(b';'), Some("latin1"))
            .unwrap();
        assert_eq!(forced.delimiter, b';');
        assert_eq!(forced.encoding.name(), "windows-1252");

        assert_eq!(LoadOptions::for_input(Path::new("-"), None, None).unwrap().delimiter, b',');
        assert!(LoadOptions::for_input(Path::new("a.csv"), None, Some("klingon")).is_err());
    }

    #[test]
    fn read_csv_keeps_rows_with_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        std::fs::write(&path, b"id,name\n1,Caf\xe9 loft\n2,Studio\n").unwrap();

        let table = Table::read_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("name").unwrap().values[0],
            Some(Value::String("Caf\u{FFFD} loft".into()))
        );
    }
}
