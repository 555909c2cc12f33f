use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::frame::Table;

pub const SNAPSHOT_VERSION: u32 = 1;

/// A labelled table persisted with bincode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    version: u32,
    label: String,
    table: Table,
}

impl Snapshot {
    pub fn new(label: impl Into<String>, table: Table) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            label: label.into(),
            table,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating snapshot file {path:?}"))?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .with_context(|| format!("Writing snapshot {path:?}"))?;
        writer
            .flush()
            .with_context(|| format!("Flushing snapshot {path:?}"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening snapshot file {path:?}"))?;
        let mut reader = BufReader::new(file);
        let snapshot: Snapshot =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .with_context(|| format!("Reading snapshot {path:?}"))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(anyhow!(
                "Unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            ));
        }
        Ok(snapshot)
    }
}
