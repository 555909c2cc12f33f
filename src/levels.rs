use std::collections::HashMap;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    frame::{FrameError, Table},
    schema::ColumnType,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RareLevelRule {
    pub column: String,
    pub min_count: usize,
    #[serde(default = "RareLevelRule::default_replacement")]
    pub replacement: String,
}

impl RareLevelRule {
    pub fn new(column: impl Into<String>, min_count: usize) -> Self {
        Self {
            column: column.into(),
            min_count,
            replacement: Self::default_replacement(),
        }
    }

    fn default_replacement() -> String {
        "Other".to_string()
    }
}

/// Level counts in first-seen order.
pub fn level_counts(values: &[Option<Value>]) -> Vec<(String, usize)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values.iter().flatten() {
        let level = value.as_display();
        match positions.get(&level) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(level.clone(), counts.len());
                counts.push((level, 1));
            }
        }
    }
    counts
}

/// Replaces every level seen fewer than `rule.min_count` times.
///
/// Returns the collapsed levels in first-seen order.
pub fn collapse_rare_levels(table: &mut Table, rule: &RareLevelRule) -> Result<Vec<String>> {
    let column = table.column_mut(&rule.column)?;
    if column.kind != ColumnType::String {
        return Err(FrameError::KindMismatch {
            name: rule.column.clone(),
            expected: "string",
            actual: column.kind,
        }
        .into());
    }
    let rare: Vec<String> = level_counts(&column.values)
        .into_iter()
        .filter(|(level, count)| *count < rule.min_count && *level != rule.replacement)
        .map(|(level, _)| level)
        .collect();
    if rare.is_empty() {
        return Ok(rare);
    }
    for value in column.values.iter_mut() {
        if let Some(Value::String(level)) = value
            && rare.contains(level)
        {
            *level = rule.replacement.clone();
        }
    }
    info!(
        "Collapsed {} rare level(s) of '{}' into '{}'",
        rare.len(),
        rule.column,
        rule.replacement
    );
    Ok(rare)
}
