//! Missing value imputation.
//!
//! Numeric columns take the column median, string and boolean columns take the
//! most frequent value. Date columns and columns without any observed value are
//! left untouched.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    frame::{Column, Table},
    schema::ColumnType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Median,
    MostFrequent,
}

impl ImputeStrategy {
    pub fn for_kind(kind: ColumnType) -> Option<Self> {
        if kind.is_numeric() {
            Some(ImputeStrategy::Median)
        } else if kind.is_categorical() {
            Some(ImputeStrategy::MostFrequent)
        } else {
            None
        }
    }
}

/// Median of the observed values; `None` when nothing was observed.
pub fn median(values: &[Option<Value>]) -> Option<f64> {
    let mut observed: Vec<f64> = values
        .iter()
        .filter_map(|v| v.as_ref().and_then(Value::as_f64))
        .filter(|f| !f.is_nan())
        .collect();
    if observed.is_empty() {
        return None;
    }
    observed.sort_by(f64::total_cmp);
    let mid = observed.len() / 2;
    if observed.len() % 2 == 0 {
        Some((observed[mid - 1] + observed[mid]) / 2.0)
    } else {
        Some(observed[mid])
    }
}

/// Most frequent observed value; ties go to the value seen first.
pub fn mode(values: &[Option<Value>]) -> Option<Value> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut firsts: Vec<&Value> = Vec::new();
    for value in values.iter().flatten() {
        let key = value.as_display();
        let next_order = firsts.len();
        let entry = counts.entry(key).or_insert_with(|| (0, next_order));
        if entry.1 == next_order {
            firsts.push(value);
        }
        entry.0 += 1;
    }
    counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, order)| firsts[order].clone())
}

fn fill_value(column: &Column, strategy: ImputeStrategy) -> Option<Value> {
    match strategy {
        ImputeStrategy::Median => {
            let median = median(&column.values)?;
            Some(match column.kind {
                ColumnType::Integer => Value::Integer(median.round() as i64),
                _ => Value::Float(median),
            })
        }
        ImputeStrategy::MostFrequent => mode(&column.values),
    }
}

/// Fills missing cells of every eligible column not named in `skip`.
///
/// Returns the number of filled cells per column, keyed by column name.
pub fn impute_missing(table: &mut Table, skip: &HashSet<String>) -> Result<BTreeMap<String, usize>> {
    let mut filled = BTreeMap::new();
    let names: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| !skip.contains(*name))
        .map(str::to_string)
        .collect();
    for name in names {
        let column = table.column_mut(&name)?;
        let missing = column.missing_count();
        if missing == 0 {
            continue;
        }
        let Some(strategy) = ImputeStrategy::for_kind(column.kind) else {
            debug!("Skipping imputation for '{name}' ({} column)", column.kind);
            continue;
        };
        let Some(fill) = fill_value(column, strategy) else {
            debug!("Column '{name}' has no observed values to impute from");
            continue;
        };
        for value in column.values.iter_mut().filter(|v| v.is_none()) {
            *value = Some(fill.clone());
        }
        debug!("Imputed {missing} value(s) in '{name}' with {strategy:?} = {fill}");
        filled.insert(name, missing);
    }
    info!(
        "Imputed {} missing value(s) across {} column(s)",
        filled.values().sum::<usize>(),
        filled.len()
    );
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[Option<i64>]) -> Vec<Option<Value>> {
        values.iter().map(|v| v.map(Value::Integer)).collect()
    }

    #[test]
    fn median_averages_middle_pair() {
        assert_eq!(median(&ints(&[Some(1), None, Some(4), Some(2), Some(3)])), Some(2.5));
        assert_eq!(median(&ints(&[Some(7), Some(1), Some(3)])), Some(3.0));
        assert_eq!(median(&ints(&[None])), None);
    }

    #[test]
    fn mode_breaks_ties_by_first_seen() {
        let values = vec![
            Some(Value::String("Real Bed".into())),
            Some(Value::String("Futon".into())),
            None,
            Some(Value::String("Futon".into())),
            Some(Value::String("Real Bed".into())),
        ];
        assert_eq!(mode(&values), Some(Value::String("Real Bed".into())));
    }

    #[test]
    fn impute_fills_by_kind_and_respects_skip() {
        let mut table = Table::from_columns(vec![
            Column::new("bathrooms", ColumnType::Integer, ints(&[Some(1), Some(2), None, Some(2)])),
            Column::from_strings("bed_type", [Some("Real Bed"), None, Some("Real Bed"), Some("Futon")]),
            Column::from_strings("amenities", [None, Some("TV"), None, None]),
            Column::new("host_since", ColumnType::Date, vec![None, None, None, None]),
        ])
        .unwrap();
        let skip = HashSet::from(["amenities".to_string()]);
        let filled = impute_missing(&mut table, &skip).unwrap();

        assert_eq!(filled.get("bathrooms"), Some(&1));
        assert_eq!(filled.get("bed_type"), Some(&1));
        assert!(!filled.contains_key("amenities"));
        assert!(!filled.contains_key("host_since"));
        assert_eq!(
            table.column("bathrooms").unwrap().values[2],
            Some(Value::Integer(2))
        );
        assert_eq!(
            table.column("bed_type").unwrap().values[1],
            Some(Value::String("Real Bed".into()))
        );
        assert_eq!(table.column("amenities").unwrap().missing_count(), 3);
    }
}
