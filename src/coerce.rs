//! Explicit column kind converters.
//!
//! Every conversion renders the current cell as text and re-parses it with a
//! fixed parser. Cells that fail to parse become missing instead of aborting
//! the run.

use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Value, parse_boolean, parse_currency, parse_naive_date, parse_percent},
    frame::Table,
    schema::ColumnType,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    Currency,
    Percent,
    Boolean,
    Date,
    Float,
    Integer,
}

impl Coercion {
    pub fn target(self) -> ColumnType {
        match self {
            Coercion::Currency | Coercion::Percent | Coercion::Float => ColumnType::Float,
            Coercion::Integer => ColumnType::Integer,
            Coercion::Boolean => ColumnType::Boolean,
            Coercion::Date => ColumnType::Date,
        }
    }

    fn convert(self, text: &str) -> Option<Value> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match self {
            Coercion::Currency => parse_currency(text).ok().map(Value::Float),
            Coercion::Percent => parse_percent(text).ok().map(Value::Float),
            Coercion::Float => text.parse::<f64>().ok().map(Value::Float),
            Coercion::Integer => text
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .map(Value::Integer),
            Coercion::Boolean => parse_boolean(text).ok().map(Value::Boolean),
            Coercion::Date => parse_naive_date(text).ok().map(Value::Date),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionSummary {
    pub converted: usize,
    pub failed: usize,
}

/// Converts `name` to the coercion's target kind in place.
pub fn coerce_column(table: &mut Table, name: &str, coercion: Coercion) -> Result<CoercionSummary> {
    let column = table.column_mut(name)?;
    let mut summary = CoercionSummary::default();
    let values: Vec<Option<Value>> = column
        .values
        .iter()
        .map(|value| {
            let Some(value) = value else {
                return None;
            };
            let converted = coercion.convert(&value.as_display());
            match converted {
                Some(_) => summary.converted += 1,
                None => summary.failed += 1,
            }
            converted
        })
        .collect();
    column.values = values;
    column.kind = coercion.target();
    if summary.failed > 0 {
        debug!(
            "Column '{name}': {} value(s) could not be read as {:?} and are now missing",
            summary.failed, coercion
        );
    }
    info!(
        "Coerced '{name}' to {} ({} converted, {} missing after failure)",
        column.kind, summary.converted, summary.failed
    );
    Ok(summary)
}
