//! Threshold-based outlier detection.
//!
//! A row is an outlier when any rule's column value falls outside the rule's
//! inclusive `[min, max]` bounds. Missing values never flag a row.

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::frame::{FrameError, Table};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlierRule {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl OutlierRule {
    pub fn at_most(column: impl Into<String>, max: f64) -> Self {
        Self {
            column: column.into(),
            min: None,
            max: Some(max),
        }
    }

    fn violated_by(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max)
    }
}

/// `true` for rows inside every rule's bounds.
pub fn inlier_mask(table: &Table, rules: &[OutlierRule]) -> Result<Vec<bool>> {
    let mut mask = vec![true; table.row_count()];
    for rule in rules {
        let column = table.column(&rule.column)?;
        if !column.kind.is_numeric() {
            return Err(FrameError::KindMismatch {
                name: rule.column.clone(),
                expected: "numeric",
                actual: column.kind,
            }
            .into());
        }
        for (keep, value) in mask.iter_mut().zip(&column.values) {
            if let Some(number) = value.as_ref().and_then(|v| v.as_f64())
                && rule.violated_by(number)
            {
                *keep = false;
            }
        }
    }
    Ok(mask)
}

/// Returns the table without outlier rows and the number of rows removed.
pub fn split_outliers(table: &Table, rules: &[OutlierRule]) -> Result<(Table, usize)> {
    let mask = inlier_mask(table, rules)?;
    let flagged = mask.iter().filter(|keep| !**keep).count();
    let kept = table.filter_rows(&mask)?;
    info!(
        "Flagged {flagged} outlier row(s); {} row(s) remain",
        kept.row_count()
    );
    Ok((kept, flagged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Value, frame::Column, schema::ColumnType};

    fn listings() -> Table {
        Table::from_columns(vec![
            Column::new(
                "price",
                ColumnType::Float,
                vec![
                    Some(Value::Float(85.0)),
                    Some(Value::Float(4000.0)),
                    None,
                    Some(Value::Float(150.0)),
                ],
            ),
            Column::new(
                "minimum_nights",
                ColumnType::Integer,
                vec![
                    Some(Value::Integer(1)),
                    Some(Value::Integer(2)),
                    Some(Value::Integer(1000)),
                    Some(Value::Integer(0)),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn split_removes_rows_outside_bounds() {
        let rules = vec![
            OutlierRule::at_most("price", 1000.0),
            OutlierRule {
                column: "minimum_nights".into(),
                min: Some(1.0),
                max: Some(365.0),
            },
        ];
        let (kept, flagged) = split_outliers(&listings(), &rules).unwrap();
        assert_eq!(flagged, 3);
        assert_eq!(kept.row_count(), 1);
        assert_eq!(kept.row_display(0), vec!["85", "1"]);
    }

    #[test]
    fn missing_values_are_not_outliers() {
        let mask = inlier_mask(&listings(), &[OutlierRule::at_most("price", 100.0)]).unwrap();
        assert_eq!(mask, vec![true, false, true, false]);
    }

    #[test]
    fn rejects_text_columns() {
        let table =
            Table::from_columns(vec![Column::from_strings("city", [Some("Boston")])]).unwrap();
        assert!(inlier_mask(&table, &[OutlierRule::at_most("city", 1.0)]).is_err());
    }
}
