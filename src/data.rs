use std::{fmt, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// Slash dates are read month first only, so one column never mixes orders.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', ','];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Numeric view used by imputation and outlier rules.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_boolean(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" => Ok(true),
        "false" | "f" | "no" | "n" => Ok(false),
        _ => bail!("Failed to parse '{value}' as boolean"),
    }
}

/// Parses money text such as `$1,200.00` or `(35.50)` through `Decimal`.
pub fn parse_currency(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        bail!("Failed to parse '{value}' as currency");
    }
    let decimal = Decimal::from_str(&cleaned)
        .with_context(|| format!("Failed to parse '{value}' as currency"))?;
    let decimal = if negative { -decimal } else { decimal };
    decimal
        .to_f64()
        .ok_or_else(|| anyhow!("Currency value '{value}' is out of range"))
}

pub fn parse_percent(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let body = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    body.parse::<f64>()
        .with_context(|| format!("Failed to parse '{value}' as percent"))
}

pub fn parse_typed_value(value: &str, ty: &ColumnType) -> Result<Option<Value>> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = match ty {
        ColumnType::String => Value::String(value.to_string()),
        ColumnType::Integer => {
            let parsed: i64 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as integer"))?;
            Value::Integer(parsed)
        }
        ColumnType::Float => {
            let parsed: f64 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as float"))?;
            Value::Float(parsed)
        }
        ColumnType::Boolean => Value::Boolean(parse_boolean(value)?),
        ColumnType::Date => Value::Date(parse_naive_date(value)?),
    };
    Ok(Some(parsed))
}
