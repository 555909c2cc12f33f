//! Column kinds and kind inference.
//!
//! [`ColumnType`] is the declared kind of a [`crate::frame::Column`]. Inference
//! walks every non-missing cell of a column and keeps the narrowest kind that
//! still parses all of them, falling back to [`ColumnType::String`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{parse_boolean, parse_naive_date};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Kinds whose missing cells are filled with the most frequent value.
    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Boolean)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks which kinds remain plausible for one column while values stream in.
#[derive(Debug, Clone)]
pub(crate) struct TypeCandidate {
    integer: bool,
    float: bool,
    boolean: bool,
    date: bool,
    seen: usize,
}

impl TypeCandidate {
    pub(crate) fn new() -> Self {
        Self {
            integer: true,
            float: true,
            boolean: true,
            date: true,
            seen: 0,
        }
    }

    pub(crate) fn update(&mut self, value: &str) {
        self.seen += 1;
        if self.integer && value.parse::<i64>().is_err() {
            self.integer = false;
        }
        if self.float && value.parse::<f64>().is_err() {
            self.float = false;
        }
        if self.boolean && parse_boolean(value).is_err() {
            self.boolean = false;
        }
        if self.date && parse_naive_date(value).is_err() {
            self.date = false;
        }
    }

    pub(crate) fn decide(&self) -> ColumnType {
        if self.seen == 0 {
            ColumnType::String
        } else if self.integer {
            ColumnType::Integer
        } else if self.float {
            ColumnType::Float
        } else if self.boolean {
            ColumnType::Boolean
        } else if self.date {
            ColumnType::Date
        } else {
            ColumnType::String
        }
    }
}

/// Infers a kind from raw cells; `None` cells do not vote.
pub fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut candidate = TypeCandidate::new();
    for value in values.into_iter().flatten() {
        candidate.update(value);
    }
    candidate.decide()
}
