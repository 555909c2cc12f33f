//! Categorical column explosion.
//!
//! Turns a multi-valued text column such as `{TV,"Wireless Internet",Kitchen}`
//! into one boolean indicator column per distinct token:
//!
//! 1. every cell is normalized by an ordered list of [`TextRule`]s into a clean
//!    comma-delimited string,
//! 2. the normalized cells are split and unioned into a vocabulary in
//!    first-seen order,
//! 3. for each token a `prefix + token` column records whether the row matches
//!    it under the chosen [`MatchPolicy`].
//!
//! The default [`MatchPolicy::Substring`] tests containment in the row's
//! normalized text, so a row holding only `HDTV` also lights up `amenity_TV`.
//! [`MatchPolicy::ExactToken`] is the stricter opt-in alternative.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    frame::{Column, FrameError, Table},
    schema::ColumnType,
    transform::string_ops::{
        collapse_runs, prefix_standalone, regex_replace, strip_chars, trim_tokens,
    },
};

pub const TOKEN_DELIMITER: char = ',';

const AMENITY_UNTRANSLATED: &str = r"translation_missing:_en\.hosting_amenity_x?\d+";

/// One normalization step, as written in the pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TextRule {
    Strip {
        chars: String,
    },
    Join {
        #[serde(default = "default_join_extra")]
        extra: String,
        #[serde(default = "default_joiner")]
        with: char,
    },
    TrimTokens {
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },
    PrefixNumber {
        number: String,
        prefix: String,
    },
    Replace {
        pattern: String,
        with: String,
    },
}

fn default_join_extra() -> String {
    "/".to_string()
}

fn default_joiner() -> char {
    '_'
}

fn default_delimiter() -> char {
    TOKEN_DELIMITER
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "kebab-case")]
pub enum RulePreset {
    Amenities,
    HostVerifications,
}

impl RulePreset {
    pub fn rules(self) -> Vec<TextRule> {
        match self {
            RulePreset::Amenities => vec![
                TextRule::Strip {
                    chars: "{}\"()'[]".to_string(),
                },
                TextRule::Join {
                    extra: default_join_extra(),
                    with: default_joiner(),
                },
                TextRule::PrefixNumber {
                    number: "24".to_string(),
                    prefix: "x".to_string(),
                },
                TextRule::Replace {
                    pattern: AMENITY_UNTRANSLATED.to_string(),
                    with: "other".to_string(),
                },
            ],
            RulePreset::HostVerifications => vec![
                TextRule::Strip {
                    chars: "[]'\"{}()".to_string(),
                },
                TextRule::TrimTokens {
                    delimiter: TOKEN_DELIMITER,
                },
                TextRule::Join {
                    extra: default_join_extra(),
                    with: default_joiner(),
                },
            ],
        }
    }

    pub fn default_prefix(self) -> &'static str {
        match self {
            RulePreset::Amenities => "amenity_",
            RulePreset::HostVerifications => "host_verification_",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    Substring,
    ExactToken,
}

#[derive(Debug)]
enum CompiledRule {
    Strip(Vec<char>),
    Join { extra: Vec<char>, with: char },
    TrimTokens(char),
    PrefixNumber { number: String, prefix: String },
    Replace { regex: Regex, with: String },
}

/// Compiled, ordered normalization pipeline for one column.
#[derive(Debug, Default)]
pub struct NormalizationRules {
    steps: Vec<CompiledRule>,
}

impl NormalizationRules {
    pub fn compile(rules: &[TextRule]) -> Result<Self> {
        let steps = rules
            .iter()
            .map(|rule| {
                Ok(match rule {
                    TextRule::Strip { chars } => CompiledRule::Strip(chars.chars().collect()),
                    TextRule::Join { extra, with } => CompiledRule::Join {
                        extra: extra.chars().collect(),
                        with: *with,
                    },
                    TextRule::TrimTokens { delimiter } => CompiledRule::TrimTokens(*delimiter),
                    TextRule::PrefixNumber { number, prefix } => CompiledRule::PrefixNumber {
                        number: number.clone(),
                        prefix: prefix.clone(),
                    },
                    TextRule::Replace { pattern, with } => CompiledRule::Replace {
                        regex: Regex::new(pattern)
                            .with_context(|| format!("Compiling pattern '{pattern}'"))?,
                        with: with.clone(),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn preset(preset: RulePreset) -> Result<Self> {
        Self::compile(&preset.rules())
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for step in &self.steps {
            let next = match step {
                CompiledRule::Strip(chars) => strip_chars(&text, chars).into_owned(),
                CompiledRule::Join { extra, with } => collapse_runs(&text, extra, *with).into_owned(),
                CompiledRule::TrimTokens(delimiter) => trim_tokens(&text, *delimiter).into_owned(),
                CompiledRule::PrefixNumber { number, prefix } => {
                    prefix_standalone(&text, number, prefix).into_owned()
                }
                CompiledRule::Replace { regex, with } => {
                    regex_replace(&text, regex, with).into_owned()
                }
            };
            text = next;
        }
        text
    }
}

/// How one multi-valued column is exploded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExplodeSpec {
    pub column: String,
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<RulePreset>,
    /// Explicit rules; when present they take precedence over `preset`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<TextRule>,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

impl ExplodeSpec {
    pub fn for_preset(column: impl Into<String>, preset: RulePreset) -> Self {
        Self {
            column: column.into(),
            prefix: preset.default_prefix().to_string(),
            preset: Some(preset),
            rules: Vec::new(),
            match_policy: MatchPolicy::default(),
        }
    }

    pub fn normalization(&self) -> Result<NormalizationRules> {
        if !self.rules.is_empty() {
            NormalizationRules::compile(&self.rules)
        } else if let Some(preset) = self.preset {
            NormalizationRules::preset(preset)
        } else {
            Ok(NormalizationRules::default())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExplodeOutcome {
    pub column: String,
    pub vocabulary: Vec<String>,
    pub indicator_columns: Vec<String>,
    pub replaced_columns: usize,
}

pub fn normalize_column(column: &Column, rules: &NormalizationRules) -> Vec<String> {
    column
        .values
        .iter()
        .map(|value| match value {
            Some(Value::String(text)) => rules.normalize(text),
            Some(other) => rules.normalize(&other.as_display()),
            None => String::new(),
        })
        .collect()
}

/// Distinct non-empty tokens across all rows, in first-seen order.
pub fn extract_vocabulary(normalized: &[String], delimiter: char) -> Vec<String> {
    normalized
        .iter()
        .flat_map(|row| row.split(delimiter))
        .filter(|token| !token.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

/// Adds one boolean column per token and returns the generated names.
///
/// A generated name may only reuse an existing Boolean column, which is
/// replaced in place; this is what re-exploding the same source produces.
/// Colliding with `source` itself or with any non-Boolean column is a
/// [`FrameError::DuplicateColumn`], checked before the table is touched.
pub fn materialize_indicators(
    table: &mut Table,
    source: &str,
    normalized: &[String],
    vocabulary: &[String],
    prefix: &str,
    policy: MatchPolicy,
) -> Result<(Vec<String>, usize)> {
    let names: Vec<String> = vocabulary
        .iter()
        .map(|token| format!("{prefix}{token}"))
        .collect();
    for name in &names {
        let clashes = name == source
            || table
                .column(name)
                .is_ok_and(|existing| existing.kind != ColumnType::Boolean);
        if clashes {
            return Err(FrameError::DuplicateColumn(name.clone()).into());
        }
    }

    let token_sets: Vec<Vec<&str>> = match policy {
        MatchPolicy::Substring => Vec::new(),
        MatchPolicy::ExactToken => normalized
            .iter()
            .map(|row| row.split(TOKEN_DELIMITER).collect())
            .collect(),
    };
    let mut replaced = 0usize;
    for (token, name) in vocabulary.iter().zip(&names) {
        let flags: Vec<bool> = match policy {
            MatchPolicy::Substring => normalized
                .iter()
                .map(|row| row.contains(token.as_str()))
                .collect(),
            MatchPolicy::ExactToken => token_sets
                .iter()
                .map(|tokens| tokens.contains(&token.as_str()))
                .collect(),
        };
        if table.upsert_column(Column::from_bools(name.clone(), flags))? {
            warn!("Indicator column '{name}' already existed and was replaced");
            replaced += 1;
        }
    }
    Ok((names, replaced))
}

/// Normalizes `spec.column` in place and appends its indicator columns.
///
/// On error the table is left as it was.
pub fn explode(table: &mut Table, spec: &ExplodeSpec) -> Result<ExplodeOutcome> {
    let rules = spec
        .normalization()
        .with_context(|| format!("Building normalization rules for '{}'", spec.column))?;
    let normalized = normalize_column(table.column(&spec.column)?, &rules);

    let vocabulary = extract_vocabulary(&normalized, TOKEN_DELIMITER);
    debug!(
        "Vocabulary for '{}': {}",
        spec.column,
        vocabulary.iter().join(", ")
    );
    let (indicator_columns, replaced_columns) = materialize_indicators(
        table,
        &spec.column,
        &normalized,
        &vocabulary,
        &spec.prefix,
        spec.match_policy,
    )
    .with_context(|| format!("Materializing indicators for '{}'", spec.column))?;

    let source = table.column_mut(&spec.column)?;
    source.kind = ColumnType::String;
    source.values = normalized
        .into_iter()
        .map(|text| (!text.is_empty()).then_some(Value::String(text)))
        .collect();

    info!(
        "Exploded '{}' into {} indicator column(s) with prefix '{}'",
        spec.column,
        indicator_columns.len(),
        spec.prefix
    );
    Ok(ExplodeOutcome {
        column: spec.column.clone(),
        vocabulary,
        indicator_columns,
        replaced_columns,
    })
}
