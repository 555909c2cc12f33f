//! End-to-end cleaning run.
//!
//! Steps run in a fixed order over one in-memory table: coerce, impute,
//! explode, drop, collapse rare levels, split outliers. Config entries naming a
//! column the input does not carry are skipped with a warning so one config can
//! serve several listing exports.

use std::{
    collections::{BTreeMap, HashSet},
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    cli::CleanArgs,
    coerce::{Coercion, CoercionSummary, coerce_column},
    config::{DropConfig, PipelineConfig},
    explode::{ExplodeOutcome, explode},
    frame::{LoadOptions, Table},
    impute::impute_missing,
    levels::{collapse_rare_levels, level_counts},
    outlier::{OutlierRule, split_outliers},
    schema::ColumnType,
    snapshot::Snapshot,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepShape {
    pub step: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineReport {
    pub steps: Vec<StepShape>,
    pub coerced: BTreeMap<String, CoercionSummary>,
    pub imputed: BTreeMap<String, usize>,
    pub exploded: Vec<ExplodeOutcome>,
    pub dropped_columns: Vec<String>,
    pub collapsed_levels: BTreeMap<String, Vec<String>>,
    pub outlier_rows: usize,
    pub skipped: Vec<String>,
}

impl PipelineReport {
    fn record(&mut self, step: &str, table: &Table) {
        self.steps.push(StepShape {
            step: step.to_string(),
            rows: table.row_count(),
            columns: table.column_count(),
        });
    }

    fn skip(&mut self, step: &str, column: &str) {
        warn!("Skipping {step} for '{column}': column not present");
        self.skipped.push(format!("{step}:{column}"));
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub with_outliers: Table,
    pub without_outliers: Table,
    pub report: PipelineReport,
}

pub fn run_pipeline(mut table: Table, config: &PipelineConfig) -> Result<PipelineOutput> {
    let mut report = PipelineReport::default();
    report.record("load", &table);

    let coercions = [
        (&config.coerce.currency, Coercion::Currency),
        (&config.coerce.percent, Coercion::Percent),
        (&config.coerce.boolean, Coercion::Boolean),
        (&config.coerce.date, Coercion::Date),
        (&config.coerce.float, Coercion::Float),
        (&config.coerce.integer, Coercion::Integer),
    ];
    for (columns, coercion) in coercions {
        for name in columns {
            if !table.has_column(name) {
                report.skip("coerce", name);
                continue;
            }
            let summary = coerce_column(&mut table, name, coercion)
                .with_context(|| format!("Coercing '{name}'"))?;
            report.coerced.insert(name.clone(), summary);
        }
    }
    report.record("coerce", &table);

    let mut skip: HashSet<String> = config.impute.skip.iter().cloned().collect();
    skip.extend(config.explode.iter().map(|spec| spec.column.clone()));
    report.imputed = impute_missing(&mut table, &skip)?;
    report.record("impute", &table);

    for spec in &config.explode {
        if !table.has_column(&spec.column) {
            report.skip("explode", &spec.column);
            continue;
        }
        let outcome = explode(&mut table, spec)?;
        report.exploded.push(outcome);
        report.record(&format!("explode:{}", spec.column), &table);
    }

    report.dropped_columns = drop_columns(&mut table, &config.drop)?;
    report.record("drop", &table);

    for rule in &config.levels {
        if !table.has_column(&rule.column) {
            report.skip("levels", &rule.column);
            continue;
        }
        let collapsed = collapse_rare_levels(&mut table, rule)
            .with_context(|| format!("Collapsing levels of '{}'", rule.column))?;
        report.collapsed_levels.insert(rule.column.clone(), collapsed);
    }
    report.record("levels", &table);

    let rules: Vec<OutlierRule> = config
        .outliers
        .iter()
        .filter(|rule| {
            let present = table.has_column(&rule.column);
            if !present {
                report.skip("outliers", &rule.column);
            }
            present
        })
        .cloned()
        .collect();
    let (without_outliers, outlier_rows) = split_outliers(&table, &rules)?;
    report.outlier_rows = outlier_rows;
    report.record("outliers", &without_outliers);

    Ok(PipelineOutput {
        with_outliers: table,
        without_outliers,
        report,
    })
}

/// Drops configured columns, then string columns above the cardinality cap.
pub fn drop_columns(table: &mut Table, config: &DropConfig) -> Result<Vec<String>> {
    let keep: HashSet<&str> = config.keep.iter().map(String::as_str).collect();
    let mut dropped = Vec::new();
    for name in &config.columns {
        if keep.contains(name.as_str()) {
            continue;
        }
        if table.has_column(name) {
            table.drop_column(name)?;
            dropped.push(name.clone());
        } else {
            debug!("Column '{name}' listed for dropping is not present");
        }
    }
    if let Some(limit) = config.max_text_cardinality {
        let wide: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.kind == ColumnType::String && !keep.contains(c.name.as_str()))
            .filter(|c| level_counts(&c.values).len() > limit)
            .map(|c| c.name.clone())
            .collect();
        for name in wide {
            table.drop_column(&name)?;
            dropped.push(name);
        }
    }
    info!("Dropped {} column(s)", dropped.len());
    Ok(dropped)
}

pub fn execute(args: &CleanArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Loading pipeline config from {path:?}"))?,
        None => PipelineConfig::default(),
    };
    let options = LoadOptions::for_input(
        &args.input,
        args.delimiter.or(config.delimiter_byte()?),
        args.input_encoding
            .as_deref()
            .or(config.load.encoding.as_deref()),
    )?;
    info!(
        "Cleaning '{}' using delimiter '{}'",
        args.input.display(),
        crate::printable_delimiter(options.delimiter)
    );
    let table = Table::read_csv(&args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))?;
    info!(
        "Loaded {} row(s) across {} column(s)",
        table.row_count(),
        table.column_count()
    );

    let output = run_pipeline(table, &config)?;
    write_outputs(&args.output_dir, &config, &output)
}

pub fn write_outputs(dir: &Path, config: &PipelineConfig, output: &PipelineOutput) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;

    let with_path = dir.join(&config.output.with_outliers);
    Snapshot::new("with_outliers", output.with_outliers.clone()).save(&with_path)?;
    let without_path = dir.join(&config.output.without_outliers);
    Snapshot::new("without_outliers", output.without_outliers.clone()).save(&without_path)?;

    let report_path = dir.join(&config.output.report);
    let file = File::create(&report_path)
        .with_context(|| format!("Creating report file {report_path:?}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &output.report)
        .with_context(|| format!("Writing report {report_path:?}"))?;

    info!(
        "Wrote {:?} ({} rows), {:?} ({} rows) and {:?}",
        with_path,
        output.with_outliers.row_count(),
        without_path,
        output.without_outliers.row_count(),
        report_path
    );
    Ok(())
}
