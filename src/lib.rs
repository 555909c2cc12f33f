pub mod cli;
pub mod coerce;
pub mod config;
pub mod data;
pub mod explode;
pub mod frame;
pub mod impute;
pub mod io_utils;
pub mod levels;
pub mod outlier;
pub mod pipeline;
pub mod preview;
pub mod schema;
pub mod snapshot;
pub mod table;
pub mod transform;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    config::PipelineConfig,
    explode::{ExplodeSpec, MatchPolicy},
    frame::{LoadOptions, Table},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("listing_prep", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => pipeline::execute(&args),
        Commands::Explode(args) => handle_explode(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Config => handle_config(),
    }
}

fn handle_explode(args: &cli::ExplodeArgs) -> Result<()> {
    let options =
        LoadOptions::for_input(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    info!(
        "Exploding '{}' from '{}' with delimiter '{}'",
        args.column,
        args.input.display(),
        printable_delimiter(options.delimiter)
    );
    let mut table = Table::read_csv(&args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))?;

    let mut spec = ExplodeSpec::for_preset(args.column.clone(), args.preset);
    if let Some(prefix) = &args.prefix {
        spec.prefix = prefix.clone();
    }
    if args.exact {
        spec.match_policy = MatchPolicy::ExactToken;
    }
    let outcome = explode::explode(&mut table, &spec)?;

    let output_delimiter = args
        .output_delimiter
        .or_else(|| args.output.as_deref().and_then(io_utils::delimiter_for_extension))
        .unwrap_or(options.delimiter);
    table.write_csv(args.output.as_deref(), output_delimiter)?;
    info!(
        "Wrote {} row(s) with {} new indicator column(s)",
        table.row_count(),
        outcome.indicator_columns.len()
    );
    Ok(())
}

fn handle_config() -> Result<()> {
    print!("{}", PipelineConfig::default().to_yaml_string()?);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
