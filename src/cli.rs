use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::explode::RulePreset;

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean AirBnB listing exports for modeling", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full cleaning pipeline and write both snapshots plus a report
    Clean(CleanArgs),
    /// Explode one multi-valued column into boolean indicator columns
    Explode(ExplodeArgs),
    /// Preview the first few rows of a snapshot in a formatted table
    Preview(PreviewArgs),
    /// Print the default pipeline configuration as YAML
    Config,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Input listings CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Directory receiving the snapshots and the run report
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: PathBuf,
    /// Pipeline configuration YAML (defaults are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExplodeArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Multi-valued column to explode
    #[arg(short = 'c', long = "column")]
    pub column: String,
    /// Normalization rule set applied before splitting
    #[arg(long, value_enum, default_value = "amenities")]
    pub preset: RulePreset,
    /// Prefix for generated column names (defaults to the preset's prefix)
    #[arg(long)]
    pub prefix: Option<String>,
    /// Match whole tokens instead of substrings of the normalized text
    #[arg(long)]
    pub exact: bool,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Snapshot file written by `clean`
    #[arg(short = 's', long = "snapshot")]
    pub snapshot: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Restrict output to this comma-separated list of columns
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
