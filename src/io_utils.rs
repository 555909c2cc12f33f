//! CSV plumbing shared by the load and write paths.
//!
//! A path of `-` stands for stdin when reading and stdout when writing.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::{ByteRecord, QuoteStyle, ReaderBuilder, WriterBuilder};
use encoding_rs::Encoding;

pub const COMMA: u8 = b',';
pub const TAB: u8 = b'\t';

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Delimiter implied by a `.csv` or `.tsv` extension.
pub fn delimiter_for_extension(path: &Path) -> Option<u8> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "tsv" => Some(TAB),
        "csv" => Some(COMMA),
        _ => None,
    }
}

/// Headered, strict-width reader over a file or stdin.
pub fn csv_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let source: Box<dyn Read> = if is_stdio(path) {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
        Box::new(BufReader::new(file))
    };
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(source))
}

/// Writer to `path`, or stdout when `path` is absent or `-`.
pub fn csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match path.filter(|p| !is_stdio(p)) {
        Some(p) => {
            let file = File::create(p).with_context(|| format!("Creating output file {p:?}"))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };
    Ok(WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(sink))
}

/// Decodes every field of `record`. Malformed byte sequences become U+FFFD;
/// the flag reports whether any replacement happened.
pub fn decode_fields(record: &ByteRecord, encoding: &'static Encoding) -> (Vec<String>, bool) {
    let mut lossy = false;
    let fields = record
        .iter()
        .map(|field| {
            let (text, _, had_errors) = encoding.decode(field);
            lossy |= had_errors;
            text.into_owned()
        })
        .collect();
    (fields, lossy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};

    #[test]
    fn extension_picks_delimiter() {
        assert_eq!(delimiter_for_extension(Path::new("listings.TSV")), Some(TAB));
        assert_eq!(delimiter_for_extension(Path::new("listings.csv")), Some(COMMA));
        assert_eq!(delimiter_for_extension(Path::new("listings.txt")), None);
        assert_eq!(delimiter_for_extension(Path::new("-")), None);
    }

    #[test]
    fn decode_fields_replaces_malformed_bytes() {
        let record = ByteRecord::from(vec![&b"Caf\xe9"[..], &b"TV"[..]]);

        let (utf8, lossy) = decode_fields(&record, UTF_8);
        assert!(lossy);
        assert_eq!(utf8, vec!["Caf\u{FFFD}".to_string(), "TV".to_string()]);

        let (latin, lossy) = decode_fields(&record, WINDOWS_1252);
        assert!(!lossy);
        assert_eq!(latin[0], "Café");
    }
}
