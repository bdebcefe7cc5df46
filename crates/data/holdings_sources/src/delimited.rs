use anyhow::{Context, Result, anyhow};
use encoding_rs::WINDOWS_1252;
use holdings_pipeline::HoldingsSource;
use models::{Cell, RawTable};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::unavailable;

/// CSV export on the local filesystem.
#[derive(Debug, Clone)]
pub struct DelimitedFileSource {
    pub path: PathBuf,
    /// `None` sniffs between `;` and `,` on the header line.
    pub delimiter: Option<u8>,
}

impl DelimitedFileSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: Option<u8>) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    fn read(&self) -> Result<RawTable> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Cannot open {}", self.path.display()))?;
        let text = decode_bytes(&bytes);
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(&text));
        debug!(
            path = %self.path.display(),
            delimiter = %(delimiter as char),
            "reading delimited file"
        );
        parse_delimited(&text, delimiter)
            .with_context(|| format!("Parsing {}", self.path.display()))
    }
}

impl HoldingsSource for DelimitedFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> holdings_pipeline::Result<RawTable> {
        self.read().map_err(unavailable)
    }
}

/// UTF-8 (BOM stripped) when valid, otherwise Windows-1252.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Picks `;` or `,` by counting both on the first non-empty line.
/// Ties go to `,`.
pub fn sniff_delimiter(text: &str) -> u8 {
    let Some(line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };

    let mut semicolons = 0usize;
    let mut commas = 0usize;
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => semicolons += 1,
            ',' if !in_quotes => commas += 1,
            _ => {}
        }
    }

    if semicolons > commas { b';' } else { b',' }
}

/// Parses CSV text into a raw table. The first record with any non-empty
/// field is the header; every cell is kept as text.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", i + 1))?;

        match header {
            None => {
                if record.iter().any(|f| !f.trim().is_empty()) {
                    header = Some(record.iter().map(|f| f.trim().to_string()).collect());
                }
            }
            Some(_) => rows.push(record.iter().map(|f| Cell::text(f.trim())).collect()),
        }
    }

    let header = header.ok_or_else(|| anyhow!("No header row found"))?;
    Ok(RawTable::new(header, rows))
}
