use anyhow::{Context, Result, anyhow};
use calamine::{Data, Range, Reader, open_workbook_auto};
use holdings_pipeline::HoldingsSource;
use models::{Cell, RawTable, WorksheetId};
use std::path::PathBuf;
use tracing::debug;

use crate::unavailable;

/// Spreadsheet file (xlsx, xlsm, xls, ods) on the local filesystem.
///
/// Numeric cells are taken as already in percent units. A cell formatted as
/// a percentage in Excel stores the fraction (`1.50%` is `0.015`) and calamine
/// does not expose the format, so such a sheet reads 100 times lighter than
/// its CSV export (`"1,50%"`). Keep weights as percent numbers or as text.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    pub path: PathBuf,
    pub worksheet: WorksheetId,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>, worksheet: WorksheetId) -> Self {
        Self {
            path: path.into(),
            worksheet,
        }
    }

    fn read(&self) -> Result<RawTable> {
        let mut workbook = open_workbook_auto(&self.path)
            .with_context(|| format!("Cannot open {}", self.path.display()))?;
        let sheet_names = workbook.sheet_names();

        let sheet_name = match self.worksheet.position() {
            Some(index) => sheet_names.get(index).cloned().ok_or_else(|| {
                anyhow!(
                    "Worksheet index {} out of range ({} sheets)",
                    index,
                    sheet_names.len()
                )
            })?,
            None => {
                let wanted = self.worksheet.to_string();
                sheet_names
                    .iter()
                    .find(|n| n.trim() == wanted.trim())
                    .cloned()
                    .ok_or_else(|| {
                        anyhow!(
                            "Worksheet '{}' not found (available: {})",
                            wanted,
                            sheet_names.join(", ")
                        )
                    })?
            }
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Cannot read worksheet '{}'", sheet_name))?;
        let (h, w) = range.get_size();
        debug!(sheet = %sheet_name, rows = h, cols = w, "worksheet loaded");

        table_from_range(&range)
            .with_context(|| format!("Worksheet '{}' has no header row", sheet_name))
    }
}

impl HoldingsSource for WorkbookSource {
    fn describe(&self) -> String {
        format!("{} [{}]", self.path.display(), self.worksheet)
    }

    fn fetch(&self) -> holdings_pipeline::Result<RawTable> {
        self.read().map_err(unavailable)
    }
}

/// Numbers pass through unscaled, see [`WorkbookSource`].
pub(crate) fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::String(s) => Cell::text(s.as_str()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}

/// First row with a non-empty cell becomes the header.
pub(crate) fn table_from_range(range: &Range<Data>) -> Result<RawTable> {
    let mut rows = range.rows();

    let header_row = rows
        .by_ref()
        .find(|row| row.iter().any(|c| !cell_from_data(c).is_blank()))
        .ok_or_else(|| anyhow!("No non-empty row"))?;
    let header = header_row
        .iter()
        .map(|c| cell_from_data(c).as_text())
        .collect();

    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Ok(RawTable::new(header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdings_pipeline::{HoldingsError, parse_weight};
    use models::NumberLocale;

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Float(0.015)), Cell::Number(0.015));
        assert_eq!(cell_from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(
            cell_from_data(&Data::String(" Apple ".to_string())),
            Cell::Text(" Apple ".to_string())
        );
        assert_eq!(cell_from_data(&Data::String(String::new())), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Bool(true)), Cell::Text("true".to_string()));
    }

    #[test]
    fn test_table_from_range_finds_header() {
        let mut range = Range::new((0, 0), (3, 2));
        range.set_value((1, 0), Data::String("Security".to_string()));
        range.set_value((1, 1), Data::String("Country".to_string()));
        range.set_value((1, 2), Data::String("Weight".to_string()));
        range.set_value((2, 0), Data::String("Apple".to_string()));
        range.set_value((2, 1), Data::String("US".to_string()));
        range.set_value((2, 2), Data::Float(2.5));
        range.set_value((3, 0), Data::String("Nestle".to_string()));

        let table = table_from_range(&range).unwrap();
        assert_eq!(table.header, vec!["Security", "Country", "Weight"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], Cell::Number(2.5));
        assert_eq!(table.rows[1][2], Cell::Empty);
    }

    #[test]
    fn test_numeric_weights_are_not_rescaled() {
        let locale = NumberLocale::European;
        let percent_units = cell_from_data(&Data::Float(1.5));
        let text = cell_from_data(&Data::String("1,50%".to_string()));
        assert_eq!(parse_weight(&percent_units, locale), parse_weight(&text, locale));

        // percent-formatted cell: stored fraction, read as-is
        let fraction = cell_from_data(&Data::Float(0.015));
        assert_eq!(parse_weight(&fraction, locale), 0.015);
    }

    #[test]
    fn test_empty_range_has_no_header() {
        let range: Range<Data> = Range::new((0, 0), (1, 1));
        assert!(table_from_range(&range).is_err());
    }

    #[test]
    fn test_unreadable_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holdings.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = WorkbookSource::new(&path, WorksheetId::Index(0))
            .fetch()
            .unwrap_err();
        match err {
            HoldingsError::SourceUnavailable(msg) => assert!(msg.contains("holdings.xlsx")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
