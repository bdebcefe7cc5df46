//! Concrete [`HoldingsSource`] implementations.
//!
//! - [`WorkbookSource`]: local xlsx/xls/ods files
//! - [`DelimitedFileSource`]: local CSV exports, `;` or `,` separated
//! - [`GoogleSheetSource`]: the CSV export of a shared Google spreadsheet
//!
//! Every failure is reported as `HoldingsError::SourceUnavailable` carrying
//! the full error chain.

use holdings_pipeline::{HoldingsError, HoldingsSource};
use models::{SourceSettings, WorksheetId};
use std::time::Duration;
use tracing::warn;

pub mod delimited;
pub mod google_sheets;
pub mod workbook;

pub use delimited::{DelimitedFileSource, decode_bytes, parse_delimited, sniff_delimiter};
pub use google_sheets::{GoogleSheetSource, export_url};
pub use workbook::WorkbookSource;

/// Builds the source described by the settings file.
pub fn source_from_settings(
    settings: &SourceSettings,
    worksheet: &WorksheetId,
) -> Box<dyn HoldingsSource> {
    match settings {
        SourceSettings::Workbook { path } => {
            Box::new(WorkbookSource::new(path.clone(), worksheet.clone()))
        }
        SourceSettings::Delimited { path, delimiter } => {
            let delimiter = delimiter.and_then(|c| {
                if c.is_ascii() {
                    Some(c as u8)
                } else {
                    warn!(delimiter = %c, "non-ASCII delimiter ignored, sniffing instead");
                    None
                }
            });
            Box::new(DelimitedFileSource::new(path.clone(), delimiter))
        }
        SourceSettings::GoogleSheet {
            spreadsheet_id,
            timeout_seconds,
        } => Box::new(GoogleSheetSource::new(
            spreadsheet_id.clone(),
            worksheet.clone(),
            Duration::from_secs(*timeout_seconds),
        )),
    }
}

pub(crate) fn unavailable(err: anyhow::Error) -> HoldingsError {
    HoldingsError::SourceUnavailable(format!("{err:#}"))
}
