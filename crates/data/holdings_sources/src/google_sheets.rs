use anyhow::{Context, Result, anyhow};
use holdings_pipeline::HoldingsSource;
use models::{RawTable, WorksheetId};
use reqwest::Url;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::delimited::{decode_bytes, parse_delimited};
use crate::unavailable;

const SPREADSHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d/";

/// Shared Google spreadsheet, read through its CSV export endpoint.
///
/// The sheet must be readable by link; no OAuth flow is performed.
#[derive(Debug, Clone)]
pub struct GoogleSheetSource {
    pub spreadsheet_id: String,
    pub worksheet: WorksheetId,
    pub timeout: Duration,
}

impl GoogleSheetSource {
    pub fn new(spreadsheet_id: impl Into<String>, worksheet: WorksheetId, timeout: Duration) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet,
            timeout,
        }
    }

    fn download(&self) -> Result<RawTable> {
        let url = export_url(&self.spreadsheet_id, &self.worksheet)?;
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        debug!(%url, "downloading spreadsheet export");
        let response = http
            .get(url.clone())
            .send()
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Spreadsheet export returned HTTP {} for {}",
                status,
                self.spreadsheet_id
            ));
        }

        let bytes = response.bytes().context("Failed to read export body")?;
        let table = parse_delimited(&decode_bytes(&bytes), b',')?;
        info!(
            spreadsheet = %self.spreadsheet_id,
            rows = table.rows.len(),
            "spreadsheet export downloaded"
        );
        Ok(table)
    }
}

impl HoldingsSource for GoogleSheetSource {
    fn describe(&self) -> String {
        format!("google-sheet:{} [{}]", self.spreadsheet_id, self.worksheet)
    }

    fn fetch(&self) -> holdings_pipeline::Result<RawTable> {
        self.download().map_err(unavailable)
    }
}

/// CSV export URL for a worksheet. Numeric identifiers are sheet gids,
/// anything else is looked up by tab name.
pub fn export_url(spreadsheet_id: &str, worksheet: &WorksheetId) -> Result<Url> {
    let id = spreadsheet_id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(anyhow!("Invalid spreadsheet id '{}'", spreadsheet_id));
    }

    let base = Url::parse(SPREADSHEETS_BASE)
        .and_then(|b| b.join(&format!("{}/", id)))
        .context("Failed to build spreadsheet URL")?;

    let url = match worksheet.position() {
        Some(gid) => {
            let mut url = base.join("export").context("Failed to build export URL")?;
            url.query_pairs_mut()
                .append_pair("format", "csv")
                .append_pair("gid", &gid.to_string());
            url
        }
        None => {
            let mut url = base.join("gviz/tq").context("Failed to build gviz URL")?;
            url.query_pairs_mut()
                .append_pair("tqx", "out:csv")
                .append_pair("sheet", &worksheet.to_string());
            url
        }
    };
    Ok(url)
}
