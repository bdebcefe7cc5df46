
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// Canonical schema
pub const CANONICAL_COLUMNS: [&str; 10] = [
	"FundISIN",
	"FundName",
	"SecurityName",
	"Ticker",
	"SecurityISIN",
	"Sector",
	"Country",
	"FundWeight",
	"Allocation",
	"RealWeight",
];

pub const FIELD_FUND_ISIN: &str = "FundISIN";
pub const FIELD_FUND_NAME: &str = "FundName";
pub const FIELD_SECURITY_NAME: &str = "SecurityName";
pub const FIELD_TICKER: &str = "Ticker";
pub const FIELD_SECURITY_ISIN: &str = "SecurityISIN";
pub const FIELD_SECTOR: &str = "Sector";
pub const FIELD_COUNTRY: &str = "Country";
pub const FIELD_FUND_WEIGHT: &str = "FundWeight";
pub const FIELD_ALLOCATION: &str = "Allocation";
pub const WEIGHT_FIELD: &str = "RealWeight";

pub fn canonical_columns() -> Vec<String> {
	CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect()
}

// Raw input as delivered by a source collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
	Empty,
	Number(f64),
	Text(String),
}

impl Cell {
	pub fn text(s: impl Into<String>) -> Self {
		let s = s.into();
		if s.is_empty() { Cell::Empty } else { Cell::Text(s) }
	}

	/// Trimmed textual form of the cell. Numbers use the shortest round-trip form.
	pub fn as_text(&self) -> String {
		match self {
			Cell::Empty => String::new(),
			Cell::Number(n) => n.to_string(),
			Cell::Text(s) => s.trim().to_string(),
		}
	}

	pub fn is_blank(&self) -> bool {
		match self {
			Cell::Empty => true,
			Cell::Number(_) => false,
			Cell::Text(s) => s.trim().is_empty(),
		}
	}
}

impl Default for Cell {
	fn default() -> Self {
		Cell::Empty
	}
}

impl From<&str> for Cell {
	fn from(s: &str) -> Self {
		Cell::text(s)
	}
}

impl From<f64> for Cell {
	fn from(n: f64) -> Self {
		Cell::Number(n)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
	pub header: Vec<String>,
	pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
	pub fn new(header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
		Self { header, rows }
	}

	pub fn width(&self) -> usize {
		self.header.len()
	}

	/// Cell at (row, col); cells past the end of a short row read as empty.
	pub fn cell(&self, row: usize, col: usize) -> &Cell {
		static EMPTY: Cell = Cell::Empty;
		self.rows
			.get(row)
			.and_then(|r| r.get(col))
			.unwrap_or(&EMPTY)
	}
}

// Normalized rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
	pub source_row: usize,
	pub fund_isin: String,
	pub fund_name: String,
	pub security_name: String,
	pub ticker: String,
	pub security_isin: String,
	pub sector: String,
	pub country: String,
	pub fund_weight: String,
	pub allocation: String,
	pub real_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
	UnparseableWeight,
	NonFiniteWeight,
	MissingSecurityName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
	pub row: usize,
	pub column: String,
	pub raw: String,
	pub kind: WarningKind,
}

// Consolidated output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedPosition {
	pub security_name: String,
	pub total_weight: f64,
	pub country: String,
	pub sector: String,
	pub fund_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
	Country,
	Sector,
}

impl Dimension {
	pub fn label_of<'a>(&self, position: &'a ConsolidatedPosition) -> &'a str {
		match self {
			Dimension::Country => &position.country,
			Dimension::Sector => &position.sector,
		}
	}
}

impl fmt::Display for Dimension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Dimension::Country => write!(f, "country"),
			Dimension::Sector => write!(f, "sector"),
		}
	}
}

impl std::str::FromStr for Dimension {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"country" | "countries" => Ok(Dimension::Country),
			"sector" | "sectors" => Ok(Dimension::Sector),
			other => Err(format!("unknown dimension '{}', expected country or sector", other)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBucket {
	pub label: String,
	pub share_percent: f64,
	#[serde(default)]
	pub residual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
	pub position_count: usize,
	pub country_count: usize,
	pub sector_count: usize,
	pub total_exposure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
	pub generated_at: String,
	pub source: String,
	pub raw_row_count: usize,
	pub normalized_row_count: usize,
	pub warning_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsReport {
	pub metadata: ReportMetadata,
	pub kpis: Kpis,
	pub countries: Vec<DistributionBucket>,
	pub sectors: Vec<DistributionBucket>,
	pub ranked: Vec<ConsolidatedPosition>,
	pub warnings: Vec<ParseWarning>,
}

// Settings models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberLocale {
	/// `1.234,56`
	#[default]
	European,
	/// `1,234.56`
	Standard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
	#[default]
	Lenient,
	Strict,
}

/// Selects a tab of the source. For workbooks an index is the tab position,
/// for Google Sheets it is the tab gid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorksheetId {
	Index(usize),
	Name(String),
}

impl WorksheetId {
	/// Numeric form, also accepting names such as `"0"`.
	pub fn position(&self) -> Option<usize> {
		match self {
			WorksheetId::Index(i) => Some(*i),
			WorksheetId::Name(name) => name.trim().parse().ok(),
		}
	}

	pub fn parse(raw: &str) -> Self {
		match raw.trim().parse::<usize>() {
			Ok(i) => WorksheetId::Index(i),
			Err(_) => WorksheetId::Name(raw.trim().to_string()),
		}
	}
}

impl Default for WorksheetId {
	fn default() -> Self {
		WorksheetId::Index(0)
	}
}

impl fmt::Display for WorksheetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WorksheetId::Index(i) => write!(f, "{}", i),
			WorksheetId::Name(n) => write!(f, "{}", n),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSettings {
	Workbook {
		path: PathBuf,
	},
	Delimited {
		path: PathBuf,
		#[serde(default)]
		delimiter: Option<char>,
	},
	GoogleSheet {
		spreadsheet_id: String,
		#[serde(default = "default_timeout_seconds")]
		timeout_seconds: u64,
	},
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessSettings {
	#[serde(default)]
	pub access_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	#[serde(default = "default_threshold")]
	pub weight_group_threshold: f64,
	#[serde(default = "default_cache_ttl_seconds")]
	pub cache_ttl_seconds: u64,
	#[serde(default = "canonical_columns")]
	pub canonical_column_order: Vec<String>,
	#[serde(default = "default_alias_table")]
	pub column_alias_table: BTreeMap<String, String>,
	#[serde(default)]
	pub worksheet_identifier: WorksheetId,
	#[serde(default)]
	pub number_locale: NumberLocale,
	#[serde(default)]
	pub weight_policy: WeightPolicy,
	#[serde(default = "default_top_positions")]
	pub top_positions: usize,
	#[serde(default = "default_range")]
	pub default_range: (usize, usize),
	#[serde(default)]
	pub source: Option<SourceSettings>,
	#[serde(default)]
	pub access: AccessSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			weight_group_threshold: default_threshold(),
			cache_ttl_seconds: default_cache_ttl_seconds(),
			canonical_column_order: canonical_columns(),
			column_alias_table: default_alias_table(),
			worksheet_identifier: WorksheetId::default(),
			number_locale: NumberLocale::default(),
			weight_policy: WeightPolicy::default(),
			top_positions: default_top_positions(),
			default_range: default_range(),
			source: None,
			access: AccessSettings::default(),
		}
	}
}

fn default_threshold() -> f64 {
	0.5
}

fn default_cache_ttl_seconds() -> u64 {
	600
}

fn default_top_positions() -> usize {
	10
}

fn default_range() -> (usize, usize) {
	(11, 25)
}

fn default_timeout_seconds() -> u64 {
	30
}

pub fn default_alias_table() -> BTreeMap<String, String> {
	[
		("Security Name", FIELD_SECURITY_NAME),
		("Country", FIELD_COUNTRY),
		("Fund Name", FIELD_FUND_NAME),
	]
	.into_iter()
	.map(|(k, v)| (k.to_string(), v.to_string()))
	.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_settings_defaults_from_empty_json() {
		let settings: Settings = serde_json::from_str("{}").unwrap();
		assert_eq!(settings, Settings::default());
		assert_eq!(settings.canonical_column_order.last().unwrap(), WEIGHT_FIELD);
		assert_eq!(settings.default_range, (11, 25));
	}

	#[test]
	fn test_worksheet_id_accepts_numeric_strings() {
		let settings: Settings = serde_json::from_str(r#"{"worksheet_identifier": "0"}"#).unwrap();
		assert_eq!(settings.worksheet_identifier, WorksheetId::Name("0".to_string()));
		assert_eq!(settings.worksheet_identifier.position(), Some(0));
		assert_eq!(WorksheetId::parse("Holdings"), WorksheetId::Name("Holdings".to_string()));
		assert_eq!(WorksheetId::parse(" 3 "), WorksheetId::Index(3));
	}

	#[test]
	fn test_source_settings_tagged_by_kind() {
		let settings: Settings = serde_json::from_str(
			r#"{"source": {"kind": "google_sheet", "spreadsheet_id": "abc"}}"#,
		)
		.unwrap();
		assert_eq!(
			settings.source,
			Some(SourceSettings::GoogleSheet {
				spreadsheet_id: "abc".to_string(),
				timeout_seconds: 30
			})
		);
	}

	#[test]
	fn test_cell_text_and_blank() {
		assert_eq!(Cell::text(""), Cell::Empty);
		assert_eq!(Cell::Number(3.0).as_text(), "3");
		assert_eq!(Cell::Text("  Apple ".into()).as_text(), "Apple");
		assert!(Cell::Text("   ".into()).is_blank());
		assert!(!Cell::Number(0.0).is_blank());
	}

	#[test]
	fn test_raw_table_short_rows_read_empty() {
		let table = RawTable::new(vec!["a".into(), "b".into()], vec![vec![Cell::from("x")]]);
		assert_eq!(table.cell(0, 1), &Cell::Empty);
		assert_eq!(table.cell(5, 0), &Cell::Empty);
	}

	#[test]
	fn test_dimension_from_str() {
		assert_eq!("Country".parse::<Dimension>().unwrap(), Dimension::Country);
		assert_eq!("sectors".parse::<Dimension>().unwrap(), Dimension::Sector);
		assert!("region".parse::<Dimension>().is_err());
	}
}
