use std::collections::BTreeMap;

use chrono::Utc;
use models::{
    Dimension, HoldingsReport, NumberLocale, RawTable, ReportMetadata, Settings, WEIGHT_FIELD,
    WeightPolicy,
};
use tracing::info;

use crate::columns::{ColumnMapping, map_columns};
use crate::consolidate::{consolidate, rank};
use crate::distribution::bucket;
use crate::error::Result;
use crate::kpis::compute_kpis;
use crate::normalize::{NormalizedTable, normalize_rows};
use crate::source::HoldingsSource;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub canonical: Vec<String>,
    pub aliases: BTreeMap<String, String>,
    pub locale: NumberLocale,
    pub policy: WeightPolicy,
    pub threshold: f64,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            canonical: settings.canonical_column_order.clone(),
            aliases: settings.column_alias_table.clone(),
            locale: settings.number_locale,
            policy: settings.weight_policy,
            threshold: settings.weight_group_threshold,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Column mapping, weight normalization and consolidation as one linear run.
///
/// A run either returns a complete report or an error; schema errors are
/// raised before any row is read.
#[derive(Debug, Clone, Default)]
pub struct HoldingsPipeline {
    options: PipelineOptions,
}

impl HoldingsPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn map_header(&self, header: &[String]) -> Result<ColumnMapping> {
        map_columns(
            header,
            &self.options.canonical,
            &self.options.aliases,
            WEIGHT_FIELD,
        )
    }

    pub fn normalize(&self, table: &RawTable) -> Result<NormalizedTable> {
        let mapping = self.map_header(&table.header)?;
        normalize_rows(table, &mapping, self.options.locale, self.options.policy)
    }

    pub fn run(&self, table: &RawTable, source: &str) -> Result<HoldingsReport> {
        let normalized = self.normalize(table)?;
        let ranked = rank(consolidate(&normalized.rows));
        let kpis = compute_kpis(&ranked);

        let report = HoldingsReport {
            metadata: ReportMetadata {
                generated_at: Utc::now().to_rfc3339(),
                source: source.to_string(),
                raw_row_count: table.rows.len(),
                normalized_row_count: normalized.rows.len(),
                warning_count: normalized.warnings.len(),
            },
            countries: bucket(&ranked, Dimension::Country, self.options.threshold),
            sectors: bucket(&ranked, Dimension::Sector, self.options.threshold),
            kpis,
            ranked,
            warnings: normalized.warnings,
        };

        info!(
            source,
            positions = report.kpis.position_count,
            exposure = report.kpis.total_exposure,
            warnings = report.metadata.warning_count,
            "holdings report built"
        );
        Ok(report)
    }

    /// Fetches from `source` and runs the pipeline on the result.
    pub fn load(&self, source: &dyn HoldingsSource) -> Result<HoldingsReport> {
        let label = source.describe();
        let table = source.fetch()?;
        self.run(&table, &label)
    }
}
