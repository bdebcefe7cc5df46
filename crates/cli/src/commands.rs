use anyhow::{Context as _, Result, anyhow};
use holdings_pipeline::{
    HoldingsPipeline, HoldingsSource, PipelineOptions, RankRange, bucket, select_range,
    top_positions, write_positions_csv, write_rows_csv,
};
use holdings_sources::{DelimitedFileSource, WorkbookSource, source_from_settings};
use models::{Dimension, HoldingsReport, Settings, WorksheetId};
use serde_json::json;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::output;

/// Settings, source and pipeline resolved from flags and the settings file.
pub struct Context {
    pub settings: Settings,
    pub source: Box<dyn HoldingsSource>,
    pub pipeline: HoldingsPipeline,
}

impl Context {
    pub fn load(
        settings_path: Option<&PathBuf>,
        input: Option<&PathBuf>,
        worksheet: Option<WorksheetId>,
    ) -> Result<Self> {
        let mut settings = settings_loader::load_settings_with_fallback(settings_path)?;
        settings_loader::apply_env_overrides(&mut settings);
        if let Some(worksheet) = worksheet {
            settings.worksheet_identifier = worksheet;
        }
        settings_loader::validate_settings(&settings).context("Invalid settings")?;

        let source = match input {
            Some(path) => source_for_path(path, &settings.worksheet_identifier),
            None => {
                let configured = settings.source.as_ref().ok_or_else(|| {
                    anyhow!("No input given. Pass --input FILE or configure \"source\" in settings.json")
                })?;
                source_from_settings(configured, &settings.worksheet_identifier)
            }
        };

        let pipeline = HoldingsPipeline::new(PipelineOptions::from_settings(&settings));
        Ok(Self {
            settings,
            source,
            pipeline,
        })
    }

    pub fn report(&self) -> Result<HoldingsReport> {
        self.pipeline
            .load(self.source.as_ref())
            .with_context(|| format!("Processing {}", self.source.describe()))
    }
}

/// CSV-like extensions go through the delimited reader, everything else
/// through the workbook reader.
pub fn source_for_path(path: &Path, worksheet: &WorksheetId) -> Box<dyn HoldingsSource> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "txt" => Box::new(DelimitedFileSource::new(path, None)),
        "tsv" => Box::new(DelimitedFileSource::new(path, Some(b'\t'))),
        _ => Box::new(WorkbookSource::new(path, worksheet.clone())),
    }
}

pub fn summary(ctx: &Context, as_json: bool) -> Result<()> {
    let report = ctx.report()?;
    let top = top_positions(&report.ranked, ctx.settings.top_positions);

    if as_json {
        let value = json!({
            "metadata": report.metadata,
            "kpis": report.kpis,
            "countries": report.countries,
            "sectors": report.sectors,
            "top_positions": top,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", output::render_kpis(&report));
    println!("Countries\n{}", output::render_buckets(&report.countries));
    println!("Sectors\n{}", output::render_buckets(&report.sectors));
    println!("Top {}\n{}", top.len(), output::render_ascending(&top, top.len()));
    if !report.warnings.is_empty() {
        println!("{}", output::render_warnings(&report.warnings));
    }
    Ok(())
}

pub fn top(ctx: &Context, n: Option<usize>, as_json: bool) -> Result<()> {
    let report = ctx.report()?;
    let n = n.unwrap_or(ctx.settings.top_positions);
    let mut positions = top_positions(&report.ranked, n);

    if as_json {
        positions.reverse();
        println!("{}", serde_json::to_string_pretty(&positions)?);
    } else {
        println!("{}", output::render_ascending(&positions, positions.len()));
    }
    Ok(())
}

pub fn range(ctx: &Context, start: Option<usize>, end: Option<usize>, as_json: bool) -> Result<()> {
    let report = ctx.report()?;
    let (default_start, default_end) = ctx.settings.default_range;
    let requested = RankRange::new(start.unwrap_or(default_start), end.unwrap_or(default_end));

    let Some(bounds) = requested.clamped(report.ranked.len()) else {
        println!("No positions.");
        return Ok(());
    };
    let positions = select_range(&report.ranked, bounds.start, bounds.end);

    if as_json {
        let value = json!({
            "start": bounds.start,
            "end": bounds.end,
            "total": report.ranked.len(),
            "positions": positions,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Ranks {}-{} of {}", bounds.start, bounds.end, report.ranked.len());
        println!("{}", output::render_ascending(&positions, bounds.end));
    }
    Ok(())
}

pub fn distribution(
    ctx: &Context,
    by: Dimension,
    threshold: Option<f64>,
    as_json: bool,
) -> Result<()> {
    let threshold = threshold.unwrap_or(ctx.settings.weight_group_threshold);
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(anyhow!("--threshold must be a non-negative number"));
    }

    let report = ctx.report()?;
    let buckets = bucket(&report.ranked, by, threshold);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
    } else {
        println!("{}", output::render_buckets(&buckets));
    }
    Ok(())
}

pub fn export(ctx: &Context, out: &Path, rows: bool) -> Result<()> {
    let file = File::create(out).with_context(|| format!("Creating {}", out.display()))?;
    let writer = BufWriter::new(file);

    if rows {
        let table = ctx.source.fetch()?;
        let normalized = ctx.pipeline.normalize(&table)?;
        write_rows_csv(writer, &normalized.rows)
            .with_context(|| format!("Writing {}", out.display()))?;
        info!(rows = normalized.rows.len(), path = %out.display(), "rows exported");
        println!("Exported {} rows to {}", normalized.rows.len(), out.display());
    } else {
        let report = ctx.report()?;
        write_positions_csv(writer, &report.ranked)
            .with_context(|| format!("Writing {}", out.display()))?;
        info!(positions = report.ranked.len(), path = %out.display(), "positions exported");
        println!("Exported {} positions to {}", report.ranked.len(), out.display());
    }
    Ok(())
}

pub fn inspect(ctx: &Context, as_json: bool) -> Result<()> {
    let table = ctx.source.fetch()?;
    let mapping = ctx.pipeline.map_header(&table.header);

    if as_json {
        let value = json!({
            "source": ctx.source.describe(),
            "header": table.header,
            "row_count": table.rows.len(),
            "mapping": mapping.as_ref().map(|m| m.renames()).ok(),
            "error": mapping.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Source: {}", ctx.source.describe());
    println!("Rows:   {}", table.rows.len());
    println!("{}", output::render_header(&table.header, mapping.as_ref().ok()));
    if let Err(err) = mapping {
        println!("Mapping failed: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "Fund ISIN;Fund Name;Security Name;Ticker;ISIN;Sector;Country;Fund Weight;Allocation;Real Weight\n\
        IE00;World;Apple;AAPL;US0378;Technology;US;4,0%;50%;2,0%\n\
        IE01;Europe;Nestle;NESN;CH0038;Staples;CH;3,0%;50%;1,5%\n\
        IE02;Tech;Apple;AAPL;US0378;Technology;IE;7,0%;50%;3,5%\n";

    fn context_for(csv: &str) -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holdings.csv");
        File::create(&path)
            .unwrap()
            .write_all(csv.as_bytes())
            .unwrap();
        let missing_settings = dir.path().join("settings.json");
        let ctx = Context::load(Some(&missing_settings), Some(&path), None).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_source_for_path() {
        let ws = WorksheetId::default();
        assert!(source_for_path(Path::new("a.CSV"), &ws).describe().ends_with("a.CSV"));
        assert!(source_for_path(Path::new("a.xlsx"), &ws).describe().contains("[0]"));
    }

    #[test]
    fn test_report_from_csv_input() {
        let (_dir, ctx) = context_for(CSV);
        let report = ctx.report().unwrap();
        assert_eq!(report.kpis.position_count, 2);
        assert_eq!(report.ranked[0].security_name, "Apple");
        assert!((report.ranked[0].total_weight - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_export_positions_and_rows() {
        let (dir, ctx) = context_for(CSV);

        let positions_path = dir.path().join("positions.csv");
        export(&ctx, &positions_path, false).unwrap();
        let text = std::fs::read_to_string(&positions_path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().starts_with("Apple,"));

        let rows_path = dir.path().join("rows.csv");
        export(&ctx, &rows_path, true).unwrap();
        let text = std::fs::read_to_string(&rows_path).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing_settings = dir.path().join("settings.json");
        let result = Context::load(Some(&missing_settings), None, None);
        assert!(result.is_err());
    }
}
