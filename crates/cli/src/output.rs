//! Plain-text tables for terminal output.

use holdings_pipeline::{ColumnMapping, format_exposure};
use models::{ConsolidatedPosition, DistributionBucket, HoldingsReport, ParseWarning};
use std::fmt::Write;

pub fn render_kpis(report: &HoldingsReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Source:     {}", report.metadata.source);
    let _ = writeln!(out, "Positions:  {}", report.kpis.position_count);
    let _ = writeln!(out, "Countries:  {}", report.kpis.country_count);
    let _ = writeln!(out, "Sectors:    {}", report.kpis.sector_count);
    let _ = write!(out, "Exposure:   {}", format_exposure(&report.kpis));
    out
}

pub fn render_buckets(buckets: &[DistributionBucket]) -> String {
    let mut out = String::new();
    for b in buckets {
        let _ = writeln!(out, "  {:<28} {:>8.2}%", b.label, b.share_percent);
    }
    out
}

/// Positions in ascending order as produced by `select_range`; `last_rank`
/// is the rank of the first element.
pub fn render_ascending(positions: &[ConsolidatedPosition], last_rank: usize) -> String {
    let mut out = String::new();
    for (i, p) in positions.iter().enumerate() {
        let rank = last_rank.saturating_sub(i);
        let _ = writeln!(
            out,
            "  {:>4}. {:<32} {:>8.2}%  {:<16} {:<20} funds: {}",
            rank, p.security_name, p.total_weight, p.country, p.sector, p.fund_count
        );
    }
    out
}

pub fn render_warnings(warnings: &[ParseWarning]) -> String {
    let mut out = format!("{} warning(s):\n", warnings.len());
    for w in warnings {
        let _ = writeln!(
            out,
            "  row {:>5} {:<14} {:?} '{}'",
            w.row, w.column, w.kind, w.raw
        );
    }
    out
}

pub fn render_header(header: &[String], mapping: Option<&ColumnMapping>) -> String {
    let mut out = String::new();
    for (index, name) in header.iter().enumerate() {
        let target = mapping
            .and_then(|m| m.assignments.iter().find(|a| a.index == index))
            .map(|a| {
                if a.by_alias {
                    format!("{} (alias)", a.canonical)
                } else {
                    a.canonical.clone()
                }
            })
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "  {:>3}  {:<32} -> {}", index, name, target);
    }
    out
}
