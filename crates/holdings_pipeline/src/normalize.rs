use models::{
    Cell, FIELD_ALLOCATION, FIELD_COUNTRY, FIELD_FUND_ISIN, FIELD_FUND_NAME, FIELD_FUND_WEIGHT,
    FIELD_SECTOR, FIELD_SECURITY_ISIN, FIELD_SECURITY_NAME, FIELD_TICKER, NormalizedRow,
    NumberLocale, ParseWarning, RawTable, WEIGHT_FIELD, WarningKind, WeightPolicy,
};
use tracing::{debug, info, warn};

use crate::columns::ColumnMapping;
use crate::error::{HoldingsError, Result};
use crate::number::{WeightParseError, try_parse_weight};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    pub rows: Vec<NormalizedRow>,
    pub warnings: Vec<ParseWarning>,
}

/// Applies the column mapping and coerces `RealWeight` to a number.
///
/// Blank rows are skipped. Rows without a security name are dropped and
/// reported. Under [`WeightPolicy::Lenient`] a weight that cannot be read
/// becomes `0.0` and is reported; under [`WeightPolicy::Strict`] it aborts.
pub fn normalize_rows(
    table: &RawTable,
    mapping: &ColumnMapping,
    locale: NumberLocale,
    policy: WeightPolicy,
) -> Result<NormalizedTable> {
    let weight_col = mapping
        .index_of(WEIGHT_FIELD)
        .ok_or_else(|| HoldingsError::MissingRequiredField(WEIGHT_FIELD.to_string()))?;

    let text_of = |row_idx: usize, field: &str| -> String {
        mapping
            .index_of(field)
            .map(|col| table.cell(row_idx, col).as_text())
            .unwrap_or_default()
    };

    let mut out = NormalizedTable::default();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let source_row = row_idx + 1;
        if row.iter().all(Cell::is_blank) {
            continue;
        }

        let security_name = text_of(row_idx, FIELD_SECURITY_NAME);
        if security_name.is_empty() {
            out.warnings.push(ParseWarning {
                row: source_row,
                column: FIELD_SECURITY_NAME.to_string(),
                raw: String::new(),
                kind: WarningKind::MissingSecurityName,
            });
            continue;
        }

        let weight_cell = table.cell(row_idx, weight_col);
        let real_weight = match try_parse_weight(weight_cell, locale) {
            Ok(v) => v,
            Err(WeightParseError::Empty) => 0.0,
            Err(err) => {
                let raw = weight_cell.as_text();
                if policy == WeightPolicy::Strict {
                    return Err(HoldingsError::UnparseableWeight {
                        row: source_row,
                        raw,
                    });
                }
                debug!(row = source_row, %raw, "weight coerced to 0: {}", err);
                let kind = match err {
                    WeightParseError::NonFinite(_) => WarningKind::NonFiniteWeight,
                    _ => WarningKind::UnparseableWeight,
                };
                out.warnings.push(ParseWarning {
                    row: source_row,
                    column: WEIGHT_FIELD.to_string(),
                    raw,
                    kind,
                });
                0.0
            }
        };

        out.rows.push(NormalizedRow {
            source_row,
            fund_isin: text_of(row_idx, FIELD_FUND_ISIN),
            fund_name: text_of(row_idx, FIELD_FUND_NAME),
            security_name,
            ticker: text_of(row_idx, FIELD_TICKER),
            security_isin: text_of(row_idx, FIELD_SECURITY_ISIN),
            sector: text_of(row_idx, FIELD_SECTOR),
            country: text_of(row_idx, FIELD_COUNTRY),
            fund_weight: text_of(row_idx, FIELD_FUND_WEIGHT),
            allocation: text_of(row_idx, FIELD_ALLOCATION),
            real_weight,
        });
    }

    info!(
        rows = out.rows.len(),
        skipped = table.rows.len() - out.rows.len(),
        "rows normalized"
    );
    if !out.warnings.is_empty() {
        warn!(count = out.warnings.len(), "cells coerced or dropped during normalization");
    }

    Ok(out)
}
