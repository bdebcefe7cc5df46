//! Delimited-text export of the consolidated and normalized tables.
//!
//! Output is UTF-8, comma separated, with a header row. Weights are written
//! as plain decimals (`1234.56`), never in the source locale.

use std::io::Write;

use models::{CANONICAL_COLUMNS, ConsolidatedPosition, NormalizedRow};

pub const POSITIONS_HEADER: [&str; 5] = ["SecurityName", "TotalWeight", "Country", "Sector", "FundCount"];

pub fn write_positions_csv<W: Write>(
    writer: W,
    positions: &[ConsolidatedPosition],
) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(POSITIONS_HEADER)?;
    for p in positions {
        let weight = p.total_weight.to_string();
        let fund_count = p.fund_count.to_string();
        wtr.write_record([
            p.security_name.as_str(),
            weight.as_str(),
            p.country.as_str(),
            p.sector.as_str(),
            fund_count.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_rows_csv<W: Write>(writer: W, rows: &[NormalizedRow]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CANONICAL_COLUMNS)?;
    for r in rows {
        let weight = r.real_weight.to_string();
        wtr.write_record([
            r.fund_isin.as_str(),
            r.fund_name.as_str(),
            r.security_name.as_str(),
            r.ticker.as_str(),
            r.security_isin.as_str(),
            r.sector.as_str(),
            r.country.as_str(),
            r.fund_weight.as_str(),
            r.allocation.as_str(),
            weight.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn positions_to_csv_string(positions: &[ConsolidatedPosition]) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_positions_csv(&mut buf, positions)?;
    String::from_utf8(buf)
        .map_err(|e| csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_csv_plain_decimals() {
        let positions = vec![
            ConsolidatedPosition {
                security_name: "Apple, Inc.".to_string(),
                total_weight: 1234.56,
                country: "US".to_string(),
                sector: "Technology".to_string(),
                fund_count: 3,
            },
            ConsolidatedPosition {
                security_name: "Nestlé".to_string(),
                total_weight: 0.5,
                country: "CH".to_string(),
                sector: "Staples".to_string(),
                fund_count: 1,
            },
        ];
        let csv = positions_to_csv_string(&positions).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "SecurityName,TotalWeight,Country,Sector,FundCount");
        assert_eq!(lines[1], "\"Apple, Inc.\",1234.56,US,Technology,3");
        assert_eq!(lines[2], "Nestlé,0.5,CH,Staples,1");
    }

    #[test]
    fn test_rows_csv_uses_canonical_header() {
        let rows = vec![NormalizedRow {
            source_row: 1,
            fund_isin: "IE00".to_string(),
            fund_name: "World".to_string(),
            security_name: "Apple".to_string(),
            ticker: "AAPL".to_string(),
            security_isin: "US0378331005".to_string(),
            sector: "Technology".to_string(),
            country: "US".to_string(),
            fund_weight: "4,5".to_string(),
            allocation: "50%".to_string(),
            real_weight: 2.25,
        }];
        let mut buf = Vec::new();
        write_rows_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with(
            "FundISIN,FundName,SecurityName,Ticker,SecurityISIN,Sector,Country,FundWeight,Allocation,RealWeight\n"
        ));
        assert!(text.contains("\"4,5\",50%,2.25"));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let csv = positions_to_csv_string(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
