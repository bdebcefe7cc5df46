use std::collections::HashSet;

use models::{ConsolidatedPosition, Kpis};

/// Headline figures for the dashboard. Blank countries and sectors are not
/// counted as distinct values.
pub fn compute_kpis(positions: &[ConsolidatedPosition]) -> Kpis {
    let distinct = |pick: fn(&ConsolidatedPosition) -> &str| -> usize {
        positions
            .iter()
            .map(pick)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<HashSet<_>>()
            .len()
    };

    Kpis {
        position_count: positions.len(),
        country_count: distinct(|p| p.country.as_str()),
        sector_count: distinct(|p| p.sector.as_str()),
        total_exposure: positions.iter().map(|p| p.total_weight).sum(),
    }
}

/// Formats the total exposure the way the dashboard displays it.
pub fn format_exposure(kpis: &Kpis) -> String {
    format!("{:.2}%", kpis.total_exposure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(country: &str, sector: &str, weight: f64) -> ConsolidatedPosition {
        ConsolidatedPosition {
            security_name: format!("{}-{}", country, sector),
            total_weight: weight,
            country: country.to_string(),
            sector: sector.to_string(),
            fund_count: 1,
        }
    }

    #[test]
    fn test_compute_kpis() {
        let positions = vec![
            position("US", "Tech", 10.0),
            position("US", "Health", 5.5),
            position("CH", "Tech", 2.25),
            position("", "", 1.0),
        ];
        let kpis = compute_kpis(&positions);

        assert_eq!(kpis.position_count, 4);
        assert_eq!(kpis.country_count, 2);
        assert_eq!(kpis.sector_count, 2);
        assert!((kpis.total_exposure - 18.75).abs() < 1e-9);
        assert_eq!(format_exposure(&kpis), "18.75%");
    }

    #[test]
    fn test_kpis_of_empty_portfolio() {
        let kpis = compute_kpis(&[]);
        assert_eq!(kpis.position_count, 0);
        assert_eq!(kpis.total_exposure, 0.0);
    }
}
