use std::collections::HashMap;

use models::{ConsolidatedPosition, NormalizedRow};
use tracing::info;

/// Merges rows of the same security across funds.
///
/// Weights are summed. Country and sector come from the first row seen for
/// each security; later rows for that security never override them, even
/// when funds disagree. Output keeps first-seen order.
pub fn consolidate(rows: &[NormalizedRow]) -> Vec<ConsolidatedPosition> {
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();
    let mut positions: Vec<ConsolidatedPosition> = Vec::new();

    for row in rows {
        match index_by_name.get(row.security_name.as_str()) {
            Some(&idx) => {
                let pos = &mut positions[idx];
                pos.total_weight += row.real_weight;
                pos.fund_count += 1;
            }
            None => {
                index_by_name.insert(row.security_name.as_str(), positions.len());
                positions.push(ConsolidatedPosition {
                    security_name: row.security_name.clone(),
                    total_weight: row.real_weight,
                    country: row.country.clone(),
                    sector: row.sector.clone(),
                    fund_count: 1,
                });
            }
        }
    }

    info!(
        rows = rows.len(),
        positions = positions.len(),
        "positions consolidated"
    );
    positions
}

/// Orders positions by descending total weight. The sort is stable, so ties
/// keep their input order.
pub fn rank(mut positions: Vec<ConsolidatedPosition>) -> Vec<ConsolidatedPosition> {
    positions.sort_by(|a, b| b.total_weight.total_cmp(&a.total_weight));
    positions
}
