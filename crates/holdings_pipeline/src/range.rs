use models::ConsolidatedPosition;
use serde::{Deserialize, Serialize};

/// Inclusive, 1-based rank bounds over a descending ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRange {
    pub start: usize,
    pub end: usize,
}

impl RankRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Clamps both bounds into `[1, len]` and orders them. Returns `None`
    /// when there is nothing to select.
    pub fn clamped(self, len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let start = self.start.clamp(1, len);
        let end = self.end.clamp(1, len);
        Some(Self {
            start: start.min(end),
            end: start.max(end),
        })
    }

    pub fn len(&self) -> usize {
        if self.start == 0 || self.start > self.end {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns ranks `start_rank..=end_rank` of `ranked` in ascending weight
/// order, so a top-to-bottom bar chart shows `start_rank` first.
///
/// An empty or out-of-bounds range yields an empty vector; `end_rank` past
/// the end is cut at the last position.
pub fn select_range(
    ranked: &[ConsolidatedPosition],
    start_rank: usize,
    end_rank: usize,
) -> Vec<ConsolidatedPosition> {
    if start_rank == 0 || start_rank > end_rank || start_rank > ranked.len() {
        return Vec::new();
    }
    let end = end_rank.min(ranked.len());
    ranked[start_rank - 1..end].iter().rev().cloned().collect()
}

/// Fixed "top N" view, ascending like [`select_range`].
pub fn top_positions(ranked: &[ConsolidatedPosition], n: usize) -> Vec<ConsolidatedPosition> {
    select_range(ranked, 1, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(n: usize) -> Vec<ConsolidatedPosition> {
        (0..n)
            .map(|i| ConsolidatedPosition {
                security_name: format!("S{}", i + 1),
                total_weight: (n - i) as f64,
                country: "US".to_string(),
                sector: "Tech".to_string(),
                fund_count: 1,
            })
            .collect()
    }

    #[test]
    fn test_select_11_to_25_ascending() {
        let positions = ranked(40);
        let slice = select_range(&positions, 11, 25);

        assert_eq!(slice.len(), 15);
        assert_eq!(slice.first().unwrap().security_name, "S25");
        assert_eq!(slice.last().unwrap().security_name, "S11");
        assert!(slice.windows(2).all(|w| w[0].total_weight <= w[1].total_weight));
    }

    #[test]
    fn test_empty_and_inverted_ranges() {
        let positions = ranked(5);
        assert!(select_range(&positions, 0, 3).is_empty());
        assert!(select_range(&positions, 4, 2).is_empty());
        assert!(select_range(&positions, 6, 9).is_empty());
        assert!(select_range(&[], 1, 10).is_empty());
    }

    #[test]
    fn test_end_past_len_is_cut() {
        let positions = ranked(5);
        let slice = select_range(&positions, 3, 100);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].security_name, "S5");
    }

    #[test]
    fn test_top_positions() {
        let positions = ranked(12);
        let top = top_positions(&positions, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top.last().unwrap().security_name, "S1");
    }

    #[test]
    fn test_rank_range_clamped() {
        assert_eq!(RankRange::new(11, 25).clamped(8), Some(RankRange::new(8, 8)));
        assert_eq!(RankRange::new(0, 3).clamped(8), Some(RankRange::new(1, 3)));
        assert_eq!(RankRange::new(6, 2).clamped(8), Some(RankRange::new(2, 6)));
        assert_eq!(RankRange::new(1, 10).clamped(0), None);
        assert_eq!(RankRange::new(11, 25).len(), 15);
        assert!(RankRange::new(3, 2).is_empty());
    }
}
