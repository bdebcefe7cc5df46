use std::collections::HashMap;

use models::{ConsolidatedPosition, Dimension, DistributionBucket};

pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const UNKNOWN_LABEL: &str = "Unknown";

pub fn residual_label(threshold: f64) -> String {
    format!("Other(<{}%)", threshold)
}

/// Groups positions by country or sector and folds every group whose share
/// is below `threshold` into a single residual bucket.
///
/// Main buckets come out in first-seen order followed by the residual bucket,
/// if any. Callers should not depend on that order.
pub fn bucket(
    positions: &[ConsolidatedPosition],
    dimension: Dimension,
    threshold: f64,
) -> Vec<DistributionBucket> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, f64> = HashMap::new();

    for position in positions {
        let label = match dimension.label_of(position).trim() {
            "" => UNKNOWN_LABEL,
            l => l,
        };
        let sum = sums.entry(label).or_insert_with(|| {
            order.push(label);
            0.0
        });
        *sum += position.total_weight;
    }

    let mut buckets = Vec::with_capacity(order.len() + 1);
    let mut residual = 0.0;
    let mut has_residual = false;

    for label in order {
        let share = sums[label];
        if share >= threshold {
            buckets.push(DistributionBucket {
                label: label.to_string(),
                share_percent: share,
                residual: false,
            });
        } else {
            residual += share;
            has_residual = true;
        }
    }

    if has_residual {
        buckets.push(DistributionBucket {
            label: residual_label(threshold),
            share_percent: residual,
            residual: true,
        });
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(name: &str, country: &str, sector: &str, weight: f64) -> ConsolidatedPosition {
        ConsolidatedPosition {
            security_name: name.to_string(),
            total_weight: weight,
            country: country.to_string(),
            sector: sector.to_string(),
            fund_count: 1,
        }
    }

    fn share_of<'a>(buckets: &'a [DistributionBucket], label: &str) -> Option<&'a DistributionBucket> {
        buckets.iter().find(|b| b.label == label)
    }

    #[test]
    fn test_small_slices_fold_into_other() {
        let positions = vec![
            position("p1", "A", "s", 40.0),
            position("p2", "B", "s", 0.3),
            position("p3", "C", "s", 0.2),
            position("p4", "D", "s", 59.5),
        ];
        let buckets = bucket(&positions, Dimension::Country, DEFAULT_THRESHOLD);

        assert_eq!(buckets.len(), 3);
        assert_eq!(share_of(&buckets, "A").unwrap().share_percent, 40.0);
        assert_eq!(share_of(&buckets, "D").unwrap().share_percent, 59.5);
        let other = share_of(&buckets, "Other(<0.5%)").unwrap();
        assert!(other.residual);
        assert!((other.share_percent - 0.5).abs() < 1e-9);
        assert!(share_of(&buckets, "B").is_none());
    }

    #[test]
    fn test_groups_sum_across_positions() {
        let positions = vec![
            position("Apple", "US", "Technology", 5.0),
            position("Nestle", "CH", "Staples", 2.0),
            position("Microsoft", "US", "Technology", 4.0),
        ];
        let buckets = bucket(&positions, Dimension::Sector, DEFAULT_THRESHOLD);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "Technology");
        assert_eq!(buckets[0].share_percent, 9.0);
        assert!(buckets.iter().all(|b| !b.residual));
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let positions = vec![position("p", "A", "s", 0.5)];
        let buckets = bucket(&positions, Dimension::Country, 0.5);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, "A");
    }

    #[test]
    fn test_blank_labels_grouped_as_unknown() {
        let positions = vec![position("p1", "", "s", 2.0), position("p2", "  ", "s", 1.0)];
        let buckets = bucket(&positions, Dimension::Country, 0.5);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, UNKNOWN_LABEL);
        assert_eq!(buckets[0].share_percent, 3.0);
    }

    #[test]
    fn test_custom_threshold_label() {
        let positions = vec![position("p1", "A", "s", 0.9), position("p2", "B", "s", 5.0)];
        let buckets = bucket(&positions, Dimension::Country, 1.0);
        assert!(share_of(&buckets, "Other(<1%)").is_some());
    }

    #[test]
    fn test_empty_input_yields_no_buckets() {
        assert!(bucket(&[], Dimension::Sector, DEFAULT_THRESHOLD).is_empty());
    }
}
