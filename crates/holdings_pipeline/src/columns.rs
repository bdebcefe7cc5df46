//! Aligns an incoming header to the canonical schema.
//!
//! Names listed in the alias table are matched exactly (after trimming).
//! Every other canonical field is assigned by position, walking the raw
//! columns left to right and skipping the ones already claimed by an alias.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::error::{HoldingsError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAssignment {
    pub index: usize,
    pub raw_name: String,
    pub canonical: String,
    pub by_alias: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub assignments: Vec<ColumnAssignment>,
}

impl ColumnMapping {
    /// Raw column index holding the given canonical field.
    pub fn index_of(&self, canonical: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.canonical == canonical)
            .map(|a| a.index)
    }

    /// Old-name to canonical-name view of the mapping.
    pub fn renames(&self) -> BTreeMap<String, String> {
        self.assignments
            .iter()
            .map(|a| (a.raw_name.clone(), a.canonical.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

pub fn map_columns(
    raw_header: &[String],
    canonical: &[String],
    alias_table: &BTreeMap<String, String>,
    weight_field: &str,
) -> Result<ColumnMapping> {
    let names: Vec<String> = raw_header.iter().map(|h| h.trim().to_string()).collect();

    let weight_pos = canonical
        .iter()
        .position(|c| c == weight_field)
        .ok_or_else(|| HoldingsError::MissingRequiredField(weight_field.to_string()))?;
    let required = weight_pos + 1;
    if names.len() < required {
        return Err(HoldingsError::SchemaTooNarrow {
            found: names.len(),
            required,
        });
    }

    let mut assignments: Vec<ColumnAssignment> = Vec::new();
    let mut taken_raw: HashSet<usize> = HashSet::new();
    let mut taken_canonical: HashSet<&str> = HashSet::new();

    // 1. Exact alias matches
    for (index, name) in names.iter().enumerate() {
        let Some(target) = alias_table.get(name) else {
            continue;
        };
        if !canonical.iter().any(|c| c == target) || taken_canonical.contains(target.as_str()) {
            continue;
        }
        debug!(column = %name, index, canonical = %target, "column mapped by alias");
        taken_raw.insert(index);
        taken_canonical.insert(target.as_str());
        assignments.push(ColumnAssignment {
            index,
            raw_name: name.clone(),
            canonical: target.clone(),
            by_alias: true,
        });
    }

    // 2. Positional fallback for the rest
    let mut free_raw = (0..names.len()).filter(|i| !taken_raw.contains(i));
    for field in canonical {
        if taken_canonical.contains(field.as_str()) {
            continue;
        }
        let Some(index) = free_raw.next() else {
            break;
        };
        assignments.push(ColumnAssignment {
            index,
            raw_name: names[index].clone(),
            canonical: field.clone(),
            by_alias: false,
        });
    }

    assignments.sort_by_key(|a| a.index);
    let mapping = ColumnMapping { assignments };

    if mapping.index_of(weight_field).is_none() {
        return Err(HoldingsError::MissingRequiredField(weight_field.to_string()));
    }

    debug!(
        mapped = mapping.len(),
        raw_columns = names.len(),
        "column mapping resolved"
    );
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{WEIGHT_FIELD, canonical_columns, default_alias_table};

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pure_positional_mapping() {
        let raw = header(&[
            "Fund ISIN", "Fondo", "Accion", "Ticker", "ISIN Security", "Sector", "Pais",
            "Weight Fund", "Alloc", "Peso Real",
        ]);
        let canonical = canonical_columns();
        let mapping = map_columns(&raw, &canonical, &BTreeMap::new(), WEIGHT_FIELD).unwrap();

        assert_eq!(mapping.len(), 10);
        for (i, field) in canonical.iter().enumerate() {
            assert_eq!(mapping.index_of(field), Some(i));
            assert_eq!(mapping.renames().get(&raw[i]), Some(field));
        }
    }

    #[test]
    fn test_narrow_header_fails_fast() {
        let raw = header(&["A", "B", "C"]);
        let err = map_columns(&raw, &canonical_columns(), &BTreeMap::new(), WEIGHT_FIELD)
            .unwrap_err();
        assert_eq!(
            err,
            HoldingsError::SchemaTooNarrow {
                found: 3,
                required: 10
            }
        );
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_headers_are_trimmed_before_alias_lookup() {
        let raw = header(&[
            "ISIN", " Fund Name ", "Name", "Ticker", "ISIN2", "Sector", "Country ", "W", "A",
            "Real",
        ]);
        let mapping =
            map_columns(&raw, &canonical_columns(), &default_alias_table(), WEIGHT_FIELD).unwrap();
        let renames = mapping.renames();
        assert_eq!(renames.get("Fund Name").map(String::as_str), Some("FundName"));
        assert_eq!(renames.get("Country").map(String::as_str), Some("Country"));
        assert_eq!(mapping.index_of("RealWeight"), Some(9));
    }

    #[test]
    fn test_alias_out_of_order_shifts_positional_fallback() {
        // Security name arrives first; the rest follows canonical order
        let raw = header(&[
            "Security Name", "Fund ISIN", "Fund", "Ticker", "ISIN", "Sector", "Country", "W",
            "Alloc", "Weight",
        ]);
        let mapping =
            map_columns(&raw, &canonical_columns(), &default_alias_table(), WEIGHT_FIELD).unwrap();

        assert_eq!(mapping.index_of("SecurityName"), Some(0));
        assert_eq!(mapping.index_of("FundISIN"), Some(1));
        assert_eq!(mapping.index_of("FundName"), Some(2));
        assert_eq!(mapping.index_of("Ticker"), Some(3));
        assert_eq!(mapping.index_of("Country"), Some(6));
        assert_eq!(mapping.index_of("RealWeight"), Some(9));
        assert!(mapping.assignments[0].by_alias);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let mut raw = header(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        raw.push("Comment".to_string());
        let mapping = map_columns(&raw, &canonical_columns(), &BTreeMap::new(), WEIGHT_FIELD)
            .unwrap();
        assert_eq!(mapping.len(), 10);
        assert_eq!(mapping.index_of("RealWeight"), Some(9));
    }

    #[test]
    fn test_weight_missing_from_canonical_is_required_field_error() {
        let canonical = header(&["SecurityName", "Country"]);
        let raw = header(&["x", "y"]);
        let err = map_columns(&raw, &canonical, &BTreeMap::new(), WEIGHT_FIELD).unwrap_err();
        assert_eq!(err, HoldingsError::MissingRequiredField("RealWeight".to_string()));
    }

    #[test]
    fn test_alias_to_unknown_field_is_skipped() {
        let mut aliases = BTreeMap::new();
        aliases.insert("Region".to_string(), "Continent".to_string());
        let raw = header(&["Region", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let mapping = map_columns(&raw, &canonical_columns(), &aliases, WEIGHT_FIELD).unwrap();
        assert_eq!(mapping.index_of("FundISIN"), Some(0));
    }
}
