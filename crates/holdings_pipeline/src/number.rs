//! Locale-aware parsing of weight cells.
//!
//! Spreadsheet exports deliver weights either as numbers or as formatted text
//! such as `1.234,56 %`. [`parse_weight`] is total: anything it cannot read
//! becomes `0.0`. [`try_parse_weight`] exposes the failure for callers that
//! want to record or reject it.

use models::{Cell, NumberLocale};

/// Markers stripped before parsing. `%` is included since weights are percentages.
const STRIPPED_MARKERS: [&str; 7] = ["%", "€", "$", "£", "¥", "EUR", "USD"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightParseError {
    Empty,
    Invalid(String),
    NonFinite(String),
}

impl std::fmt::Display for WeightParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightParseError::Empty => write!(f, "empty weight"),
            WeightParseError::Invalid(raw) => write!(f, "invalid weight '{}'", raw),
            WeightParseError::NonFinite(raw) => write!(f, "non-finite weight '{}'", raw),
        }
    }
}

impl std::error::Error for WeightParseError {}

/// Parses a weight cell, returning `0.0` on any failure.
pub fn parse_weight(cell: &Cell, locale: NumberLocale) -> f64 {
    try_parse_weight(cell, locale).unwrap_or(0.0)
}

pub fn try_parse_weight(cell: &Cell, locale: NumberLocale) -> Result<f64, WeightParseError> {
    match cell {
        Cell::Empty => Err(WeightParseError::Empty),
        Cell::Number(n) if n.is_finite() => Ok(*n),
        Cell::Number(n) => Err(WeightParseError::NonFinite(n.to_string())),
        Cell::Text(s) => parse_weight_str(s, locale),
    }
}

/// Parses formatted text.
///
/// With [`NumberLocale::European`] every `.` is a thousands separator, so a
/// source that writes `3.5` meaning three and a half reads as `35`. Such
/// sources must be configured with [`NumberLocale::Standard`].
pub fn parse_weight_str(raw: &str, locale: NumberLocale) -> Result<f64, WeightParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WeightParseError::Empty);
    }

    // Drop spaces, including the non-breaking ones used as thousands separators
    let mut cleaned: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    for marker in STRIPPED_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned = cleaned.replace("nan", "0");

    match locale {
        NumberLocale::European => {
            cleaned = cleaned.replace('.', "");
            cleaned = cleaned.replace(',', ".");
        }
        NumberLocale::Standard => {
            cleaned = cleaned.replace(',', "");
        }
    }

    if cleaned.is_empty() {
        return Err(WeightParseError::Invalid(raw.to_string()));
    }

    let value = cleaned
        .parse::<f64>()
        .map_err(|_| WeightParseError::Invalid(raw.to_string()))?;

    if !value.is_finite() {
        return Err(WeightParseError::NonFinite(raw.to_string()));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eu(s: &str) -> f64 {
        parse_weight(&Cell::Text(s.to_string()), NumberLocale::European)
    }

    #[test]
    fn test_parse_european_thousands_and_percent() {
        assert!((eu("1.234,56%") - 1234.56).abs() < 1e-9);
        assert!((eu(" 2,5 % ") - 2.5).abs() < 1e-9);
        assert!((eu("1.000,50 €") - 1000.5).abs() < 1e-9);
        assert!((eu("-0,75") + 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_parse_nan_and_empty_are_zero() {
        assert_eq!(eu("nan"), 0.0);
        assert_eq!(eu(""), 0.0);
        assert_eq!(parse_weight(&Cell::Empty, NumberLocale::European), 0.0);
        assert_eq!(
            try_parse_weight(&Cell::Text("nan".into()), NumberLocale::European),
            Ok(0.0)
        );
    }

    #[test]
    fn test_numeric_cells_pass_through() {
        assert_eq!(parse_weight(&Cell::Number(3.5), NumberLocale::European), 3.5);
        assert_eq!(parse_weight(&Cell::Number(3.5), NumberLocale::Standard), 3.5);
        assert_eq!(parse_weight(&Cell::Number(f64::NAN), NumberLocale::European), 0.0);
    }

    #[test]
    fn test_garbage_coerces_to_zero() {
        assert_eq!(eu("n/a"), 0.0);
        assert_eq!(eu("%"), 0.0);
        assert_eq!(
            try_parse_weight(&Cell::Text("abc".into()), NumberLocale::European),
            Err(WeightParseError::Invalid("abc".to_string()))
        );
        assert!(matches!(
            try_parse_weight(&Cell::Text("inf".into()), NumberLocale::European),
            Err(WeightParseError::NonFinite(_))
        ));
    }

    #[test]
    fn test_european_locale_reads_dot_as_thousands() {
        // Known format assumption: a decimal point is treated as a separator
        assert_eq!(eu("3.5"), 35.0);
        let standard = parse_weight(&Cell::Text("3.5".into()), NumberLocale::Standard);
        assert_eq!(standard, 3.5);
    }

    #[test]
    fn test_standard_locale() {
        let v = parse_weight(&Cell::Text("1,234.56%".into()), NumberLocale::Standard);
        assert!((v - 1234.56).abs() < 1e-9);
    }
}
