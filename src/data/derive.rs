//! Derived-Field Policies
//! Coercion rules shared by every page when turning raw CSV text into typed fields.
//!
//! Nothing here can fail: unparsable input falls back to a documented default so
//! no `NaN` ever reaches a scale domain.

/// Category used when a text field is blank or missing.
pub const UNKNOWN: &str = "Unknown";

/// Parse a trimmed decimal number, falling back to `default` for missing,
/// non-numeric or non-finite input.
pub fn number_or(text: Option<&str>, default: f64) -> f64 {
    text.and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Parse a number and clamp it to zero from below.
pub fn non_negative(text: Option<&str>) -> f64 {
    number_or(text, 0.0).max(0.0)
}

/// Decode a range string such as `"10000000-20000000"` to its largest bound.
///
/// A plain number passes through unchanged, and text with no parsable bound
/// decodes to 0.
pub fn range_max(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return 0.0;
    };

    text.split('-')
        .filter_map(|part| {
            let cleaned: String = part.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        })
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .unwrap_or(0.0)
}

/// Normalize positive and negative counts to percentages on a 0–100 scale.
///
/// Returns `(0, 0)` when there are no ratings at all.
pub fn rating_ratios(positive: f64, negative: f64) -> (f64, f64) {
    let positive = positive.max(0.0);
    let negative = negative.max(0.0);
    let total = positive + negative;
    if total <= 0.0 {
        return (0.0, 0.0);
    }

    let pos = (positive / total * 100.0).clamp(0.0, 100.0);
    let neg = (negative / total * 100.0).clamp(0.0, 100.0);
    (pos, neg)
}

/// Pull the first run of exactly four ASCII digits out of a date-like string.
pub fn extract_year(text: Option<&str>) -> Option<i32> {
    let text = text?;
    let bytes = text.as_bytes();
    let mut start = None;

    for (i, b) in bytes.iter().enumerate() {
        match (b.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s == 4 {
                    return text[s..i].parse().ok();
                }
                start = None;
            }
            _ => {}
        }
    }

    match start {
        Some(s) if bytes.len() - s == 4 => text[s..].parse().ok(),
        _ => None,
    }
}

/// Year extraction with a page-specific fallback.
pub fn year_or(text: Option<&str>, fallback: i32) -> i32 {
    extract_year(text).unwrap_or(fallback)
}

/// Trimmed category text, or [`UNKNOWN`] when blank.
pub fn category_or_unknown(text: Option<&str>) -> String {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Boolean columns are written as `True` / `False`.
pub fn flag(text: Option<&str>) -> bool {
    text.map(|t| t.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_fall_back_instead_of_nan() {
        assert_eq!(number_or(Some("19.99"), 0.0), 19.99);
        assert_eq!(number_or(Some("  7 "), 0.0), 7.0);
        assert_eq!(number_or(Some("free"), 0.0), 0.0);
        assert_eq!(number_or(Some("NaN"), 3.0), 3.0);
        assert_eq!(number_or(Some("inf"), 3.0), 3.0);
        assert_eq!(number_or(None, 5.0), 5.0);
        assert_eq!(non_negative(Some("-12")), 0.0);
    }

    #[test]
    fn owners_range_decodes_to_upper_bound() {
        assert_eq!(range_max(Some("10000000-20000000")), 20_000_000.0);
        assert_eq!(range_max(Some("0-20000")), 20_000.0);
        assert_eq!(range_max(Some("5000")), 5_000.0);
        assert_eq!(range_max(Some("1,000-2,000")), 2_000.0);
        assert_eq!(range_max(Some("lots")), 0.0);
        assert_eq!(range_max(None), 0.0);
    }

    #[test]
    fn zero_ratings_do_not_divide_by_zero() {
        assert_eq!(rating_ratios(0.0, 0.0), (0.0, 0.0));
        assert_eq!(rating_ratios(80.0, 20.0), (80.0, 20.0));
        let (pos, neg) = rating_ratios(3.0, -4.0);
        assert_eq!((pos, neg), (100.0, 0.0));
    }

    #[test]
    fn year_is_first_four_digit_run() {
        assert_eq!(extract_year(Some("2015-08-01")), Some(2015));
        assert_eq!(extract_year(Some("Aug 1, 2015")), Some(2015));
        assert_eq!(extract_year(Some("2009")), Some(2009));
        assert_eq!(extract_year(Some("12345 1999")), Some(1999));
        assert_eq!(extract_year(Some("N/A")), None);
        assert_eq!(year_or(Some("soon"), 2000), 2000);
    }

    #[test]
    fn categories_and_flags_default() {
        assert_eq!(category_or_unknown(Some(" English ")), "English");
        assert_eq!(category_or_unknown(Some("  ")), UNKNOWN);
        assert_eq!(category_or_unknown(None), UNKNOWN);
        assert!(flag(Some("True")));
        assert!(!flag(Some("False")));
        assert!(!flag(None));
    }
}
