//! Number formatting for labels, tooltips and detail cards.

/// `1234567` → `1.2M`, `5300` → `5.3K`, smaller values as plain numbers.
pub fn compact(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.1}B", v / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        plain(v)
    }
}

/// Integers without a fraction, other values with at most two decimals.
pub fn plain(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Minutes as `"{hours}h {minutes}m"`.
pub fn minutes(total: f64) -> String {
    let total = total.max(0.0).round() as u64;
    format!("{}h {}m", total / 60, total % 60)
}

pub fn dollars(v: f64) -> String {
    if v == 0.0 {
        "Free".to_string()
    } else {
        format!("${v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_suffixes() {
        assert_eq!(compact(8_938_903.0), "8.9M");
        assert_eq!(compact(5_300.0), "5.3K");
        assert_eq!(compact(999.0), "999");
        assert_eq!(compact(0.25), "0.25");
        assert_eq!(compact(2.5e9), "2.5B");
    }

    #[test]
    fn minutes_split_into_hours() {
        assert_eq!(minutes(125.0), "2h 5m");
        assert_eq!(minutes(-4.0), "0h 0m");
    }

    #[test]
    fn prices() {
        assert_eq!(dollars(0.0), "Free");
        assert_eq!(dollars(19.99), "$19.99");
    }
}
