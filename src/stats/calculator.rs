//! Statistics Calculator Module
//! Summary statistics of the filtered set, recomputed on every render pass.

use crate::data::{Datum, FieldSpec, FilteredSet};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Summary of one numeric field over the filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub field: &'static str,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl FieldStats {
    fn empty(field: &'static str) -> Self {
        Self {
            field,
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            p95: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn describe(field: &'static str, values: &[f64]) -> FieldStats {
        if values.is_empty() {
            return FieldStats::empty(field);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        FieldStats {
            field,
            count: values.len(),
            mean: Statistics::mean(values),
            median: Self::percentile(&sorted, 50.0),
            p95: Self::percentile(&sorted, 95.0),
            min: Statistics::min(values),
            max: Statistics::max(values),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Statistics for every field in `fields`, in parallel, in `fields` order.
    pub fn summarize<D: Datum>(
        records: &[D],
        filtered: &FilteredSet,
        fields: &[D::Field],
    ) -> Vec<FieldStats> {
        fields
            .par_iter()
            .map(|&field| Self::describe(field.label(), &filtered.values(records, field)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::{toys, ToyField};
    use crate::data::filter::{apply, FilterState};
    use crate::data::Selection;

    #[test]
    fn describes_values() {
        let stats = StatsCalculator::describe("Price", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.p95 - 3.85).abs() < 1e-12);
        assert_eq!((stats.min, stats.max), (1.0, 4.0));
    }

    #[test]
    fn empty_input_is_nan_not_panic() {
        let stats = StatsCalculator::describe("Price", &[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.median.is_nan());
    }

    #[test]
    fn summary_follows_filtered_set() {
        let records = toys();
        let mut state = FilterState::new(ToyField::Score);
        state.category = Selection::Only("b".into());
        let filtered = apply(&records, &state);

        let stats = StatsCalculator::summarize(&records, &filtered, &[ToyField::Score, ToyField::Year]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].field, "Score");
        assert_eq!(stats[0].count, 2);
        assert!((stats[0].mean - 5.0).abs() < 1e-12);
        assert_eq!(stats[1].max, 2012.0);
    }
}
