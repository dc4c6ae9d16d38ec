//! Aggregate Layouts
//! Histogram bins, stacked series and pie angles for the companion charts.

use crate::charts::scale::ticks;
use egui::Color32;
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// One histogram bin covering `[x0, x1)` (the last bin is closed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub x0: f64,
    pub x1: f64,
    pub count: usize,
}

/// Bin `values` over `domain`, using round tick values as thresholds.
pub fn histogram(values: &[f64], domain: (f64, f64), tick_count: usize) -> Vec<Bin> {
    let (lo, hi) = domain;
    let mut edges = vec![lo];
    edges.extend(ticks(lo, hi, tick_count).into_iter().filter(|t| *t > lo && *t < hi));
    edges.push(hi);

    let mut bins: Vec<Bin> = edges
        .windows(2)
        .map(|w| Bin {
            x0: w[0],
            x1: w[1],
            count: 0,
        })
        .collect();

    if bins.is_empty() {
        return bins;
    }

    let last = bins.len() - 1;
    for &v in values {
        if !(v >= lo && v <= hi) {
            continue;
        }
        // Index of the first edge strictly greater than `v`, minus one.
        let idx = edges.partition_point(|e| *e <= v).saturating_sub(1).min(last);
        bins[idx].count += 1;
    }
    bins
}

/// One layer of a stacked chart: `(x, y0, y1)` points in x order.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedSeries {
    pub key: String,
    pub points: Vec<(f64, f64, f64)>,
}

/// Sum `rows` per x value and stack the `keys` layers bottom to top.
///
/// `rows` yields `(x, [value per key])`; x values are sorted ascending.
pub fn stack_by<const N: usize>(
    rows: impl IntoIterator<Item = (i32, [f64; N])>,
    keys: [&str; N],
) -> Vec<StackedSeries> {
    let mut sums: BTreeMap<i32, [f64; N]> = BTreeMap::new();
    for (x, values) in rows {
        let entry = sums.entry(x).or_insert([0.0; N]);
        for (acc, v) in entry.iter_mut().zip(values) {
            *acc += v;
        }
    }

    let mut series: Vec<StackedSeries> = keys
        .iter()
        .map(|k| StackedSeries {
            key: k.to_string(),
            points: Vec::with_capacity(sums.len()),
        })
        .collect();

    for (x, values) in &sums {
        let mut base = 0.0;
        for (layer, v) in series.iter_mut().zip(values) {
            layer.points.push((*x as f64, base, base + v));
            base += v;
        }
    }
    series
}

/// One slice of a pie, angles in radians clockwise from 12 o'clock.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub start: f64,
    pub end: f64,
}

impl PieSlice {
    pub fn share(&self) -> f64 {
        (self.end - self.start) / TAU
    }

    pub fn mid_angle(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Lay slices out in the given order (no re-sorting).
pub fn pie(items: &[(String, f64)]) -> Vec<PieSlice> {
    let total: f64 = items.iter().map(|(_, v)| v.max(0.0)).sum();
    let mut angle = 0.0;

    items
        .iter()
        .map(|(label, value)| {
            let value = value.max(0.0);
            let sweep = if total > 0.0 { value / total * TAU } else { 0.0 };
            let slice = PieSlice {
                label: label.clone(),
                value,
                start: angle,
                end: angle + sweep,
            };
            angle += sweep;
            slice
        })
        .collect()
}

/// Sum `value` per label and return the groups sorted by total, descending.
pub fn totals_by_label<'a>(items: impl IntoIterator<Item = (&'a str, f64)>) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for (label, v) in items {
        *sums.entry(label).or_insert(0.0) += v;
    }

    let mut totals: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(label, v)| (label.to_string(), v))
        .collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
}

/// One point of a companion scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub category: String,
}

/// A static aggregate chart drawn under a page's main chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Companion {
    Histogram {
        title: &'static str,
        x_label: &'static str,
        bins: Vec<Bin>,
    },
    StackedArea {
        title: &'static str,
        series: Vec<StackedSeries>,
        /// One fill per layer, bottom to top.
        colors: Vec<Color32>,
    },
    Pie {
        title: &'static str,
        slices: Vec<PieSlice>,
        /// Slices below this value are drawn without a label.
        label_min: f64,
    },
    Scatter {
        title: &'static str,
        x_label: &'static str,
        y_label: &'static str,
        points: Vec<ScatterPoint>,
    },
}

impl Companion {
    pub fn title(&self) -> &'static str {
        match self {
            Companion::Histogram { title, .. }
            | Companion::StackedArea { title, .. }
            | Companion::Pie { title, .. }
            | Companion::Scatter { title, .. } => title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_uses_tick_thresholds_and_closes_last_bin() {
        let values = [0.0, 0.5, 1.0, 4.99, 5.0, 10.0];
        let bins = histogram(&values, (0.0, 10.0), 2);

        assert_eq!(bins.len(), 2);
        assert_eq!((bins[0].x0, bins[0].x1), (0.0, 5.0));
        assert_eq!(bins[0].count, 4);
        assert_eq!(bins[1].count, 2);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
    }

    #[test]
    fn histogram_with_uneven_upper_edge() {
        let bins = histogram(&[1.0, 2.5, 2.6], (0.0, 2.6), 5);
        let last = bins.last().unwrap();
        assert_eq!(last.x1, 2.6);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn stacks_accumulate_per_year() {
        let rows = vec![
            (2001, [1.0, 2.0]),
            (2000, [0.5, 0.5]),
            (2001, [1.0, 0.0]),
        ];
        let series = stack_by(rows, ["NA", "EU"]);

        assert_eq!(series[0].points, vec![(2000.0, 0.0, 0.5), (2001.0, 0.0, 2.0)]);
        assert_eq!(series[1].points, vec![(2000.0, 0.5, 1.0), (2001.0, 2.0, 4.0)]);
    }

    #[test]
    fn pie_keeps_order_and_covers_circle() {
        let slices = pie(&[("A".into(), 3.0), ("B".into(), 1.0)]);
        assert_eq!(slices[0].start, 0.0);
        assert!((slices[0].share() - 0.75).abs() < 1e-12);
        assert!((slices[1].end - TAU).abs() < 1e-12);

        let empty = pie(&[("A".into(), 0.0)]);
        assert_eq!(empty[0].end, 0.0);
    }

    #[test]
    fn totals_sorted_descending() {
        let totals = totals_by_label([("Sports", 1.0), ("Action", 3.0), ("Sports", 1.5)]);
        assert_eq!(totals, vec![("Action".to_string(), 3.0), ("Sports".to_string(), 2.5)]);
    }
}
