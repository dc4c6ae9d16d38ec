//! Scale Builder
//! Maps data values to pixel positions, radii and colors.

use egui::Color32;

/// Upper bound padding applied to observed maxima of magnitude fields.
pub const MAGNITUDE_PADDING: f64 = 1.05;
/// Upper bound used when there is nothing to measure.
pub const MAGNITUDE_FALLBACK: f64 = 1.0;

/// Breakpoints of the percentage color ramp, low → high.
pub const PERCENT_BREAKPOINTS: [f64; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];

/// Viridis stops matching [`PERCENT_BREAKPOINTS`].
pub const PERCENT_STOPS: [Color32; 5] = [
    Color32::from_rgb(68, 1, 84),
    Color32::from_rgb(59, 82, 139),
    Color32::from_rgb(33, 145, 140),
    Color32::from_rgb(94, 201, 98),
    Color32::from_rgb(253, 231, 37),
];

/// Set3 qualitative palette for categories.
pub const CATEGORY_PALETTE: [Color32; 12] = [
    Color32::from_rgb(141, 211, 199),
    Color32::from_rgb(255, 255, 179),
    Color32::from_rgb(190, 186, 218),
    Color32::from_rgb(251, 128, 114),
    Color32::from_rgb(128, 177, 211),
    Color32::from_rgb(253, 180, 98),
    Color32::from_rgb(179, 222, 105),
    Color32::from_rgb(252, 205, 229),
    Color32::from_rgb(217, 217, 217),
    Color32::from_rgb(188, 128, 189),
    Color32::from_rgb(204, 235, 197),
    Color32::from_rgb(255, 237, 111),
];

/// Domain `[0, max * padding]` for a magnitude field, with a fallback for
/// empty sets and all-zero data.
pub fn magnitude_domain(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    if max.is_finite() && max > 0.0 {
        (0.0, max * MAGNITUDE_PADDING)
    } else {
        (0.0, MAGNITUDE_FALLBACK)
    }
}

/// Min and max of the finite values, if any.
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Integer tick indices and increment covering `[start, stop]` with roughly
/// `count` ticks. A negative increment means "divide by `-inc`", which keeps
/// fractional ticks exact.
fn tick_spec(start: f64, stop: f64, count: usize) -> Option<(i64, i64, f64)> {
    let raw = (stop - start) / count as f64;
    if count == 0 || !(raw.is_finite() && raw > 0.0) {
        return None;
    }

    let power = raw.log10().floor() as i32;
    let error = raw / 10f64.powi(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    if power < 0 {
        let inc = 10f64.powi(-power) / factor;
        let mut i1 = (start * inc).round() as i64;
        let mut i2 = (stop * inc).round() as i64;
        if (i1 as f64) / inc < start {
            i1 += 1;
        }
        if (i2 as f64) / inc > stop {
            i2 -= 1;
        }
        Some((i1, i2, -inc))
    } else {
        let inc = 10f64.powi(power) * factor;
        let mut i1 = (start / inc).round() as i64;
        let mut i2 = (stop / inc).round() as i64;
        if (i1 as f64) * inc < start {
            i1 += 1;
        }
        if (i2 as f64) * inc > stop {
            i2 -= 1;
        }
        Some((i1, i2, inc))
    }
}

/// Round tick values inside `[start, stop]`.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let (lo, hi) = if start <= stop { (start, stop) } else { (stop, start) };
    let Some((i1, i2, inc)) = tick_spec(lo, hi, count) else {
        return vec![lo];
    };

    (i1..=i2)
        .map(|i| if inc < 0.0 { i as f64 / -inc } else { i as f64 * inc })
        .collect()
}

/// Continuous linear mapping from a data domain to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r1 == r0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (px - r0) / (r1 - r0) * (d1 - d0)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }
}

/// Ordinal band scale for bar charts.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    keys: Vec<String>,
    range: (f64, f64),
    padding: f64,
}

impl BandScale {
    pub const DEFAULT_PADDING: f64 = 0.1;

    pub fn new(keys: Vec<String>, range: (f64, f64)) -> Self {
        Self {
            keys,
            range,
            padding: Self::DEFAULT_PADDING,
        }
    }

    fn step(&self) -> f64 {
        let n = self.keys.len() as f64;
        let span = self.range.1 - self.range.0;
        span / (n - self.padding + 2.0 * self.padding).max(1.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Left edge of the band for the `index`-th key.
    pub fn position_at(&self, index: usize) -> f64 {
        let n = self.keys.len() as f64;
        let step = self.step();
        let span = self.range.1 - self.range.0;
        let start = self.range.0 + (span - step * (n - self.padding)) * 0.5;
        start + step * index as f64
    }
}

/// Area-proportional size scale: radius grows with the square root of the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    pub domain_max: f64,
    pub max_radius: f64,
}

impl SqrtScale {
    pub fn new(domain_max: f64, max_radius: f64) -> Self {
        Self {
            domain_max,
            max_radius,
        }
    }

    pub fn apply(&self, v: f64) -> f64 {
        if self.domain_max <= 0.0 {
            return 0.0;
        }
        let t = (v / self.domain_max).clamp(0.0, 1.0);
        self.max_radius * t.sqrt()
    }
}

/// Color encoding of a mark.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    /// Percentage ramp; `input` is normalized into `[0, 100]` first.
    Percent { input: (f64, f64) },
    /// One palette entry per category, in sorted category order.
    Categorical { categories: Vec<String> },
}

impl ColorScale {
    pub fn percent() -> Self {
        ColorScale::Percent {
            input: (0.0, 100.0),
        }
    }

    /// Percentage ramp over a field that is not already a percentage.
    pub fn normalized(input: (f64, f64)) -> Self {
        ColorScale::Percent { input }
    }

    pub fn categorical(mut categories: Vec<String>) -> Self {
        categories.sort();
        categories.dedup();
        ColorScale::Categorical { categories }
    }

    pub fn color(&self, value: f64, category: &str) -> Color32 {
        match self {
            ColorScale::Percent { input } => {
                let pct = LinearScale::new(*input, (0.0, 100.0)).apply(value);
                percent_color(pct)
            }
            ColorScale::Categorical { categories } => {
                let idx = categories
                    .binary_search_by(|c| c.as_str().cmp(category))
                    .unwrap_or_else(|i| i);
                CATEGORY_PALETTE[idx % CATEGORY_PALETTE.len()]
            }
        }
    }
}

/// Interpolate the percentage ramp at `pct` (clamped to `[0, 100]`).
pub fn percent_color(pct: f64) -> Color32 {
    let pct = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
    let upper = PERCENT_BREAKPOINTS
        .iter()
        .position(|b| pct <= *b)
        .unwrap_or(PERCENT_BREAKPOINTS.len() - 1)
        .max(1);
    let lower = upper - 1;
    let t = (pct - PERCENT_BREAKPOINTS[lower])
        / (PERCENT_BREAKPOINTS[upper] - PERCENT_BREAKPOINTS[lower]);
    lerp_color(PERCENT_STOPS[lower], PERCENT_STOPS[upper], t as f32)
}

/// Component-wise interpolation in unmultiplied RGBA.
pub fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    let [ar, ag, ab, aa] = a.to_srgba_unmultiplied();
    let [br, bg, bb, ba] = b.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(mix(ar, br), mix(ag, bg), mix(ab, bb), mix(aa, ba))
}

/// Horizontal position encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Linear(LinearScale),
    Band(BandScale),
}

/// Every encoding of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSet {
    pub x: XScale,
    pub y: LinearScale,
    pub color: ColorScale,
    pub size: Option<SqrtScale>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_domain_starts_at_zero_and_covers_max() {
        let (lo, hi) = magnitude_domain([3.0, 19.99, 7.5]);
        assert_eq!(lo, 0.0);
        assert!(hi >= 19.99);
        assert!((hi - 19.99 * MAGNITUDE_PADDING).abs() < 1e-9);

        assert_eq!(magnitude_domain(Vec::new()), (0.0, MAGNITUDE_FALLBACK));
        assert_eq!(magnitude_domain([0.0, 0.0]), (0.0, MAGNITUDE_FALLBACK));
    }

    #[test]
    fn ticks_match_round_steps() {
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(ticks(0.0, 60.0, 30), (0..=30).map(|i| i as f64 * 2.0).collect::<Vec<_>>());
        assert_eq!(ticks(5.0, 5.0, 10), vec![5.0]);
    }

    #[test]
    fn linear_scale_round_trips() {
        let s = LinearScale::new((0.0, 200.0), (400.0, 0.0));
        assert_eq!(s.apply(0.0), 400.0);
        assert_eq!(s.apply(200.0), 0.0);
        assert_eq!(s.apply(50.0), 300.0);
        assert_eq!(s.invert(300.0), 50.0);
    }

    #[test]
    fn band_scale_matches_padded_layout() {
        let keys: Vec<String> = (0..4).map(|i| i.to_string()).collect();
        let band = BandScale::new(keys, (0.0, 410.0));
        // step = 410 / (4 - 0.1 + 0.2) = 100
        assert!((band.bandwidth() - 90.0).abs() < 1e-9);
        assert!((band.position_at(0) - 10.0).abs() < 1e-9);
        assert!((band.position_at(3) - 310.0).abs() < 1e-9);
    }

    #[test]
    fn sqrt_scale_is_area_proportional() {
        let s = SqrtScale::new(100.0, 20.0);
        let r1 = s.apply(25.0);
        let r2 = s.apply(100.0);
        // 4× the value → 4× the area → 2× the radius.
        assert!((r2 / r1 - 2.0).abs() < 1e-9);
        assert_eq!(s.apply(500.0), 20.0);
        assert_eq!(SqrtScale::new(0.0, 20.0).apply(5.0), 0.0);
    }

    #[test]
    fn percent_ramp_hits_stops_at_breakpoints() {
        assert_eq!(percent_color(0.0), PERCENT_STOPS[0]);
        assert_eq!(percent_color(50.0), PERCENT_STOPS[2]);
        assert_eq!(percent_color(100.0), PERCENT_STOPS[4]);
        assert_eq!(percent_color(250.0), PERCENT_STOPS[4]);
        assert_eq!(percent_color(f64::NAN), PERCENT_STOPS[0]);
    }

    #[test]
    fn categorical_colors_follow_sorted_order() {
        let scale = ColorScale::categorical(vec!["Sports".into(), "Action".into(), "Sports".into()]);
        assert_eq!(scale.color(0.0, "Action"), CATEGORY_PALETTE[0]);
        assert_eq!(scale.color(0.0, "Sports"), CATEGORY_PALETTE[1]);
    }
}
