//! Scene Builder
//! Turns a filtered set and its scales into keyed marks and axis ticks.
//!
//! Marks are produced in base plot coordinates (origin top-left of the plot
//! area, y growing downwards). The view transform is only applied by
//! [`project`] at draw time and by the axis builder, so zooming never touches
//! the marks themselves.

use crate::charts::scale::{magnitude_domain, BandScale, ColorScale, LinearScale, ScaleSet, SqrtScale, XScale};
use crate::charts::transform::ViewTransform;
use crate::data::{Datum, FieldSpec, FilteredSet};
use crate::format;
use egui::Color32;
use std::collections::HashSet;

/// Largest circle radius of a scatter plot, in pixels.
pub const MAX_RADIUS: f64 = 18.0;
/// Radius of unsized scatter points.
pub const DEFAULT_RADIUS: f64 = 4.0;
/// Smallest radius actually drawn so tiny values stay hoverable.
pub const MIN_DRAWN_RADIUS: f64 = 1.5;

pub const NO_DATA: &str = "No data matches the current filters";

/// Main chart of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartKind<F> {
    /// One bar per record, in filtered-set order; the measure is the bar height.
    Bars,
    /// One circle per record at (`x`, measure), optionally sized by `size`.
    Scatter { x: F, size: Option<F> },
}

/// How a page maps record fields onto visual channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoding<F> {
    pub chart: ChartKind<F>,
    pub measure: F,
    /// Field fed to a percentage color scale; `None` colors by category.
    pub color_field: Option<F>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Bar { x: f64, y: f64, width: f64, height: f64 },
    Circle { cx: f64, cy: f64, r: f64 },
}

/// One visual mark, identified by its record's key.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub key: String,
    /// Index of the record in the page's record slice.
    pub row: usize,
    pub shape: Shape,
    pub color: Color32,
    pub opacity: f32,
    /// Hidden marks stay in the scene but are not drawn (outside the zoomed view).
    pub visible: bool,
    /// Set on marks playing their exit transition; they no longer react to input.
    pub exiting: bool,
}

impl Mark {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        match self.shape {
            Shape::Bar { x, y, width, height } => {
                px >= x && px <= x + width && py >= y && py <= y + height
            }
            Shape::Circle { cx, cy, r } => {
                let r = r.max(MIN_DRAWN_RADIUS);
                (px - cx).powi(2) + (py - cy).powi(2) <= r * r
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Pixel offset along the axis, view transform included.
    pub pos: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Axis {
    pub title: String,
    pub ticks: Vec<Tick>,
}

/// Everything one render pass draws.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub size: (f64, f64),
    pub marks: Vec<Mark>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    /// Set when the filtered set is empty.
    pub placeholder: Option<String>,
    /// Band labels are long and get drawn rotated.
    pub rotate_x_labels: bool,
}

/// Compute the scale set for one pass from the filtered set's observed values.
pub fn build_scales<D: Datum>(
    encoding: &Encoding<D::Field>,
    records: &[D],
    filtered: &FilteredSet,
    color: &ColorScale,
    size: (f64, f64),
) -> ScaleSet {
    let (width, height) = size;
    let y = LinearScale::new(
        magnitude_domain(filtered.iter(records).map(|r| r.value(encoding.measure))),
        (height, 0.0),
    );

    let (x, size_scale) = match encoding.chart {
        ChartKind::Bars => {
            let keys = mark_keys(records, filtered);
            (XScale::Band(BandScale::new(keys, (0.0, width))), None)
        }
        ChartKind::Scatter { x, size } => {
            let domain = magnitude_domain(filtered.iter(records).map(|r| r.value(x)));
            let size_scale = size.map(|field| {
                let (_, max) = magnitude_domain(filtered.iter(records).map(|r| r.value(field)));
                SqrtScale::new(max, MAX_RADIUS)
            });
            (XScale::Linear(LinearScale::new(domain, (0.0, width))), size_scale)
        }
    };

    ScaleSet {
        x,
        y,
        color: color.clone(),
        size: size_scale,
    }
}

/// One key per filtered row. Repeated record keys get a `#2`, `#3`, ...
/// suffix so no two marks share an identity.
pub fn mark_keys<D: Datum>(records: &[D], filtered: &FilteredSet) -> Vec<String> {
    let mut seen = HashSet::with_capacity(filtered.len());
    filtered
        .iter(records)
        .map(|record| {
            let base = record.key();
            let mut key = base.clone();
            let mut n = 1;
            while !seen.insert(key.clone()) {
                n += 1;
                key = format!("{base}#{n}");
            }
            key
        })
        .collect()
}

/// Build the marks of one pass, in base coordinates.
pub fn build_marks<D: Datum>(
    encoding: &Encoding<D::Field>,
    records: &[D],
    filtered: &FilteredSet,
    scales: &ScaleSet,
) -> Vec<Mark> {
    let color_of = |r: &D| {
        let value = encoding.color_field.map_or(0.0, |f| r.value(f));
        scales.color.color(value, r.category())
    };

    filtered
        .rows
        .iter()
        .zip(mark_keys(records, filtered))
        .enumerate()
        .map(|(i, (&row, key))| {
            let record = &records[row];
            let value = record.value(encoding.measure);
            let shape = match &scales.x {
                XScale::Band(band) => {
                    let y = scales.y.apply(value);
                    Shape::Bar {
                        x: band.position_at(i),
                        y,
                        width: band.bandwidth(),
                        height: (scales.y.range.0 - y).max(0.0),
                    }
                }
                XScale::Linear(xs) => {
                    let (x_value, radius) = match encoding.chart {
                        ChartKind::Scatter { x, size } => (
                            record.value(x),
                            size.zip(scales.size)
                                .map(|(field, s)| s.apply(record.value(field))),
                        ),
                        ChartKind::Bars => (i as f64, None),
                    };
                    Shape::Circle {
                        cx: xs.apply(x_value),
                        cy: scales.y.apply(value),
                        r: radius.unwrap_or(DEFAULT_RADIUS),
                    }
                }
            };

            Mark {
                key,
                row,
                shape,
                color: color_of(record),
                opacity: 1.0,
                visible: true,
                exiting: false,
            }
        })
        .collect()
}

/// Axis ticks for the current scales seen through `view`.
///
/// Bar charts zoom horizontally only; scatter plots zoom both axes.
pub fn build_axes<D: Datum>(
    encoding: &Encoding<D::Field>,
    records: &[D],
    filtered: &FilteredSet,
    scales: &ScaleSet,
    view: ViewTransform,
    size: (f64, f64),
) -> (Axis, Axis) {
    let (width, height) = size;

    let x_axis = match &scales.x {
        XScale::Band(band) => {
            let half = band.bandwidth() / 2.0;
            let ticks = filtered
                .iter(records)
                .enumerate()
                .map(|(i, r)| Tick {
                    pos: view.apply_x(band.position_at(i) + half),
                    label: r.label().to_string(),
                })
                .filter(|t| t.pos >= 0.0 && t.pos <= width)
                .collect();
            Axis {
                title: String::new(),
                ticks,
            }
        }
        XScale::Linear(xs) => {
            let lo = xs.invert(view.invert_x(0.0)).max(0.0);
            let hi = xs.invert(view.invert_x(width));
            let title = match encoding.chart {
                ChartKind::Scatter { x, .. } => x.label().to_string(),
                ChartKind::Bars => String::new(),
            };
            Axis {
                title,
                ticks: linear_ticks(lo, hi, |v| view.apply_x(xs.apply(v))),
            }
        }
    };

    let y_axis = match encoding.chart {
        ChartKind::Bars => Axis {
            title: encoding.measure.label().to_string(),
            ticks: linear_ticks(scales.y.domain.0, scales.y.domain.1, |v| scales.y.apply(v)),
        },
        ChartKind::Scatter { .. } => {
            let lo = scales.y.invert(view.invert_y(height)).max(0.0);
            let hi = scales.y.invert(view.invert_y(0.0));
            Axis {
                title: encoding.measure.label().to_string(),
                ticks: linear_ticks(lo, hi, |v| view.apply_y(scales.y.apply(v))),
            }
        }
    };

    (x_axis, y_axis)
}

fn linear_ticks(lo: f64, hi: f64, to_px: impl Fn(f64) -> f64) -> Vec<Tick> {
    crate::charts::scale::ticks(lo, hi, 10)
        .into_iter()
        .map(|v| Tick {
            pos: to_px(v),
            label: format::compact(v),
        })
        .collect()
}

/// Full render pass: scales, marks, axes and the empty-result placeholder.
pub fn build_scene<D: Datum>(
    encoding: &Encoding<D::Field>,
    records: &[D],
    filtered: &FilteredSet,
    color: &ColorScale,
    view: ViewTransform,
    size: (f64, f64),
) -> Scene {
    let scales = build_scales(encoding, records, filtered, color, size);
    let marks = build_marks(encoding, records, filtered, &scales);
    let (x_axis, y_axis) = build_axes(encoding, records, filtered, &scales, view, size);

    Scene {
        size,
        marks,
        x_axis,
        y_axis,
        placeholder: filtered.is_empty().then(|| NO_DATA.to_string()),
        rotate_x_labels: matches!(encoding.chart, ChartKind::Bars),
    }
}

/// Compose a base-coordinate mark with the view transform and hide it when it
/// falls outside the plot area.
pub fn project(mark: &Mark, view: ViewTransform, size: (f64, f64)) -> Mark {
    let (width, height) = size;
    let mut out = mark.clone();

    match mark.shape {
        Shape::Bar { x, y, width: w, height: h } => {
            let sx = view.apply_x(x);
            let sw = w * view.k;
            out.shape = Shape::Bar {
                x: sx,
                y,
                width: sw,
                height: h,
            };
            out.visible = mark.visible && sx + sw >= 0.0 && sx <= width;
        }
        Shape::Circle { cx, cy, r } => {
            let sx = view.apply_x(cx);
            let sy = view.apply_y(cy);
            out.shape = Shape::Circle { cx: sx, cy: sy, r };
            out.visible = mark.visible && (0.0..=width).contains(&sx) && (0.0..=height).contains(&sy);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::{toys, Toy, ToyField};
    use crate::data::filter::{apply, FilterState};
    use crate::data::Selection;

    fn bars() -> Encoding<ToyField> {
        Encoding {
            chart: ChartKind::Bars,
            measure: ToyField::Score,
            color_field: Some(ToyField::Score),
        }
    }

    fn scatter() -> Encoding<ToyField> {
        Encoding {
            chart: ChartKind::Scatter {
                x: ToyField::Year,
                size: Some(ToyField::Score),
            },
            measure: ToyField::Score,
            color_field: None,
        }
    }

    fn everything(records: &[Toy]) -> FilteredSet {
        apply(records, &FilterState::new(ToyField::Score))
    }

    #[test]
    fn bars_are_keyed_by_record_and_sit_on_baseline() {
        let records = toys();
        let scene = build_scene(
            &bars(),
            &records,
            &everything(&records),
            &ColorScale::normalized((0.0, 10.0)),
            ViewTransform::IDENTITY,
            (500.0, 300.0),
        );

        let keys: Vec<&str> = scene.marks.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "1", "2", "3", "4"]);
        for mark in &scene.marks {
            let Shape::Bar { y, height, .. } = mark.shape else {
                panic!("expected bar");
            };
            assert!((y + height - 300.0).abs() < 1e-9);
        }
        assert!(scene.placeholder.is_none());
        assert_eq!(scene.y_axis.ticks.first().map(|t| t.label.as_str()), Some("0"));
    }

    #[test]
    fn empty_set_gets_placeholder_and_fallback_domain() {
        let records = toys();
        let mut state = FilterState::new(ToyField::Score);
        state.category = Selection::Only("nobody".into());
        let filtered = apply(&records, &state);

        let scales = build_scales(&scatter(), &records, &filtered, &ColorScale::percent(), (400.0, 200.0));
        assert_eq!(scales.y.domain, (0.0, 1.0));

        let scene = build_scene(
            &scatter(),
            &records,
            &filtered,
            &ColorScale::percent(),
            ViewTransform::IDENTITY,
            (400.0, 200.0),
        );
        assert!(scene.marks.is_empty());
        assert_eq!(scene.placeholder.as_deref(), Some(NO_DATA));
    }

    #[test]
    fn largest_value_gets_largest_circle() {
        let records = toys();
        let filtered = everything(&records);
        let scales = build_scales(&scatter(), &records, &filtered, &ColorScale::percent(), (400.0, 200.0));
        let marks = build_marks(&scatter(), &records, &filtered, &scales);

        let radius = |key: &str| match marks.iter().find(|m| m.key == key).unwrap().shape {
            Shape::Circle { r, .. } => r,
            Shape::Bar { .. } => unreachable!(),
        };
        assert!(radius("1") > radius("4"));
        assert!(radius("1") <= MAX_RADIUS);
    }

    #[test]
    fn zoomed_out_of_view_marks_are_hidden_not_removed() {
        let records = toys();
        let filtered = everything(&records);
        let encoding = bars();
        let scales = build_scales(&encoding, &records, &filtered, &ColorScale::percent(), (500.0, 300.0));
        let marks = build_marks(&encoding, &records, &filtered, &scales);

        let view = ViewTransform {
            k: 5.0,
            x: 0.0,
            y: 0.0,
        };
        let projected: Vec<Mark> = marks
            .iter()
            .map(|m| project(m, view, (500.0, 300.0)))
            .collect();

        assert_eq!(projected.len(), marks.len());
        assert!(projected[0].visible);
        assert!(!projected[4].visible);
    }

    #[test]
    fn scatter_axis_domain_follows_zoom() {
        let records = toys();
        let filtered = everything(&records);
        let encoding = scatter();
        let size = (400.0, 200.0);
        let scales = build_scales(&encoding, &records, &filtered, &ColorScale::percent(), size);

        let (full, _) = build_axes(&encoding, &records, &filtered, &scales, ViewTransform::IDENTITY, size);
        let zoomed_view = ViewTransform {
            k: 4.0,
            x: 0.0,
            y: 0.0,
        };
        let (zoomed, _) = build_axes(&encoding, &records, &filtered, &scales, zoomed_view, size);

        assert_eq!(full.title, "Year");
        let last_label = |axis: &Axis| axis.ticks.last().map(|t| t.label.clone());
        assert_ne!(last_label(&full), last_label(&zoomed));
        assert!(zoomed.ticks.iter().all(|t| t.pos >= -1e-9 && t.pos <= 400.0 + 1e-9));
    }

    #[test]
    fn repeated_record_keys_get_distinct_marks() {
        let mut records = toys();
        records[2].id = 0;
        records[4].id = 0;
        let filtered = everything(&records);
        let scales = build_scales(&bars(), &records, &filtered, &ColorScale::percent(), (500.0, 300.0));
        let marks = build_marks(&bars(), &records, &filtered, &scales);

        let keys: Vec<&str> = marks.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "1", "0#2", "3", "0#3"]);
        assert_eq!(marks[2].row, 2);
    }
}
