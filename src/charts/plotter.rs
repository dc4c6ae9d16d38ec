//! Chart Plotter Module
//! Draws scenes and companion charts with egui / egui_plot and turns pointer
//! input on the canvas into session events.

use crate::charts::layout::{Companion, PieSlice, ScatterPoint};
use crate::charts::scale::ColorScale;
use crate::charts::scene::{Axis, Mark, Scene, Shape, MIN_DRAWN_RADIUS};
use crate::config::Margins;
use crate::format;
use crate::session::Event;
use crate::stats::FieldStats;
use egui::epaint::TextShape;
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, RichText, Sense, Stroke, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

pub const BACKGROUND: Color32 = Color32::from_rgb(24, 24, 27);
pub const AXIS_COLOR: Color32 = Color32::from_rgb(173, 173, 184);
pub const HISTOGRAM_COLOR: Color32 = Color32::from_rgb(70, 130, 180);
const PLACEHOLDER_COLOR: Color32 = Color32::from_rgb(173, 173, 184);

/// Wheel delta (points) → zoom factor exponent.
const WHEEL_ZOOM_SPEED: f32 = 0.002;
const TICK_LEN: f32 = 5.0;
const COMPANION_HEIGHT: f32 = 280.0;
/// egui_plot only fills convex polygons; pie slices are drawn in wedges no wider than this.
const MAX_WEDGE: f64 = std::f64::consts::FRAC_PI_2;
/// Arc resolution of pie wedges, in radians.
const ARC_STEP: f64 = 0.05;

/// Pointer input gathered while drawing the canvas.
pub struct CanvasResponse<F> {
    pub events: Vec<Event<F>>,
}

/// Creates the interactive chart views.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw the main chart and collect the interactions that happened on it.
    ///
    /// `marks` are already projected through the view transform.
    pub fn draw_canvas<F>(
        ui: &mut egui::Ui,
        size: Vec2,
        margins: Margins,
        scene: &Scene,
        marks: &[Mark],
        tooltip: Option<&[String]>,
    ) -> CanvasResponse<F> {
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;
        let plot_rect = Rect::from_min_max(
            rect.min + Vec2::new(margins.left, margins.top),
            rect.max - Vec2::new(margins.right, margins.bottom),
        );
        painter.rect_filled(rect, 4.0, BACKGROUND);

        let plot_painter = painter.with_clip_rect(plot_rect);
        for mark in marks.iter().filter(|m| m.visible) {
            Self::draw_mark(&plot_painter, plot_rect.min, mark);
        }

        Self::draw_x_axis(&painter, plot_rect, &scene.x_axis, scene.rotate_x_labels);
        Self::draw_y_axis(&painter, plot_rect, &scene.y_axis);

        if let Some(text) = &scene.placeholder {
            painter.text(
                plot_rect.center(),
                Align2::CENTER_CENTER,
                text,
                FontId::proportional(16.0),
                PLACEHOLDER_COLOR,
            );
        }

        let mut events = vec![Event::Resize((plot_rect.width() as f64, plot_rect.height() as f64))];
        let local = |pos: Pos2| {
            let v = pos - plot_rect.min;
            (v.x as f64, v.y as f64)
        };

        let hover = response.hover_pos().filter(|p| plot_rect.contains(*p));
        events.push(Event::Hover(hover.map(local)));

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(Event::OpenDetail(local(pos)));
            }
        }

        if response.dragged() {
            let delta = response.drag_delta();
            if delta != Vec2::ZERO {
                events.push(Event::Pan {
                    dx: delta.x as f64,
                    dy: delta.y as f64,
                });
            }
        }

        if let Some(pos) = hover {
            let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            let factor = (scroll * WHEEL_ZOOM_SPEED).exp() * pinch;
            if factor != 1.0 {
                events.push(Event::Zoom {
                    factor: factor as f64,
                    anchor: local(pos),
                });
            }
        }

        if let (Some(lines), Some(_)) = (tooltip, hover) {
            response.on_hover_ui_at_pointer(|ui| {
                if let Some((heading, rest)) = lines.split_first() {
                    ui.strong(heading);
                    for line in rest {
                        ui.label(line);
                    }
                }
            });
        }

        CanvasResponse { events }
    }

    fn draw_mark(painter: &Painter, origin: Pos2, mark: &Mark) {
        let fill = mark.color.gamma_multiply(mark.opacity.clamp(0.0, 1.0));
        match mark.shape {
            Shape::Bar { x, y, width, height } => {
                let min = origin + Vec2::new(x as f32, y as f32);
                let bar = Rect::from_min_size(min, Vec2::new(width as f32, height as f32));
                painter.rect_filled(bar, 2.0, fill);
            }
            Shape::Circle { cx, cy, r } => {
                let centre = origin + Vec2::new(cx as f32, cy as f32);
                let r = if mark.exiting { r } else { r.max(MIN_DRAWN_RADIUS) };
                painter.circle(
                    centre,
                    r as f32,
                    fill.gamma_multiply(0.8),
                    Stroke::new(0.5, Color32::WHITE.gamma_multiply(mark.opacity * 0.6)),
                );
            }
        }
    }

    fn draw_x_axis(painter: &Painter, plot: Rect, axis: &Axis, rotate: bool) {
        let stroke = Stroke::new(1.0, AXIS_COLOR);
        let font = FontId::proportional(11.0);
        painter.line_segment([plot.left_bottom(), plot.right_bottom()], stroke);

        for tick in &axis.ticks {
            let x = plot.left() + tick.pos as f32;
            let base = Pos2::new(x, plot.bottom());
            painter.line_segment([base, base + Vec2::new(0.0, TICK_LEN)], stroke);

            if rotate {
                // Rotated labels end at the tick, reading up and to the right.
                let galley = painter.layout_no_wrap(tick.label.clone(), font.clone(), AXIS_COLOR);
                let angle = -FRAC_PI_4;
                let along = Vec2::angled(angle) * galley.size().x;
                let anchor = base + Vec2::new(-4.0, TICK_LEN + 2.0) - along;
                painter.add(TextShape::new(anchor, galley, AXIS_COLOR).with_angle(angle));
            } else {
                painter.text(
                    base + Vec2::new(0.0, TICK_LEN + 2.0),
                    Align2::CENTER_TOP,
                    &tick.label,
                    font.clone(),
                    AXIS_COLOR,
                );
            }
        }

        if !axis.title.is_empty() {
            painter.text(
                Pos2::new(plot.center().x, plot.bottom() + 40.0),
                Align2::CENTER_TOP,
                &axis.title,
                FontId::proportional(13.0),
                AXIS_COLOR,
            );
        }
    }

    fn draw_y_axis(painter: &Painter, plot: Rect, axis: &Axis) {
        let stroke = Stroke::new(1.0, AXIS_COLOR);
        let grid = Stroke::new(0.5, AXIS_COLOR.gamma_multiply(0.2));
        let font = FontId::proportional(11.0);
        painter.line_segment([plot.left_top(), plot.left_bottom()], stroke);

        for tick in &axis.ticks {
            let y = plot.top() + tick.pos as f32;
            if y < plot.top() - 0.5 || y > plot.bottom() + 0.5 {
                continue;
            }
            let base = Pos2::new(plot.left(), y);
            painter.line_segment([base, Pos2::new(plot.right(), y)], grid);
            painter.line_segment([base - Vec2::new(TICK_LEN, 0.0), base], stroke);
            painter.text(
                base - Vec2::new(TICK_LEN + 3.0, 0.0),
                Align2::RIGHT_CENTER,
                &tick.label,
                font.clone(),
                AXIS_COLOR,
            );
        }

        if !axis.title.is_empty() {
            let galley = painter.layout_no_wrap(axis.title.clone(), FontId::proportional(13.0), AXIS_COLOR);
            let anchor = Pos2::new(plot.left() - 62.0, plot.center().y + galley.size().x / 2.0);
            painter.add(TextShape::new(anchor, galley, AXIS_COLOR).with_angle(-FRAC_PI_2));
        }
    }

    /// Draw statistics table
    pub fn draw_stats_table(ui: &mut egui::Ui, id: &str, stats: &[FieldStats]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("stats_table_{id}")))
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Field", "N", "Mean", "Median", "P95", "Min", "Max"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        let cell = |v: f64| {
                            if v.is_nan() {
                                "-".to_string()
                            } else {
                                format::compact(v)
                            }
                        };
                        for s in stats {
                            ui.label(RichText::new(s.field).size(11.0));
                            ui.label(RichText::new(s.count.to_string()).size(11.0));
                            for v in [s.mean, s.median, s.p95, s.min, s.max] {
                                ui.label(RichText::new(cell(v)).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    pub fn draw_companion(ui: &mut egui::Ui, id: &str, companion: &Companion) {
        ui.label(RichText::new(companion.title()).strong());
        match companion {
            Companion::Histogram { x_label, bins, .. } => {
                let bars = bins
                    .iter()
                    .map(|b| Bar::new((b.x0 + b.x1) / 2.0, b.count as f64).width(b.x1 - b.x0))
                    .collect();
                Plot::new(format!("histogram_{id}"))
                    .height(COMPANION_HEIGHT)
                    .allow_scroll(false)
                    .x_axis_label(*x_label)
                    .y_axis_label("Number of Games")
                    .show(ui, |plot_ui| {
                        plot_ui.bar_chart(BarChart::new(bars).color(HISTOGRAM_COLOR));
                    });
            }
            Companion::StackedArea { series, colors, .. } => {
                Plot::new(format!("stacked_{id}"))
                    .height(COMPANION_HEIGHT)
                    .allow_scroll(false)
                    .legend(Legend::default())
                    .x_axis_label("Year")
                    .y_axis_label("Sales (millions)")
                    .show(ui, |plot_ui| {
                        for (layer, color) in series.iter().zip(colors.iter().cycle()) {
                            let mut outline: Vec<[f64; 2]> =
                                layer.points.iter().map(|&(x, _, y1)| [x, y1]).collect();
                            outline.extend(layer.points.iter().rev().map(|&(x, y0, _)| [x, y0]));
                            plot_ui.polygon(
                                Polygon::new(PlotPoints::from(outline))
                                    .fill_color(color.gamma_multiply(0.8))
                                    .stroke(Stroke::new(1.0, *color))
                                    .name(layer.key.replace('_', " ")),
                            );
                        }
                    });
            }
            Companion::Pie { slices, label_min, .. } => {
                let colors = ColorScale::categorical(slices.iter().map(|s| s.label.clone()).collect());
                Plot::new(format!("pie_{id}"))
                    .height(COMPANION_HEIGHT)
                    .data_aspect(1.0)
                    .show_axes(false)
                    .show_grid(false)
                    .allow_drag(false)
                    .allow_zoom(false)
                    .allow_scroll(false)
                    .show(ui, |plot_ui| {
                        for slice in slices {
                            let color = colors.color(0.0, &slice.label);
                            for wedge in pie_wedges(slice) {
                                plot_ui.polygon(
                                    Polygon::new(PlotPoints::from(wedge))
                                        .fill_color(color)
                                        .stroke(Stroke::new(1.0, color))
                                        .name(&slice.label),
                                );
                            }
                            let (x, y) = polar(slice.start, 1.0);
                            plot_ui.line(
                                Line::new(PlotPoints::from(vec![[0.0, 0.0], [x, y]]))
                                    .color(BACKGROUND)
                                    .width(1.5),
                            );
                            if slice.value > *label_min {
                                let (x, y) = polar(slice.mid_angle(), 0.7);
                                plot_ui.text(Text::new(
                                    PlotPoint::new(x, y),
                                    RichText::new(format!("{}\n{:.0}%", slice.label, slice.share() * 100.0))
                                        .color(Color32::BLACK)
                                        .size(11.0),
                                ));
                            }
                        }
                    });
            }
            Companion::Scatter {
                x_label,
                y_label,
                points,
                ..
            } => {
                let categories = points.iter().map(|p| p.category.clone()).collect();
                let colors = ColorScale::categorical(categories);
                Plot::new(format!("scatter_{id}"))
                    .height(COMPANION_HEIGHT)
                    .allow_scroll(false)
                    .legend(Legend::default())
                    .x_axis_label(*x_label)
                    .y_axis_label(*y_label)
                    .show(ui, |plot_ui| {
                        for ((category, radius), coords) in group_points(points) {
                            plot_ui.points(
                                Points::new(PlotPoints::from(coords))
                                    .radius(radius)
                                    .color(colors.color(0.0, category).gamma_multiply(0.7))
                                    .name(category),
                            );
                        }
                    });
            }
        }
    }
}

/// Point on the unit circle, angle measured clockwise from 12 o'clock.
fn polar(angle: f64, radius: f64) -> (f64, f64) {
    (radius * angle.sin(), radius * angle.cos())
}

/// Convex pieces of a slice: centre plus arc, each spanning at most [`MAX_WEDGE`].
fn pie_wedges(slice: &PieSlice) -> Vec<Vec<[f64; 2]>> {
    let span = slice.end - slice.start;
    let count = (span / MAX_WEDGE).ceil().max(1.0) as usize;
    let width = span / count as f64;

    (0..count)
        .map(|w| {
            let start = slice.start + width * w as f64;
            let steps = (width / ARC_STEP).ceil().max(1.0) as usize;
            let mut outline = vec![[0.0, 0.0]];
            outline.extend((0..=steps).map(|i| {
                let (x, y) = polar(start + width * i as f64 / steps as f64, 1.0);
                [x, y]
            }));
            outline
        })
        .collect()
}

/// egui_plot draws one radius per series, so points are grouped by category
/// and radius rounded to half a pixel.
fn group_points(points: &[ScatterPoint]) -> Vec<((&str, f32), Vec<[f64; 2]>)> {
    let mut groups: BTreeMap<(&str, u32), Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        let bucket = (p.radius.max(0.5) * 2.0).round() as u32;
        groups.entry((p.category.as_str(), bucket)).or_default().push([p.x, p.y]);
    }
    groups
        .into_iter()
        .map(|((category, bucket), coords)| ((category, bucket as f32 / 2.0), coords))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn arc_span(wedge: &[[f64; 2]]) -> f64 {
        let angle = |p: &[f64; 2]| p[0].atan2(p[1]).rem_euclid(TAU);
        let (first, last) = (angle(&wedge[1]), angle(&wedge[wedge.len() - 1]));
        (last - first).rem_euclid(TAU)
    }

    #[test]
    fn large_slice_is_split_into_convex_wedges() {
        let slice = PieSlice {
            label: "Action".to_string(),
            value: 80.0,
            start: 0.0,
            end: 0.8 * TAU,
        };
        let wedges = pie_wedges(&slice);

        assert_eq!(wedges.len(), 4);
        for wedge in &wedges {
            assert_eq!(wedge[0], [0.0, 0.0]);
            assert!(arc_span(wedge) <= MAX_WEDGE + 1e-9);
        }
        let covered: f64 = wedges.iter().map(|w| arc_span(w)).sum();
        assert!((covered - slice.end).abs() < 1e-9);
    }

    #[test]
    fn small_slice_is_one_wedge() {
        let slice = PieSlice {
            label: "Puzzle".to_string(),
            value: 5.0,
            start: 1.0,
            end: 1.3,
        };
        let wedges = pie_wedges(&slice);
        assert_eq!(wedges.len(), 1);
        assert!((arc_span(&wedges[0]) - 0.3).abs() < 1e-9);
    }
}
