//! Static Chart Renderer
//! Rasterizes the current scene (marks, axes, title) into a PNG snapshot.

use crate::charts::scene::{Mark, Scene, Shape, MIN_DRAWN_RADIUS};
use crate::config::Margins;
use anyhow::{anyhow, Context, Result};
use egui::Color32;
use image::RgbImage;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::info;

const TITLE_BAND: u32 = 36;
const TICK_LEN: i32 = 5;
const INK: RGBColor = RGBColor(60, 60, 67);
const GRID: RGBColor = RGBColor(228, 228, 231);

/// Renders chart snapshots without a window.
pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Pixel size of a snapshot of a plot area of `plot_size`.
    pub fn canvas_size(plot_size: (f64, f64), margins: Margins) -> (u32, u32) {
        let w = plot_size.0.max(1.0) + f64::from(margins.left + margins.right);
        let h = plot_size.1.max(1.0) + f64::from(margins.top + margins.bottom) + f64::from(TITLE_BAND);
        (w.ceil() as u32, h.ceil() as u32)
    }

    /// Draw `marks` (already projected) over the axes of `scene`.
    pub fn generate_chart_image(title: &str, scene: &Scene, marks: &[Mark], margins: Margins) -> Result<RgbImage> {
        let (width, height) = Self::canvas_size(scene.size, margins);
        let mut buffer = vec![0u8; (width * height * 3) as usize];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| anyhow!("plotting error: {e}"))?;

            let (header, body) = root.split_vertically(TITLE_BAND as i32);
            header
                .draw(&Text::new(
                    title.to_string(),
                    (width as i32 / 2, TITLE_BAND as i32 / 2),
                    ("sans-serif", 20)
                        .into_font()
                        .color(&INK)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                ))
                .map_err(|e| anyhow!("plotting error: {e}"))?;

            let origin = (margins.left as i32, margins.top as i32);
            Self::draw_axes(&body, scene, origin).map_err(|e| anyhow!("plotting error: {e}"))?;

            let plot = body.margin(
                margins.top as i32,
                margins.bottom as i32,
                margins.left as i32,
                margins.right as i32,
            );
            for mark in marks.iter().filter(|m| m.visible && !m.exiting) {
                Self::draw_mark(&plot, mark).map_err(|e| anyhow!("plotting error: {e}"))?;
            }

            if let Some(text) = &scene.placeholder {
                plot.draw(&Text::new(
                    text.clone(),
                    ((scene.size.0 / 2.0) as i32, (scene.size.1 / 2.0) as i32),
                    ("sans-serif", 16)
                        .into_font()
                        .color(&INK)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                ))
                .map_err(|e| anyhow!("plotting error: {e}"))?;
            }

            root.present().map_err(|e| anyhow!("plotting error: {e}"))?;
        }

        RgbImage::from_raw(width, height, buffer).context("snapshot buffer has the wrong size")
    }

    /// Render and write a PNG to `path`.
    pub fn save_png(title: &str, scene: &Scene, marks: &[Mark], margins: Margins, path: &Path) -> Result<()> {
        let img = Self::generate_chart_image(title, scene, marks, margins)?;
        img.save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), marks = marks.len(), "exported chart snapshot");
        Ok(())
    }

    fn draw_mark<DB: DrawingBackend>(
        area: &DrawingArea<DB, plotters::coord::Shift>,
        mark: &Mark,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let fill = rgb(mark.color).mix(f64::from(mark.opacity.clamp(0.0, 1.0)));
        match mark.shape {
            Shape::Bar { x, y, width, height } => area.draw(&Rectangle::new(
                [
                    (x.round() as i32, y.round() as i32),
                    ((x + width).round() as i32, (y + height).round() as i32),
                ],
                fill.filled(),
            )),
            Shape::Circle { cx, cy, r } => area.draw(&Circle::new(
                (cx.round() as i32, cy.round() as i32),
                r.max(MIN_DRAWN_RADIUS).round() as i32,
                fill.filled(),
            )),
        }
    }

    fn draw_axes<DB: DrawingBackend>(
        area: &DrawingArea<DB, plotters::coord::Shift>,
        scene: &Scene,
        (left, top): (i32, i32),
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (w, h) = (scene.size.0 as i32, scene.size.1 as i32);
        let (right, bottom) = (left + w, top + h);
        let label_font = ("sans-serif", 11).into_font().color(&INK);

        for tick in &scene.y_axis.ticks {
            let y = top + tick.pos.round() as i32;
            if y < top || y > bottom {
                continue;
            }
            area.draw(&PathElement::new(vec![(left, y), (right, y)], &GRID))?;
            area.draw(&PathElement::new(vec![(left - TICK_LEN, y), (left, y)], &INK))?;
            area.draw(&Text::new(
                tick.label.clone(),
                (left - TICK_LEN - 3, y),
                label_font.clone().pos(Pos::new(HPos::Right, VPos::Center)),
            ))?;
        }

        for tick in &scene.x_axis.ticks {
            let x = left + tick.pos.round() as i32;
            area.draw(&PathElement::new(vec![(x, bottom), (x, bottom + TICK_LEN)], &INK))?;
            let style = if scene.rotate_x_labels {
                ("sans-serif", 11)
                    .into_font()
                    .transform(FontTransform::Rotate90)
                    .color(&INK)
                    .pos(Pos::new(HPos::Left, VPos::Center))
            } else {
                label_font.clone().pos(Pos::new(HPos::Center, VPos::Top))
            };
            area.draw(&Text::new(tick.label.clone(), (x, bottom + TICK_LEN + 2), style))?;
        }

        area.draw(&PathElement::new(vec![(left, top), (left, bottom), (right, bottom)], &INK))?;

        let title_font = ("sans-serif", 13).into_font().color(&INK);
        if !scene.x_axis.title.is_empty() {
            area.draw(&Text::new(
                scene.x_axis.title.clone(),
                ((left + right) / 2, bottom + 40),
                title_font.clone().pos(Pos::new(HPos::Center, VPos::Top)),
            ))?;
        }
        if !scene.y_axis.title.is_empty() {
            area.draw(&Text::new(
                scene.y_axis.title.clone(),
                (left - 62, (top + bottom) / 2),
                ("sans-serif", 13)
                    .into_font()
                    .transform(FontTransform::Rotate270)
                    .color(&INK)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ))?;
        }
        Ok(())
    }
}

fn rgb(c: Color32) -> RGBColor {
    RGBColor(c.r(), c.g(), c.b())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_wraps_plot_in_margins_and_title() {
        let margins = Margins::default();
        let (w, h) = StaticChartRenderer::canvas_size((500.0, 300.0), margins);
        assert_eq!(w, 600);
        assert_eq!(h, 300 + 20 + 90 + TITLE_BAND);
    }

    #[test]
    fn degenerate_plot_still_has_pixels() {
        let (w, h) = StaticChartRenderer::canvas_size((0.0, 0.0), Margins::default());
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn colors_drop_alpha() {
        let c = rgb(Color32::from_rgb(1, 2, 3));
        assert_eq!((c.0, c.1, c.2), (1, 2, 3));
    }
}
