//! Chart Viewer Widget
//! Central panel with the interactive chart, statistics and companion charts,
//! plus the click-for-detail side panel.

use crate::charts::ChartPlotter;
use crate::config::Margins;
use crate::data::Datum;
use crate::session::{Event, PageSession};
use egui::{Color32, RichText, ScrollArea};
use tracing::trace;

const CHART_SPACING: f32 = 15.0;
/// Share of the panel height given to the main chart.
const CANVAS_SHARE: f32 = 0.62;
const MIN_CANVAS_HEIGHT: f32 = 320.0;
const COMPANION_WIDTH: f32 = 520.0;
const DETAIL_ACCENT: Color32 = Color32::from_rgb(145, 70, 255);

pub struct ChartViewer {
    pub margins: Margins,
}

impl ChartViewer {
    pub fn new(margins: Margins) -> Self {
        Self { margins }
    }

    /// Draw the page and route canvas interactions into the session.
    pub fn show<D: Datum>(&self, ui: &mut egui::Ui, session: &mut PageSession<D>) {
        let now = ui.input(|i| i.time);

        ui.label(RichText::new(session.spec().title).size(20.0).strong());
        ui.add_space(8.0);

        let size = egui::vec2(
            ui.available_width(),
            (ui.available_height() * CANVAS_SHARE).max(MIN_CANVAS_HEIGHT),
        );
        let marks = session.frame(now);
        let tooltip = session.hovered().map(|d| d.tooltip());

        let response = ChartPlotter::draw_canvas::<D::Field>(
            ui,
            size,
            self.margins,
            session.scene(),
            &marks,
            tooltip.as_deref(),
        );
        for event in response.events {
            let effect = session.handle(event, now);
            trace!(?effect, "canvas event");
        }

        if session.is_animating(now) {
            ui.ctx().request_repaint();
        }

        ui.add_space(CHART_SPACING);

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(RichText::new("Summary of shown records").size(14.0).strong());
                ui.add_space(5.0);
                ChartPlotter::draw_stats_table(ui, session.spec().title, session.stats());

                let companions = session.companions();
                if companions.is_empty() {
                    return;
                }
                ui.add_space(CHART_SPACING);

                let columns = ((ui.available_width() / (COMPANION_WIDTH + CHART_SPACING)).floor() as usize).max(1);
                for (row, chunk) in companions.chunks(columns).enumerate() {
                    ui.horizontal(|ui| {
                        for (col, companion) in chunk.iter().enumerate() {
                            ui.vertical(|ui| {
                                ui.set_width(COMPANION_WIDTH);
                                let id = format!("{}_{}", row, col);
                                ChartPlotter::draw_companion(ui, &id, companion);
                            });
                            ui.add_space(CHART_SPACING);
                        }
                    });
                    ui.add_space(CHART_SPACING);
                }
            });
    }

    /// Right side panel with the clicked record's cards.
    ///
    /// Must run before the central panel is laid out.
    pub fn show_detail<D: Datum>(&self, ctx: &egui::Context, session: &mut PageSession<D>) {
        let Some(record) = session.detail() else {
            return;
        };
        let cards = record.details();
        let mut close = false;

        egui::SidePanel::right("detail_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Details").size(16.0).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✕").clicked() {
                            close = true;
                        }
                    });
                });
                ui.separator();

                ScrollArea::vertical().show(ui, |ui| {
                    for card in &cards {
                        egui::Frame::none()
                            .rounding(8.0)
                            .stroke(egui::Stroke::new(1.0, DETAIL_ACCENT))
                            .fill(ui.visuals().widgets.noninteractive.bg_fill)
                            .inner_margin(10.0)
                            .show(ui, |ui| {
                                ui.set_width(ui.available_width());
                                ui.label(RichText::new(&card.title).size(11.0).color(Color32::GRAY));
                                ui.label(RichText::new(&card.value).size(18.0).strong().color(DETAIL_ACCENT));
                                if !card.subtext.is_empty() {
                                    ui.label(RichText::new(&card.subtext).size(11.0));
                                }
                            });
                        ui.add_space(8.0);
                    }
                });
            });

        if close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            let now = ctx.input(|i| i.time);
            session.handle(Event::CloseDetail, now);
        }
    }
}
