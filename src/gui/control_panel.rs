//! Control Panel Widget
//! Left side panel with the query controls of the active page.

use crate::data::filter::TOP_N_MAX;
use crate::data::{Datum, FieldSpec, FilterEvent, Selection};
use crate::pages::ThresholdControl;
use crate::session::PageSession;
use egui::{Color32, ComboBox, RichText, Slider};

const LABEL_WIDTH: f32 = 110.0;
const COMBO_WIDTH: f32 = 160.0;
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const OK_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

/// Left side control panel; holds app-level status messages.
pub struct ControlPanel {
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Header and data source section, shown for every page state.
    pub fn show_header<F>(&self, ui: &mut egui::Ui, source: Option<&str>) -> ControlPanelAction<F> {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🎮 GameData Viz")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(source.unwrap_or("No file")).size(12.0));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Open CSV").clicked() {
                            action = ControlPanelAction::OpenCsv;
                        }
                    });
                });
            });

        action
    }

    /// Draw the controls of a loaded page.
    pub fn show<D: Datum>(&self, ui: &mut egui::Ui, session: &mut PageSession<D>) -> ControlPanelAction<D::Field> {
        let mut action = ControlPanelAction::None;
        let controls = session.spec().controls;
        let filter = session.filter().clone();

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        if let Some(label) = controls.category {
            ui.horizontal(|ui| {
                ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new(format!("{label}:")));
                let selected = match &filter.category {
                    Selection::All => "All".to_string(),
                    Selection::Only(name) => name.clone(),
                };
                ComboBox::from_id_salt("category")
                    .width(COMBO_WIDTH)
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        if ui.selectable_label(filter.category == Selection::All, "All").clicked() {
                            action = ControlPanelAction::Filter(FilterEvent::SelectCategory(Selection::All));
                        }
                        for name in session.categories() {
                            let selection = Selection::Only(name.clone());
                            if ui.selectable_label(filter.category == selection, name).clicked() {
                                action = ControlPanelAction::Filter(FilterEvent::SelectCategory(selection));
                            }
                        }
                    });
            });
            ui.add_space(5.0);
        }

        if let (Some((label, kind)), Some(threshold)) = (controls.threshold, filter.threshold) {
            ui.horizontal(|ui| {
                ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new(format!("{label}:")));
                match kind {
                    ThresholdControl::Choices(choices) => {
                        let selected = choices
                            .iter()
                            .find(|(_, v)| *v == threshold.value)
                            .map_or("Custom", |(name, _)| *name);
                        ComboBox::from_id_salt("threshold")
                            .width(COMBO_WIDTH)
                            .selected_text(selected)
                            .show_ui(ui, |ui| {
                                for (name, value) in choices {
                                    if ui.selectable_label(threshold.value == *value, *name).clicked() {
                                        action = ControlPanelAction::Filter(FilterEvent::SetThreshold(*value));
                                    }
                                }
                            });
                    }
                    ThresholdControl::Slider => {
                        let (_, max) = session.field_extent(threshold.field);
                        let mut value = threshold.value.unwrap_or(0.0);
                        let slider = Slider::new(&mut value, 0.0..=max.max(1.0))
                            .integer()
                            .custom_formatter(|v, _| crate::format::compact(v));
                        if ui.add(slider).changed() {
                            action = ControlPanelAction::Filter(FilterEvent::SetThreshold(Some(value)));
                        }
                    }
                }
            });
            ui.add_space(5.0);
        }

        if let (Some(label), Some(range)) = (controls.range, filter.range) {
            let (lo, hi) = session.field_extent(range.field);
            ui.label(format!("{label}: {} – {}", range.min, range.max));
            let mut min = range.min;
            let mut max = range.max;
            ui.horizontal(|ui| {
                ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("From:"));
                if ui.add(Slider::new(&mut min, lo..=hi).integer()).changed() {
                    action = ControlPanelAction::Filter(FilterEvent::SetRangeMin(min));
                }
            });
            ui.horizontal(|ui| {
                ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("To:"));
                if ui.add(Slider::new(&mut max, lo..=hi).integer()).changed() {
                    action = ControlPanelAction::Filter(FilterEvent::SetRangeMax(max));
                }
            });
            ui.add_space(5.0);
        }

        if !controls.measures.is_empty() {
            ui.horizontal(|ui| {
                ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("Measure:"));
                ComboBox::from_id_salt("measure")
                    .width(COMBO_WIDTH)
                    .selected_text(filter.measure.label())
                    .show_ui(ui, |ui| {
                        for field in controls.measures {
                            if ui.selectable_label(filter.measure == *field, field.label()).clicked() {
                                action = ControlPanelAction::Filter(FilterEvent::SelectMeasure(*field));
                            }
                        }
                    });
            });
            ui.add_space(5.0);
        }

        if controls.top_n {
            ui.horizontal(|ui| {
                ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("Show top:"));
                let edit = ui.add(egui::TextEdit::singleline(session.top_n_text_mut()).desired_width(60.0));
                let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Apply").clicked() || entered {
                    action = ControlPanelAction::Filter(FilterEvent::SubmitTopN(session.top_n_text().to_string()));
                }
            })
            .response
            .on_hover_text(format!("1 to {TOP_N_MAX}"));
            ui.add_space(5.0);
        }

        if !controls.sort_buttons.is_empty() || controls.sort_by_measure {
            ui.add_space(5.0);
            ui.horizontal_wrapped(|ui| {
                for field in controls.sort_buttons {
                    let active = filter.sort == Some(*field);
                    if ui.selectable_label(active, format!("Sort by {}", field.label())).clicked() {
                        action = ControlPanelAction::Filter(FilterEvent::SortBy(*field));
                    }
                }
                if controls.sort_by_measure {
                    let active = filter.sort == Some(filter.measure);
                    if ui.selectable_label(active, "Sort by selected").clicked() {
                        action = ControlPanelAction::Filter(FilterEvent::SortBy(filter.measure));
                    }
                }
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!session.view().is_identity(), |ui| {
                let button = egui::Button::new(RichText::new("🔍 Reset Zoom").size(14.0)).min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ResetZoom;
                }
            });
            ui.add_space(8.0);
            let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0)).min_size(egui::vec2(150.0, 30.0));
            if ui.add(button).clicked() {
                action = ControlPanelAction::ExportPng;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.label(
            RichText::new(format!(
                "Showing {} of {} records",
                session.filtered().len(),
                session.records().len()
            ))
            .size(11.0),
        );
        if let Some(message) = session.status() {
            ui.label(RichText::new(message).size(11.0).color(ERROR_COLOR));
        }

        action
    }

    /// App-level status line at the bottom of the panel.
    pub fn show_status(&self, ui: &mut egui::Ui) {
        let color = if self.status.contains("Error") || self.status.contains("failed") {
            ERROR_COLOR
        } else if self.status.starts_with("Exported") || self.status.starts_with("Loaded") {
            OK_COLOR
        } else {
            Color32::GRAY
        };
        ui.add_space(5.0);
        ui.label(RichText::new(&self.status).size(11.0).color(color));
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction<F> {
    None,
    Filter(FilterEvent<F>),
    ResetZoom,
    ExportPng,
    OpenCsv,
}
