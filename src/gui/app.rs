//! GameData Viz Main Application
//! Page tabs, side control panel and chart viewer; datasets load in the background.

use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::data::{Datum, DatasetLoader, LoadError};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::pages::sales::{self, VideoGame};
use crate::pages::steam::{self, SteamGame};
use crate::pages::twitch::{self, Streamer};
use crate::pages::{PageId, PageSpec};
use crate::session::{Event, PageSession, SessionOptions};
use egui::{RichText, SidePanel, TopBottomPanel};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use tracing::{debug, error, info, warn};

/// Plot size used until the canvas reports its real size.
const INITIAL_PLOT_SIZE: (f64, f64) = (900.0, 450.0);

/// CSV loading result from background thread
enum LoadResult {
    Steam(PathBuf, Result<Vec<SteamGame>, LoadError>),
    Twitch(PathBuf, Result<Vec<Streamer>, LoadError>),
    Sales(PathBuf, Result<Vec<VideoGame>, LoadError>),
}

/// Load state of one page.
enum PageSlot<D: Datum> {
    Loading(PathBuf),
    Failed(String),
    Ready {
        source: PathBuf,
        session: PageSession<D>,
    },
}

impl<D: Datum> PageSlot<D> {
    fn source(&self) -> Option<String> {
        match self {
            PageSlot::Loading(path) | PageSlot::Ready { source: path, .. } => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string()),
            PageSlot::Failed(_) => None,
        }
    }

    /// Whether a finished load of `path` is the one this page is waiting for.
    fn awaits(&self, path: &Path) -> bool {
        matches!(self, PageSlot::Loading(pending) if pending == path)
    }
}

/// Load a CSV and derive the page's records (runs on a worker thread).
fn load_records<D: Datum>(path: &Path, spec: &PageSpec<D>) -> Result<Vec<D>, LoadError> {
    DatasetLoader::load_csv(path, spec.required_columns)?.derive::<D>()
}

/// Main application window.
pub struct GameDataApp {
    config: AppConfig,
    current: PageId,
    steam: PageSlot<SteamGame>,
    twitch: PageSlot<Streamer>,
    sales: PageSlot<VideoGame>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    load_tx: Sender<LoadResult>,
    load_rx: Receiver<LoadResult>,
}

impl GameDataApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let (load_tx, load_rx) = channel();
        let mut app = Self {
            current: PageId::Steam,
            steam: PageSlot::Loading(config.steam_path()),
            twitch: PageSlot::Loading(config.twitch_path()),
            sales: PageSlot::Loading(config.sales_path()),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(config.margins),
            load_tx,
            load_rx,
            config,
        };

        for page in PageId::ALL {
            let path = match page {
                PageId::Steam => app.config.steam_path(),
                PageId::Twitch => app.config.twitch_path(),
                PageId::Sales => app.config.sales_path(),
            };
            app.start_load(page, path);
        }
        app
    }

    fn options(&self) -> SessionOptions {
        SessionOptions {
            transition: self.config.transition_secs(),
            zoom_extent: self.config.zoom_extent,
        }
    }

    /// Load a page's CSV in a background thread.
    fn start_load(&mut self, page: PageId, path: PathBuf) {
        info!(page = page.title(), path = %path.display(), "starting load");
        let tx = self.load_tx.clone();

        match page {
            PageId::Steam => self.steam = PageSlot::Loading(path.clone()),
            PageId::Twitch => self.twitch = PageSlot::Loading(path.clone()),
            PageId::Sales => self.sales = PageSlot::Loading(path.clone()),
        }

        thread::spawn(move || {
            let result = match page {
                PageId::Steam => {
                    let records = load_records(&path, &steam::spec());
                    LoadResult::Steam(path, records)
                }
                PageId::Twitch => {
                    let records = load_records(&path, &twitch::spec());
                    LoadResult::Twitch(path, records)
                }
                PageId::Sales => {
                    let records = load_records(&path, &sales::spec());
                    LoadResult::Sales(path, records)
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self, now: f64) {
        while let Ok(result) = self.load_rx.try_recv() {
            let options = self.options();
            match result {
                LoadResult::Steam(path, records) => {
                    Self::settle(&mut self.steam, steam::spec(), path, records, options, now, &mut self.control_panel);
                }
                LoadResult::Twitch(path, records) => {
                    Self::settle(&mut self.twitch, twitch::spec(), path, records, options, now, &mut self.control_panel);
                }
                LoadResult::Sales(path, records) => {
                    Self::settle(&mut self.sales, sales::spec(), path, records, options, now, &mut self.control_panel);
                }
            }
        }
    }

    /// Store a finished load in its page, unless a newer load replaced it.
    fn settle<D: Datum>(
        slot: &mut PageSlot<D>,
        spec: PageSpec<D>,
        path: PathBuf,
        records: Result<Vec<D>, LoadError>,
        options: SessionOptions,
        now: f64,
        panel: &mut ControlPanel,
    ) {
        if !slot.awaits(&path) {
            debug!(page = spec.title, path = %path.display(), "dropping stale load result");
            return;
        }

        *slot = match records {
            Ok(records) => {
                panel.set_status(format!("Loaded {} {} records", records.len(), spec.title));
                let session = PageSession::new(spec, records, options, INITIAL_PLOT_SIZE, now);
                PageSlot::Ready { source: path, session }
            }
            Err(e) => {
                error!(page = spec.title, "{e}");
                panel.set_status(format!("Error: {e}"));
                PageSlot::Failed(e.to_string())
            }
        };
    }

    /// Handle CSV file selection for the current page
    fn handle_open_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.control_panel.set_status(format!("Loading {}...", path.display()));
            self.start_load(self.current, path);
        }
    }

    /// Export the current chart to a PNG and open it.
    fn handle_export_png<D: Datum>(
        session: &mut PageSession<D>,
        config: &AppConfig,
        panel: &mut ControlPanel,
        now: f64,
    ) {
        let file_name = format!("{}.png", session.spec().title.to_lowercase().replace(' ', "_"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(file_name)
            .save_file()
        else {
            return;
        };

        let marks = session.frame(now);
        match StaticChartRenderer::save_png(session.spec().title, session.scene(), &marks, config.margins, &path) {
            Ok(()) => {
                panel.set_status(format!("Exported {}", path.display()));
                if let Err(e) = open::that(&path) {
                    warn!(path = %path.display(), "could not open exported image: {e}");
                }
            }
            Err(e) => {
                error!("{e:#}");
                panel.set_status(format!("Export failed: {e:#}"));
            }
        }
    }

    /// Side panel and central view for one page.
    ///
    /// Returns `true` when the user asked to open another CSV.
    fn show_page<D: Datum>(
        ctx: &egui::Context,
        slot: &mut PageSlot<D>,
        config: &AppConfig,
        panel: &mut ControlPanel,
        viewer: &ChartViewer,
    ) -> bool {
        let now = ctx.input(|i| i.time);
        let source = slot.source();
        let mut open_csv = false;

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if let ControlPanelAction::OpenCsv = panel.show_header::<D::Field>(ui, source.as_deref()) {
                        open_csv = true;
                    }

                    if let PageSlot::Ready { session, .. } = slot {
                        match panel.show(ui, session) {
                            ControlPanelAction::Filter(change) => {
                                session.handle(Event::Filter(change), now);
                            }
                            ControlPanelAction::ResetZoom => {
                                session.handle(Event::ResetZoom, now);
                            }
                            ControlPanelAction::ExportPng => {
                                Self::handle_export_png(session, config, panel, now);
                            }
                            ControlPanelAction::OpenCsv => open_csv = true,
                            ControlPanelAction::None => {}
                        }
                    }

                    panel.show_status(ui);
                });
            });

        if let PageSlot::Ready { session, .. } = slot {
            viewer.show_detail(ctx, session);
        }

        egui::CentralPanel::default().show(ctx, |ui| match slot {
            PageSlot::Loading(path) => {
                ctx.request_repaint();
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                    ui.label(RichText::new(format!("Loading {}...", path.display())).size(16.0));
                });
            }
            PageSlot::Failed(message) => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new(format!("Could not load this page.\n{message}"))
                            .size(16.0)
                            .color(egui::Color32::from_rgb(220, 53, 69)),
                    );
                });
            }
            PageSlot::Ready { session, .. } => viewer.show(ui, session),
        });

        open_csv
    }
}

impl eframe::App for GameDataApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results(ctx.input(|i| i.time));

        TopBottomPanel::top("page_tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for page in PageId::ALL {
                    ui.selectable_value(&mut self.current, page, RichText::new(page.title()).size(15.0));
                }
            });
        });

        let open_csv = match self.current {
            PageId::Steam => Self::show_page(ctx, &mut self.steam, &self.config, &mut self.control_panel, &self.chart_viewer),
            PageId::Twitch => Self::show_page(ctx, &mut self.twitch, &self.config, &mut self.control_panel, &self.chart_viewer),
            PageId::Sales => Self::show_page(ctx, &mut self.sales, &self.config, &mut self.control_panel, &self.chart_viewer),
        };

        if open_csv {
            self.handle_open_csv();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::{toys, Toy};
    use crate::session::tests::toy_spec;

    fn settle(slot: &mut PageSlot<Toy>, path: &str, records: Result<Vec<Toy>, LoadError>) {
        let mut panel = ControlPanel::new();
        GameDataApp::settle(
            slot,
            toy_spec(),
            PathBuf::from(path),
            records,
            SessionOptions::default(),
            0.0,
            &mut panel,
        );
    }

    #[test]
    fn late_result_of_an_older_load_is_dropped() {
        let mut slot = PageSlot::Loading(PathBuf::from("picked.csv"));

        settle(&mut slot, "startup.csv", Ok(toys()));
        assert!(matches!(slot, PageSlot::Loading(ref p) if p == Path::new("picked.csv")));

        settle(&mut slot, "picked.csv", Ok(toys()));
        assert!(matches!(slot, PageSlot::Ready { ref source, .. } if source == Path::new("picked.csv")));

        settle(&mut slot, "startup.csv", Err(LoadError::Empty(PathBuf::from("startup.csv"))));
        assert!(matches!(slot, PageSlot::Ready { .. }));
    }

    #[test]
    fn failed_load_replaces_the_spinner() {
        let mut slot = PageSlot::Loading(PathBuf::from("steam.csv"));
        settle(&mut slot, "steam.csv", Err(LoadError::Empty(PathBuf::from("steam.csv"))));
        assert!(matches!(slot, PageSlot::Failed(ref msg) if msg.contains("steam.csv")));
        assert!(!slot.awaits(Path::new("steam.csv")));
    }
}
