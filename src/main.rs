//! GameData Viz - Interactive charts for Steam, Twitch and video game sales CSVs
//!
//! Each page runs the same cycle: load → derive → filter → scale → render,
//! with animated keyed transitions between renders.

mod charts;
mod config;
mod data;
mod format;
mod gui;
mod pages;
mod session;
mod stats;

use config::AppConfig;
use eframe::egui;
use gui::GameDataApp;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([1000.0, 650.0])
            .with_title("GameData Viz"),
        ..Default::default()
    };

    eframe::run_native(
        "GameData Viz",
        options,
        Box::new(|cc| Ok(Box::new(GameDataApp::new(cc, config)))),
    )
}
