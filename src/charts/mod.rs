//! Charts module - Scales, scene building, transitions and drawing

pub mod layout;
pub mod reconcile;
pub mod scale;
pub mod scene;
pub mod stage;
pub mod transform;

mod plotter;
mod renderer;

pub use plotter::{CanvasResponse, ChartPlotter};
pub use renderer::StaticChartRenderer;
