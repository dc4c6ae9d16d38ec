//! Page Session
//! Owns one page's state and runs the load → filter → scale → render cycle.
//!
//! Every UI interaction is an [`Event`] fed through [`PageSession::handle`].
//! Query controls go through the pure [`FilterState::reduce`] and trigger a
//! full render cycle; zoom, pan, hover and the detail panel only touch view
//! state. Nothing here knows about egui widgets.

use crate::charts::layout::Companion;
use crate::charts::reconcile::Reconciliation;
use crate::charts::scale::{extent, ColorScale};
use crate::charts::scene::{build_axes, build_scales, build_scene, project, Encoding, Mark, Scene};
use crate::charts::stage::MarkStage;
use crate::charts::transform::{ViewTransform, ZoomLimits};
use crate::data::filter::apply;
use crate::data::{Datum, FilterEvent, FilterState, FilteredSet, ValidationError};
use crate::pages::{categories, PageSpec};
use crate::stats::{FieldStats, StatsCalculator};
use std::sync::Arc;
use tracing::{debug, warn};

/// One interaction with a page. Positions are in plot-area pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<F> {
    Filter(FilterEvent<F>),
    /// Pointer moved over the plot; `None` when it left.
    Hover(Option<(f64, f64)>),
    OpenDetail((f64, f64)),
    CloseDetail,
    Zoom { factor: f64, anchor: (f64, f64) },
    Pan { dx: f64, dy: f64 },
    ResetZoom,
    Resize((f64, f64)),
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A full render cycle ran.
    Rendered(Reconciliation<String>),
    /// Only the view (zoom, hover, detail panel) changed.
    ViewChanged,
    /// The control value was rejected; state is unchanged.
    Rejected(ValidationError),
    Unchanged,
}

/// Per-page knobs coming from the app configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Transition length, in seconds.
    pub transition: f64,
    pub zoom_extent: [f64; 2],
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            transition: 0.75,
            zoom_extent: [1.0, 10.0],
        }
    }
}

pub struct PageSession<D: Datum> {
    spec: PageSpec<D>,
    records: Arc<[D]>,
    categories: Vec<String>,
    color: ColorScale,
    filter: FilterState<D::Field>,
    filtered: FilteredSet,
    scene: Scene,
    stage: MarkStage,
    view: ViewTransform,
    options: SessionOptions,
    size: (f64, f64),
    hover: Option<usize>,
    detail: Option<usize>,
    /// Text shown in the top-N field; reverted on rejected input.
    top_n_text: String,
    status: Option<String>,
    stats: Vec<FieldStats>,
    companions: Vec<Companion>,
}

impl<D: Datum> PageSession<D> {
    /// Start a session over freshly derived records and run the first cycle.
    pub fn new(spec: PageSpec<D>, records: Vec<D>, options: SessionOptions, size: (f64, f64), now: f64) -> Self {
        let filter = (spec.defaults)(&records);
        let color = (spec.color)(&records);
        let categories = categories(&records);

        let mut session = Self {
            spec,
            records: records.into(),
            categories,
            color,
            top_n_text: accepted_top_n(&filter),
            filter,
            filtered: FilteredSet::default(),
            scene: Scene::default(),
            stage: MarkStage::new(options.transition),
            view: ViewTransform::IDENTITY,
            options,
            size,
            hover: None,
            detail: None,
            status: None,
            stats: Vec::new(),
            companions: Vec::new(),
        };
        session.render(now, true);
        session
    }

    pub fn handle(&mut self, event: Event<D::Field>, now: f64) -> Effect {
        match event {
            Event::Filter(change) => match self.filter.reduce(change) {
                Ok(next) => {
                    self.filter = next;
                    self.top_n_text = accepted_top_n(&self.filter);
                    self.status = None;
                    Effect::Rendered(self.render(now, true))
                }
                Err(e) => {
                    warn!(page = self.spec.title, "rejected control value: {e}");
                    self.top_n_text = accepted_top_n(&self.filter);
                    self.status = Some(e.to_string());
                    Effect::Rejected(e)
                }
            },
            Event::Hover(pos) => {
                let hover = pos.and_then(|(x, y)| self.hit(x, y, now));
                if hover == self.hover {
                    Effect::Unchanged
                } else {
                    self.hover = hover;
                    Effect::ViewChanged
                }
            }
            Event::OpenDetail((x, y)) => match self.hit(x, y, now) {
                Some(row) => {
                    self.detail = Some(row);
                    Effect::ViewChanged
                }
                None => Effect::Unchanged,
            },
            Event::CloseDetail => {
                self.detail = None;
                Effect::ViewChanged
            }
            Event::Zoom { factor, anchor } => {
                let view = self.view.zoom_at(factor, anchor, self.zoom_limits());
                self.set_view(view)
            }
            Event::Pan { dx, dy } => {
                let view = self.view.pan(dx, dy, self.zoom_limits());
                self.set_view(view)
            }
            Event::ResetZoom => self.set_view(ViewTransform::IDENTITY),
            Event::Resize(size) => {
                if size == self.size {
                    return Effect::Unchanged;
                }
                let view = self
                    .view
                    .rescaled(self.size, size, ZoomLimits::new(self.options.zoom_extent, size));
                self.size = size;
                // Marks still entering or moving keep animating towards the new layout.
                let animate = self.stage.is_animating(now);
                let plan = self.render(now, animate);
                self.set_view(view);
                Effect::Rendered(plan)
            }
        }
    }

    /// Full render cycle from the current filter state. Resets zoom.
    ///
    /// Without `animate` the marks jump straight to their new place.
    fn render(&mut self, now: f64, animate: bool) -> Reconciliation<String> {
        let encoding = self.encoding();
        self.view = ViewTransform::IDENTITY;
        self.filtered = apply(&self.records, &self.filter);
        self.scene = build_scene(&encoding, &self.records, &self.filtered, &self.color, self.view, self.size);

        if self.scene.placeholder.is_some() {
            warn!(page = self.spec.title, "no records match the current filters");
        }

        if self.hover.is_some_and(|row| !self.filtered.rows.contains(&row)) {
            self.hover = None;
        }

        self.stats = StatsCalculator::summarize(&self.records, &self.filtered, self.spec.stats_fields);
        self.companions = (self.spec.companions)(&self.records, &self.filtered);

        let marks = self.scene.marks.clone();
        let plan = if animate {
            self.stage.stage(marks, now, self.size.1)
        } else {
            self.stage.snap(marks, now)
        };
        debug!(
            page = self.spec.title,
            shown = self.filtered.len(),
            total = self.records.len(),
            keys_changed = !plan.is_noop(),
            "render cycle"
        );
        plan
    }

    /// Change the view transform and rebuild the axes; marks stay as they are.
    fn set_view(&mut self, view: ViewTransform) -> Effect {
        if view == self.view {
            return Effect::Unchanged;
        }
        self.view = view;

        let encoding = self.encoding();
        let scales = build_scales(&encoding, &self.records, &self.filtered, &self.color, self.size);
        let (x_axis, y_axis) = build_axes(&encoding, &self.records, &self.filtered, &scales, view, self.size);
        self.scene.x_axis = x_axis;
        self.scene.y_axis = y_axis;
        Effect::ViewChanged
    }

    fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::new(self.options.zoom_extent, self.size)
    }

    /// Topmost visible mark under a plot-area point, as drawn at `now`.
    fn hit(&self, x: f64, y: f64, now: f64) -> Option<usize> {
        self.stage
            .marks_at(now)
            .iter()
            .rev()
            .filter(|m| !m.exiting)
            .map(|m| project(m, self.view, self.size))
            .find(|m| m.visible && m.contains(x, y))
            .map(|m| m.row)
    }

    /// The page encoding with the currently selected measure.
    pub fn encoding(&self) -> Encoding<D::Field> {
        Encoding {
            measure: self.filter.measure,
            ..self.spec.encoding
        }
    }

    /// Marks to draw at `now`, in screen coordinates of the plot area.
    pub fn frame(&mut self, now: f64) -> Vec<Mark> {
        let (view, size) = (self.view, self.size);
        self.stage
            .frame(now)
            .iter()
            .map(|m| project(m, view, size))
            .collect()
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.stage.is_animating(now)
    }

    pub fn spec(&self) -> &PageSpec<D> {
        &self.spec
    }

    pub fn records(&self) -> &[D] {
        &self.records
    }

    pub fn filter(&self) -> &FilterState<D::Field> {
        &self.filter
    }

    pub fn filtered(&self) -> &FilteredSet {
        &self.filtered
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn stats(&self) -> &[FieldStats] {
        &self.stats
    }

    pub fn companions(&self) -> &[Companion] {
        &self.companions
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn top_n_text(&self) -> &str {
        &self.top_n_text
    }

    /// Editable top-N text; only [`FilterEvent::SubmitTopN`] applies it.
    pub fn top_n_text_mut(&mut self) -> &mut String {
        &mut self.top_n_text
    }

    pub fn hovered(&self) -> Option<&D> {
        self.hover.map(|row| &self.records[row])
    }

    pub fn detail(&self) -> Option<&D> {
        self.detail.map(|row| &self.records[row])
    }

    /// Min and max of a field across the whole dataset (slider bounds).
    pub fn field_extent(&self, field: D::Field) -> (f64, f64) {
        extent(self.records.iter().map(|r| r.value(field))).unwrap_or((0.0, 0.0))
    }
}

fn accepted_top_n<F>(filter: &FilterState<F>) -> String {
    filter.top_n.map(|n| n.get().to_string()).unwrap_or_default()
}
