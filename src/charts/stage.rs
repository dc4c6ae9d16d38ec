//! Mark Stage
//! Keeps the marks currently on screen and animates them between render passes.
//!
//! Entering marks grow from the baseline, updated marks move from wherever
//! they are right now, and removed marks shrink away before being dropped.

use crate::charts::reconcile::{reconcile, Reconciliation};
use crate::charts::scale::lerp_color;
use crate::charts::scene::{Mark, Shape};
use std::collections::HashMap;
use tracing::debug;

/// Cubic in-out easing on `t ∈ [0, 1]`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[derive(Debug, Clone)]
struct Track {
    from: Mark,
    to: Mark,
    start: f64,
}

impl Track {
    /// A track that has already arrived at `mark` by `now`.
    fn still(mark: Mark, now: f64, duration: f64) -> Self {
        Self {
            from: mark.clone(),
            to: mark,
            start: now - duration,
        }
    }

    fn progress(&self, now: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            1.0
        } else {
            ((now - self.start) / duration).clamp(0.0, 1.0)
        }
    }

    fn at(&self, now: f64, duration: f64) -> Mark {
        let t = ease_cubic_in_out(self.progress(now, duration));
        interpolate(&self.from, &self.to, t)
    }

    fn finished(&self, now: f64, duration: f64) -> bool {
        self.progress(now, duration) >= 1.0
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn interpolate(from: &Mark, to: &Mark, t: f64) -> Mark {
    let shape = match (from.shape, to.shape) {
        (
            Shape::Bar { x: x0, y: y0, width: w0, height: h0 },
            Shape::Bar { x: x1, y: y1, width: w1, height: h1 },
        ) => Shape::Bar {
            x: lerp(x0, x1, t),
            y: lerp(y0, y1, t),
            width: lerp(w0, w1, t),
            height: lerp(h0, h1, t),
        },
        (
            Shape::Circle { cx: x0, cy: y0, r: r0 },
            Shape::Circle { cx: x1, cy: y1, r: r1 },
        ) => Shape::Circle {
            cx: lerp(x0, x1, t),
            cy: lerp(y0, y1, t),
            r: lerp(r0, r1, t),
        },
        (_, target) => target,
    };

    Mark {
        shape,
        color: lerp_color(from.color, to.color, t as f32),
        opacity: lerp(from.opacity as f64, to.opacity as f64, t) as f32,
        ..to.clone()
    }
}

/// Collapsed, transparent version of `mark` sitting on `baseline`.
fn collapsed(mark: &Mark, baseline: f64) -> Mark {
    let shape = match mark.shape {
        Shape::Bar { x, width, .. } => Shape::Bar {
            x,
            y: baseline,
            width,
            height: 0.0,
        },
        Shape::Circle { cx, cy, .. } => Shape::Circle { cx, cy, r: 0.0 },
    };
    Mark {
        shape,
        opacity: 0.0,
        ..mark.clone()
    }
}

/// Transition store applying keyed reconciliation between passes.
#[derive(Debug, Clone)]
pub struct MarkStage {
    duration: f64,
    /// Live marks, in the order of the latest pass.
    order: Vec<String>,
    live: HashMap<String, Track>,
    leaving: Vec<Track>,
}

impl MarkStage {
    /// `duration` is in seconds.
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            order: Vec::new(),
            live: HashMap::new(),
            leaving: Vec::new(),
        }
    }

    /// Start transitions towards `marks` (in base coordinates).
    ///
    /// `baseline` is where bars grow from and collapse to.
    pub fn stage(&mut self, marks: Vec<Mark>, now: f64, baseline: f64) -> Reconciliation<String> {
        let keys: Vec<String> = marks.iter().map(|m| m.key.clone()).collect();
        let plan = reconcile(&self.order, &keys);

        for key in &plan.remove {
            if let Some(track) = self.live.remove(key) {
                let current = track.at(now, self.duration);
                let target = Mark {
                    exiting: true,
                    ..collapsed(&current, baseline)
                };
                self.leaving.push(Track {
                    from: Mark {
                        exiting: true,
                        ..current
                    },
                    to: target,
                    start: now,
                });
            }
        }

        let mut next = HashMap::with_capacity(marks.len());
        for mark in marks {
            let from = match self.live.get(&mark.key) {
                Some(track) => track.at(now, self.duration),
                None => match self.take_leaving(&mark.key) {
                    // Re-entering while still on its way out: continue from where it is.
                    Some(track) => Mark {
                        exiting: false,
                        ..track.at(now, self.duration)
                    },
                    None => collapsed(&mark, baseline),
                },
            };
            next.insert(
                mark.key.clone(),
                Track {
                    from,
                    to: mark,
                    start: now,
                },
            );
        }

        debug!(
            create = plan.create.len(),
            update = plan.update.len(),
            remove = plan.remove.len(),
            "reconciled marks"
        );

        self.live = next;
        self.order = keys;
        plan
    }

    /// Replace every mark immediately, with no transition.
    pub fn snap(&mut self, marks: Vec<Mark>, now: f64) -> Reconciliation<String> {
        let keys: Vec<String> = marks.iter().map(|m| m.key.clone()).collect();
        let plan = reconcile(&self.order, &keys);
        self.leaving.clear();
        self.order = keys;
        self.live = marks
            .into_iter()
            .map(|m| (m.key.clone(), Track::still(m, now, self.duration)))
            .collect();
        plan
    }

    fn take_leaving(&mut self, key: &str) -> Option<Track> {
        let idx = self.leaving.iter().position(|t| t.to.key == key)?;
        Some(self.leaving.remove(idx))
    }

    /// Marks to draw at `now`: exiting marks first, then live marks in pass order.
    ///
    /// Exit transitions that have finished are dropped.
    pub fn frame(&mut self, now: f64) -> Vec<Mark> {
        let duration = self.duration;
        self.leaving.retain(|t| !t.finished(now, duration));
        self.marks_at(now)
    }

    /// Same marks as [`MarkStage::frame`], without dropping anything.
    pub fn marks_at(&self, now: f64) -> Vec<Mark> {
        let duration = self.duration;
        let mut out: Vec<Mark> = self
            .leaving
            .iter()
            .filter(|t| !t.finished(now, duration))
            .map(|t| t.at(now, duration))
            .collect();
        out.extend(
            self.order
                .iter()
                .filter_map(|key| self.live.get(key))
                .map(|t| t.at(now, duration)),
        );
        out
    }

    pub fn is_animating(&self, now: f64) -> bool {
        !self.leaving.is_empty() || self.live.values().any(|t| !t.finished(now, self.duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Color32;

    fn bar(key: &str, x: f64, height: f64) -> Mark {
        Mark {
            key: key.to_string(),
            row: 0,
            shape: Shape::Bar {
                x,
                y: 100.0 - height,
                width: 10.0,
                height,
            },
            color: Color32::RED,
            opacity: 1.0,
            visible: true,
            exiting: false,
        }
    }

    fn height_of(mark: &Mark) -> f64 {
        match mark.shape {
            Shape::Bar { height, .. } => height,
            Shape::Circle { r, .. } => r,
        }
    }

    #[test]
    fn easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
    }

    #[test]
    fn entering_marks_grow_from_baseline() {
        let mut stage = MarkStage::new(1.0);
        let plan = stage.stage(vec![bar("a", 0.0, 50.0)], 0.0, 100.0);
        assert_eq!(plan.create, vec!["a".to_string()]);

        let start = stage.frame(0.0);
        assert_eq!(height_of(&start[0]), 0.0);
        assert_eq!(start[0].opacity, 0.0);

        let end = stage.frame(1.0);
        assert_eq!(height_of(&end[0]), 50.0);
        assert_eq!(end[0].opacity, 1.0);
        assert!(!stage.is_animating(1.0));
    }

    #[test]
    fn updates_start_from_current_on_screen_state() {
        let mut stage = MarkStage::new(1.0);
        stage.snap(vec![bar("a", 0.0, 20.0)], 0.0);
        stage.stage(vec![bar("a", 0.0, 80.0)], 0.0, 100.0);

        let halfway = stage.frame(0.5);
        assert!((height_of(&halfway[0]) - 50.0).abs() < 1e-9);

        // Interrupt halfway: the new transition starts at 50, not at 20 or 80.
        let plan = stage.stage(vec![bar("a", 0.0, 10.0)], 0.5, 100.0);
        assert_eq!(plan.update, vec!["a".to_string()]);
        assert!((height_of(&stage.frame(0.5)[0]) - 50.0).abs() < 1e-9);
        assert_eq!(height_of(&stage.frame(1.5)[0]), 10.0);
    }

    #[test]
    fn removed_marks_exit_then_disappear() {
        let mut stage = MarkStage::new(1.0);
        stage.snap(vec![bar("a", 0.0, 20.0), bar("b", 20.0, 30.0)], 0.0);
        let plan = stage.stage(vec![bar("b", 0.0, 30.0)], 0.0, 100.0);
        assert_eq!(plan.remove, vec!["a".to_string()]);

        let during = stage.frame(0.5);
        assert_eq!(during.len(), 2);
        assert!(during[0].exiting);
        assert_eq!(during[0].key, "a");
        assert!(stage.is_animating(0.5));

        let after = stage.frame(1.0);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].key, "b");
    }

    #[test]
    fn reentering_mark_resumes_from_exit_position() {
        let mut stage = MarkStage::new(1.0);
        stage.snap(vec![bar("a", 0.0, 40.0)], 0.0);
        stage.stage(Vec::new(), 0.0, 100.0);
        stage.stage(vec![bar("a", 0.0, 40.0)], 0.5, 100.0);

        let now = stage.frame(0.5);
        assert_eq!(now.len(), 1);
        assert!(!now[0].exiting);
        assert!((height_of(&now[0]) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn snapped_marks_are_already_at_rest() {
        let mut stage = MarkStage::new(1.0);
        stage.snap(vec![bar("a", 0.0, 40.0), bar("b", 20.0, 10.0)], 3.0);
        assert!(!stage.is_animating(3.0));

        let frame = stage.frame(3.0);
        assert_eq!(height_of(&frame[0]), 40.0);
        assert_eq!(frame[1].opacity, 1.0);
    }

    #[test]
    fn marks_at_sees_the_frame_without_pruning() {
        let mut stage = MarkStage::new(1.0);
        stage.snap(vec![bar("a", 0.0, 20.0), bar("b", 20.0, 30.0)], 0.0);
        stage.stage(vec![bar("b", 0.0, 30.0)], 0.0, 100.0);

        let during = stage.marks_at(0.5);
        assert_eq!(during.len(), 2);
        assert_eq!(during, stage.frame(0.5));

        assert_eq!(stage.marks_at(2.0).len(), 1);
        assert!(stage.is_animating(2.0));
        stage.frame(2.0);
        assert!(!stage.is_animating(2.0));
    }
}
