//! View Transform
//! Ephemeral zoom/pan state composed with the base scales at draw time.

/// Uniform scale `k` plus translation, mapping base pixels to screen pixels:
/// `screen = base * k + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn apply_x(&self, px: f64) -> f64 {
        px * self.k + self.x
    }

    pub fn apply_y(&self, py: f64) -> f64 {
        py * self.k + self.y
    }

    pub fn invert_x(&self, sx: f64) -> f64 {
        (sx - self.x) / self.k
    }

    pub fn invert_y(&self, sy: f64) -> f64 {
        (sy - self.y) / self.k
    }

    /// Zoom by `factor` around the screen point `anchor`, keeping that point fixed.
    pub fn zoom_at(&self, factor: f64, anchor: (f64, f64), limits: ZoomLimits) -> Self {
        let k = (self.k * factor).clamp(limits.min_scale, limits.max_scale);
        let ratio = k / self.k;
        let next = Self {
            k,
            x: anchor.0 - (anchor.0 - self.x) * ratio,
            y: anchor.1 - (anchor.1 - self.y) * ratio,
        };
        next.constrain(limits)
    }

    pub fn pan(&self, dx: f64, dy: f64, limits: ZoomLimits) -> Self {
        Self {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
        .constrain(limits)
    }

    /// The same view over a plot area resized from `from` to `to`: the scale is
    /// kept and the translation follows the new size.
    pub fn rescaled(&self, from: (f64, f64), to: (f64, f64), limits: ZoomLimits) -> Self {
        let ratio = |old: f64, new: f64| if old > 0.0 { new / old } else { 1.0 };
        Self {
            k: self.k,
            x: self.x * ratio(from.0, to.0),
            y: self.y * ratio(from.1, to.1),
        }
        .constrain(limits)
    }

    /// Keep the viewport inside the plot extent: the inverse image of
    /// `[0, width] × [0, height]` never leaves the base plot area.
    fn constrain(self, limits: ZoomLimits) -> Self {
        let (w, h) = limits.extent;
        let min_x = w - w * self.k;
        let min_y = h - h * self.k;
        Self {
            k: self.k,
            x: self.x.clamp(min_x.min(0.0), 0.0),
            y: self.y.clamp(min_y.min(0.0), 0.0),
        }
    }
}

/// Allowed zoom range and the plot extent it is constrained to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min_scale: f64,
    pub max_scale: f64,
    pub extent: (f64, f64),
}

impl ZoomLimits {
    pub fn new(scale_extent: [f64; 2], extent: (f64, f64)) -> Self {
        Self {
            min_scale: scale_extent[0].max(f64::EPSILON),
            max_scale: scale_extent[1].max(scale_extent[0]),
            extent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ZoomLimits {
        ZoomLimits::new([1.0, 10.0], (800.0, 400.0))
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let t = ViewTransform::IDENTITY.zoom_at(2.0, (400.0, 200.0), limits());
        assert_eq!(t.k, 2.0);
        assert_eq!(t.apply_x(400.0), 400.0);
        assert_eq!(t.apply_y(200.0), 200.0);
        assert_eq!(t.invert_x(t.apply_x(123.0)), 123.0);
    }

    #[test]
    fn scale_is_clamped_to_extent() {
        let t = ViewTransform::IDENTITY.zoom_at(50.0, (0.0, 0.0), limits());
        assert_eq!(t.k, 10.0);
        let t = t.zoom_at(0.001, (0.0, 0.0), limits());
        assert!(t.is_identity());
    }

    #[test]
    fn pan_cannot_reveal_space_outside_plot() {
        let t = ViewTransform::IDENTITY.zoom_at(2.0, (0.0, 0.0), limits());
        let panned = t.pan(500.0, -5000.0, limits());
        // Left edge stays at base 0; bottom edge stays at base height.
        assert_eq!(panned.invert_x(0.0), 0.0);
        assert_eq!(panned.invert_y(400.0), 400.0);

        let at_identity = ViewTransform::IDENTITY.pan(30.0, 30.0, limits());
        assert!(at_identity.is_identity());
    }

    #[test]
    fn resized_view_keeps_scale_and_relative_pan() {
        let t = ViewTransform::IDENTITY.zoom_at(3.0, (400.0, 200.0), limits());
        let narrower = ZoomLimits::new([1.0, 10.0], (400.0, 400.0));
        let r = t.rescaled((800.0, 400.0), (400.0, 400.0), narrower);

        assert_eq!(r.k, 3.0);
        assert_eq!(r.x, t.x / 2.0);
        assert_eq!(r.y, t.y);
        // The same base fraction stays centred.
        assert_eq!(r.invert_x(200.0) / 400.0, t.invert_x(400.0) / 800.0);
    }
}
