use kurbo::{Affine, Point, Vec2};

use crate::config::ZoomLimits;

/// Pan and uniform zoom mapping tree (world) coordinates to the view.
///
/// `view = pan + zoom * world`. Zoom is always kept inside the configured
/// limits; reset returns to the identity transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: Vec2,
    limits: ZoomLimits,
}

impl Viewport {
    /// Identity viewport clamped to `limits`.
    ///
    /// Limits are normalized so that `min <= max`.
    pub fn new(limits: ZoomLimits) -> Self {
        let limits = if limits.min <= limits.max {
            limits
        } else {
            ZoomLimits {
                min: limits.max,
                max: limits.min,
            }
        };
        Viewport {
            zoom: 1.0_f64.clamp(limits.min, limits.max),
            pan: Vec2::ZERO,
            limits,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    /// Multiply the zoom by `factor`, keeping the world origin fixed.
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom_about(Point::new(self.pan.x, self.pan.y), factor);
    }

    /// Multiply the zoom by `factor` while keeping `anchor` (in view
    /// coordinates) over the same world point.
    /// Non-positive or non-finite factors are ignored.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_zoom = (self.zoom * factor).clamp(self.limits.min, self.limits.max);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let world = self.view_to_world(anchor);
        self.zoom = new_zoom;
        let moved = self.world_to_view(world);
        self.pan += anchor - moved;
    }

    /// Shift the view by a delta in view coordinates.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.pan += Vec2::new(dx, dy);
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0_f64.clamp(self.limits.min, self.limits.max);
        self.pan = Vec2::ZERO;
    }

    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    pub fn world_to_view(&self, world: Point) -> Point {
        self.transform() * world
    }

    pub fn view_to_world(&self, view: Point) -> Point {
        self.transform().inverse() * view
    }
}
