//! Absolute ↔ relative projection shared between the canvas and its elements.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// The pan/zoom state needed to project world coordinates into the
/// visible window.
///
/// `relative = (absolute - origin) * zoom` and its exact inverse
/// `absolute = relative / zoom + origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Absolute-space origin of the visible window.
    pub origin: Point,
    /// Per-axis zoom factor.
    pub zoom: Point,
}

impl Projection {
    /// Zoom 1 at the origin: relative and absolute coincide.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            origin: Point::ORIGIN,
            zoom: Point::new(1.0, 1.0),
        }
    }

    /// Project an absolute point into relative space.
    #[must_use]
    pub fn to_relative(&self, absolute: Point) -> Point {
        (absolute - self.origin).scale_by(self.zoom)
    }

    /// Project a relative point back into absolute space.
    #[must_use]
    pub fn to_absolute(&self, relative: Point) -> Point {
        relative.divide_by(self.zoom) + self.origin
    }

    /// Project an absolute rectangle into relative space.
    #[must_use]
    pub fn rect_to_relative(&self, absolute: &Rect) -> Rect {
        let origin = self.to_relative(absolute.origin());
        Rect::new(
            origin.x,
            origin.y,
            absolute.w * self.zoom.x,
            absolute.h * self.zoom.y,
        )
    }

    /// Project a relative rectangle back into absolute space.
    #[must_use]
    pub fn rect_to_absolute(&self, relative: &Rect) -> Rect {
        let origin = self.to_absolute(relative.origin());
        Rect::new(
            origin.x,
            origin.y,
            relative.w / self.zoom.x,
            relative.h / self.zoom.y,
        )
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_projection() {
        let p = Projection::identity();
        let r = Rect::new(50.0, 50.0, 20.0, 20.0);
        assert_eq!(p.rect_to_relative(&r), r);
    }

    #[test]
    fn test_projection_offsets_then_scales() {
        let p = Projection {
            origin: Point::new(10.0, 20.0),
            zoom: Point::new(2.0, 4.0),
        };
        assert_eq!(p.to_relative(Point::new(15.0, 25.0)), Point::new(10.0, 20.0));
        assert_eq!(p.to_absolute(Point::new(10.0, 20.0)), Point::new(15.0, 25.0));
        assert_eq!(
            p.rect_to_relative(&Rect::new(10.0, 20.0, 5.0, 5.0)),
            Rect::new(0.0, 0.0, 10.0, 20.0)
        );
    }
}
