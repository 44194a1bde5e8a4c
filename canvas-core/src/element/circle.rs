use crate::element::{paint_path, Shape};
use crate::geometry::{Point, Rect};
use crate::style::ElementStyle;
use crate::surface::Pen;
use crate::CanvasResult;

/// Ellipse defined by centre and per-axis radius.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleShape {
    center: Point,
    radius: Point,
}

impl CircleShape {
    /// New ellipse.
    #[must_use]
    pub fn new(center: Point, radius: Point) -> Self {
        Self { center, radius }
    }

    /// Centre in absolute space.
    #[must_use]
    pub fn center(&self) -> Point {
        self.center
    }

    /// Per-axis radius in absolute units.
    #[must_use]
    pub fn radius(&self) -> Point {
        self.radius
    }

    /// Enclosing box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius.x,
            self.center.y - self.radius.y,
            self.radius.x * 2.0,
            self.radius.y * 2.0,
        )
    }
}

impl Shape for CircleShape {
    fn on_draw(&self, display: &Rect, style: &ElementStyle, pen: &mut Pen<'_>) -> CanvasResult<()> {
        pen.begin_path();
        pen.ellipse(
            display.center(),
            Point::new(display.w / 2.0, display.h / 2.0),
        )?;
        paint_path(style, pen)
    }

    fn clone_for_effect(&self) -> Self {
        self.clone()
    }

    fn scale(&mut self, _dimensions: &Rect, factor: f64) -> Rect {
        self.radius = Point::new(self.radius.x * factor, self.radius.y * factor);
        self.bounds()
    }

    fn translate(&mut self, delta: Point) {
        self.center = self.center + delta;
    }
}
