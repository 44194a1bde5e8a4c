use crate::element::{paint_path, Shape};
use crate::geometry::{Point, Rect};
use crate::style::ElementStyle;
use crate::surface::Pen;
use crate::viewport::Projection;
use crate::CanvasResult;

/// Rectangle with optional rounded corners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectangleShape {
    border_radius: f64,
    display_radius: f64,
}

impl RectangleShape {
    /// A rectangle whose corners are rounded by `border_radius` absolute
    /// units.
    #[must_use]
    pub fn new(border_radius: f64) -> Self {
        Self {
            border_radius,
            display_radius: border_radius,
        }
    }

    /// Corner radius in absolute units.
    #[must_use]
    pub fn border_radius(&self) -> f64 {
        self.border_radius
    }

    /// Corner radius after the last projection.
    #[must_use]
    pub fn display_radius(&self) -> f64 {
        self.display_radius
    }
}

impl Shape for RectangleShape {
    fn on_draw(&self, display: &Rect, style: &ElementStyle, pen: &mut Pen<'_>) -> CanvasResult<()> {
        if self.display_radius > 0.0 {
            trace_rounded(pen, display, self.display_radius)?;
            return paint_path(style, pen);
        }

        match style.fill() {
            Some(fill) if fill.solid_color().is_some() => pen.fill_rect(display),
            Some(fill) => tracing::debug!(?fill, "unsupported fill style skipped"),
            None => {}
        }
        if style.stroke_color().is_some() {
            pen.stroke_rect(display);
        }
        Ok(())
    }

    fn clone_for_effect(&self) -> Self {
        self.clone()
    }

    fn scale(&mut self, dimensions: &Rect, factor: f64) -> Rect {
        self.border_radius *= factor;
        dimensions.scale_about_center(factor)
    }

    fn project(&mut self, projection: &Projection) {
        self.display_radius = self.border_radius * projection.zoom.x;
    }
}

// Corners are quadratic curves with the rectangle corner as control point.
fn trace_rounded(pen: &mut Pen<'_>, r: &Rect, radius: f64) -> CanvasResult<()> {
    let radius = radius.min(r.w / 2.0).min(r.h / 2.0);
    let (left, top, right, bottom) = (r.x, r.y, r.right(), r.bottom());

    pen.begin_path();
    pen.move_to(Point::new(left + radius, top))?;
    pen.line_to(Point::new(right - radius, top))?;
    pen.quadratic_curve_to(Point::new(right, top), Point::new(right, top + radius))?;
    pen.line_to(Point::new(right, bottom - radius))?;
    pen.quadratic_curve_to(Point::new(right, bottom), Point::new(right - radius, bottom))?;
    pen.line_to(Point::new(left + radius, bottom))?;
    pen.quadratic_curve_to(Point::new(left, bottom), Point::new(left, bottom - radius))?;
    pen.line_to(Point::new(left, top + radius))?;
    pen.quadratic_curve_to(Point::new(left, top), Point::new(left + radius, top))?;
    pen.close_path()
}
