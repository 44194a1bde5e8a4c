use crate::element::{paint_path, Shape};
use crate::geometry::{angle, distance, Extrema, Point, Rect};
use crate::style::ElementStyle;
use crate::surface::Pen;
use crate::viewport::Projection;
use crate::CanvasResult;

/// Closed filled polygon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathShape {
    points: Vec<Point>,
    display_points: Vec<Point>,
}

impl PathShape {
    /// Polygon through `points`, in absolute space.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        let display_points = points.clone();
        Self {
            points,
            display_points,
        }
    }

    /// Absolute-space vertices.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Vertices after the last projection.
    #[must_use]
    pub fn display_points(&self) -> &[Point] {
        &self.display_points
    }

    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Envelope of all vertices, `None` for an empty path.
    #[must_use]
    pub fn extrema(&self) -> Option<Extrema> {
        Extrema::from_points(self.points.iter().copied())
    }

    /// Average of the vertices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let sum = self
            .points
            .iter()
            .fold(Point::ORIGIN, |acc, p| acc + *p);
        Some(Point::new(sum.x / n, sum.y / n))
    }
}

impl Shape for PathShape {
    fn on_draw(&self, _display: &Rect, style: &ElementStyle, pen: &mut Pen<'_>) -> CanvasResult<()> {
        let [first, rest @ ..] = self.display_points.as_slice() else {
            return Ok(());
        };
        if rest.is_empty() {
            return Ok(());
        }
        pen.begin_path();
        pen.move_to(*first)?;
        for point in rest {
            pen.line_to(*point)?;
        }
        pen.close_path()?;
        paint_path(style, pen)
    }

    fn clone_for_effect(&self) -> Self {
        self.clone()
    }

    // Each vertex moves radially away from the centroid.
    fn scale(&mut self, dimensions: &Rect, factor: f64) -> Rect {
        let Some(center) = self.centroid() else {
            return *dimensions;
        };
        for point in &mut self.points {
            let reach = distance(center, *point) * factor;
            let heading = angle(center, *point).to_radians();
            *point = Point::new(
                center.x + reach * heading.cos(),
                center.y + reach * heading.sin(),
            );
        }
        self.extrema().map_or(*dimensions, |e| e.to_rect())
    }

    fn translate(&mut self, delta: Point) {
        for point in &mut self.points {
            *point = *point + delta;
        }
    }

    fn project(&mut self, projection: &Projection) {
        self.display_points = self
            .points
            .iter()
            .map(|p| projection.to_relative(*p))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn square() -> PathShape {
        PathShape::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
    }

    #[test]
    fn test_scale_is_radial_about_centroid() {
        let mut path = square();
        let bounds = path.scale(&Rect::new(0.0, 0.0, 10.0, 10.0), 2.0);
        assert!((bounds.x + 5.0).abs() < 1e-9);
        assert!((bounds.w - 20.0).abs() < 1e-9);
        assert!((bounds.h - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_draws_closed_polygon() {
        let mut surface = RecordingSurface::new();
        let mut pen = Pen::new(&mut surface);
        square()
            .on_draw(&Rect::default(), &ElementStyle::new(), &mut pen)
            .unwrap();
        let cmds = surface.commands();
        assert_eq!(cmds[0], DrawCommand::BeginPath);
        assert_eq!(cmds[1], DrawCommand::MoveTo(Point::ORIGIN));
        assert!(cmds.contains(&DrawCommand::ClosePath));
    }

    #[test]
    fn test_single_point_draws_nothing() {
        let mut surface = RecordingSurface::new();
        let mut pen = Pen::new(&mut surface);
        PathShape::new(vec![Point::ORIGIN])
            .on_draw(&Rect::default(), &ElementStyle::new(), &mut pen)
            .unwrap();
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn test_projection_moves_display_points() {
        let mut path = square();
        path.project(&Projection {
            origin: Point::new(5.0, 5.0),
            zoom: Point::new(2.0, 2.0),
        });
        assert_eq!(path.display_points()[0], Point::new(-10.0, -10.0));
        assert_eq!(path.points()[0], Point::ORIGIN);
    }
}
