//! Points, rectangles and the pure geometry helpers used by the scene graph.
//!
//! All types here are coordinate-space agnostic: the same [`Rect`] type
//! carries absolute (world), relative (viewport) and physical (pixel)
//! rectangles. Callers track which space a value belongs to.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult};

/// A 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component (grows downward).
    pub y: f64,
}

impl Point {
    /// The origin `(0, 0)`.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Multiply each axis by the matching axis of `factor`.
    #[must_use]
    pub fn scale_by(self, factor: Self) -> Self {
        Self::new(self.x * factor.x, self.y * factor.y)
    }

    /// Divide each axis by the matching axis of `divisor`.
    #[must_use]
    pub fn divide_by(self, divisor: Self) -> Self {
        Self::new(self.x / divisor.x, self.y / divisor.y)
    }

    /// Whether both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The size as a per-axis point, handy for component-wise math.
    #[must_use]
    pub const fn as_point(self) -> Point {
        Point::new(self.width, self.height)
    }

    /// Whether both extents are finite and strictly positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width, never negative for a well-formed rectangle.
    pub w: f64,
    /// Height, never negative for a well-formed rectangle.
    pub h: f64,
}

impl Rect {
    /// Create a rectangle without validation.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Create a rectangle, rejecting negative or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] for a malformed rectangle.
    pub fn try_new(x: f64, y: f64, w: f64, h: f64) -> CanvasResult<Self> {
        let rect = Self::new(x, y, w, h);
        rect.validate()?;
        Ok(rect)
    }

    /// Create a rectangle from an origin and a size.
    #[must_use]
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Check the rectangle is well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] if any component is not
    /// finite or the width/height is negative.
    pub fn validate(&self) -> CanvasResult<()> {
        if !(self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite())
        {
            return Err(CanvasError::InvalidGeometry(format!(
                "rectangle has non-finite components: {self:?}"
            )));
        }
        if self.w < 0.0 || self.h < 0.0 {
            return Err(CanvasError::InvalidGeometry(format!(
                "rectangle has negative size {}x{}",
                self.w, self.h
            )));
        }
        Ok(())
    }

    /// Top-left corner.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// The same rectangle moved by `delta`.
    #[must_use]
    pub fn translate(&self, delta: Point) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.w, self.h)
    }

    /// Resize around the centre by `factor`.
    #[must_use]
    pub fn scale_about_center(&self, factor: f64) -> Self {
        let center = self.center();
        let w = self.w * factor;
        let h = self.h * factor;
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    /// Smallest rectangle enclosing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut extrema = Extrema::from(*self);
        extrema.merge(&Extrema::from(*other));
        extrema.to_rect()
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        point_in_rect(point, self)
    }
}

/// Bounding envelope of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    /// Smallest x and y seen.
    pub min: Point,
    /// Largest x and y seen.
    pub max: Point,
}

impl Extrema {
    /// Envelope of a single point.
    #[must_use]
    pub const fn from_point(point: Point) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Envelope of all points, or `None` when the iterator is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extrema = Self::from_point(first);
        for point in iter {
            extrema.include(point);
        }
        Some(extrema)
    }

    /// Grow to include `point`.
    pub fn include(&mut self, point: Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Grow to include another envelope.
    pub fn merge(&mut self, other: &Self) {
        self.include(other.min);
        self.include(other.max);
    }

    /// The envelope as a rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.min.x,
            self.min.y,
            self.max.x - self.min.x,
            self.max.y - self.min.y,
        )
    }
}

impl From<Rect> for Extrema {
    fn from(rect: Rect) -> Self {
        Self {
            min: rect.origin(),
            max: Point::new(rect.right(), rect.bottom()),
        }
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Direction from `a` to `b` in degrees, normalised into `[0, 360)`.
///
/// Axis-aligned pairs are answered without dividing by a zero run:
/// straight down is 90, straight up 270, right 0, left 180. Coincident
/// points report 0.
#[must_use]
pub fn angle(a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    if dx == 0.0 {
        return match dy.partial_cmp(&0.0) {
            Some(std::cmp::Ordering::Greater) => 90.0,
            Some(std::cmp::Ordering::Less) => 270.0,
            _ => 0.0,
        };
    }
    if dy == 0.0 {
        return if dx > 0.0 { 0.0 } else { 180.0 };
    }

    let degrees = (dy / dx).atan().to_degrees();
    let quadrant_adjusted = if dx < 0.0 { degrees + 180.0 } else { degrees };
    quadrant_adjusted.rem_euclid(360.0)
}

/// Inclusive test of `point` against `rect`.
#[must_use]
pub fn point_in_rect(point: Point, rect: &Rect) -> bool {
    point.x >= rect.x && point.x <= rect.right() && point.y >= rect.y && point.y <= rect.bottom()
}

/// True iff every edge of `inner` lies within `outer`.
#[must_use]
pub fn rect_contains(inner: &Rect, outer: &Rect) -> bool {
    inner.x >= outer.x
        && inner.y >= outer.y
        && inner.right() <= outer.right()
        && inner.bottom() <= outer.bottom()
}

/// True iff the projections of both rectangles overlap on both axes.
/// Rectangles that only touch along an edge count as overlapping.
#[must_use]
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x <= b.right() && b.x <= a.right() && a.y <= b.bottom() && b.y <= a.bottom()
}

/// Overlap rectangle of `a` and `b`.
///
/// Callers must check [`rects_overlap`] first: disjoint inputs yield a
/// rectangle with a negative width or height, which is returned as-is.
#[must_use]
pub fn intersection(a: &Rect, b: &Rect) -> Rect {
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());
    Rect::new(x, y, right - x, bottom - y)
}
