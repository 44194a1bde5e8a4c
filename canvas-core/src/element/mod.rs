//! Canvas elements - the polymorphic unit of the scene graph.
//!
//! A [`CanvasElement`] carries the state every element shares (absolute
//! dimensions, projected display dimensions, style, layer, listeners)
//! and an [`ElementKind`] holding the shape-specific part. Shapes
//! implement [`Shape`]; groups are handled in [`crate::group`].

mod circle;
mod path;
mod rectangle;
mod text;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{CanvasEvent, EventContext, EventKind, EventOutcome, ListenerMap};
use crate::geometry::{rects_overlap, Extrema, Point, Rect};
use crate::group::CanvasGroup;
use crate::style::ElementStyle;
use crate::surface::{Pen, Surfaces, TextMeasurer};
use crate::viewport::Projection;
use crate::{CanvasError, CanvasResult};

pub use circle::CircleShape;
pub use path::PathShape;
pub use rectangle::RectangleShape;
pub use text::TextShape;

/// Identifier of an element, unique within one canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Wrap a caller-chosen id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id for an effect clone of `source`.
    #[must_use]
    pub fn effect_of(source: &Self) -> Self {
        Self(format!("{}#effect-{}", source.0, Uuid::new_v4().simple()))
    }

    pub(crate) fn layer(index: i32) -> Self {
        Self(format!("__layer-{index}"))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Changes applied to an effect clone by [`CanvasElement::transform`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformDetails {
    /// Replacement fill colour.
    #[serde(default)]
    pub color: Option<String>,
    /// Uniform scale around the element's own centre.
    #[serde(default)]
    pub scale: Option<f64>,
}

impl TransformDetails {
    /// Set the replacement fill colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the scale factor.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Discriminant of an element's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ElementType {
    Rectangle,
    Text,
    Circle,
    Path,
    Group,
}

/// Non-owning handle to the canvas an element is attached to.
///
/// Carries the shared dirty flag, the current projection and the text
/// measurer. Holding one never keeps the canvas's surfaces alive.
#[derive(Clone)]
pub struct CanvasLink {
    redraw: Rc<Cell<bool>>,
    projection: Rc<Cell<Projection>>,
    measurer: Rc<dyn TextMeasurer>,
}

impl fmt::Debug for CanvasLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasLink")
            .field("needs_redraw", &self.redraw.get())
            .field("projection", &self.projection.get())
            .finish_non_exhaustive()
    }
}

impl CanvasLink {
    /// A fresh link: dirty, identity projection.
    #[must_use]
    pub fn new(measurer: Rc<dyn TextMeasurer>) -> Self {
        Self {
            redraw: Rc::new(Cell::new(true)),
            projection: Rc::new(Cell::new(Projection::identity())),
            measurer,
        }
    }

    /// Mark the canvas dirty.
    pub fn request_redraw(&self) {
        self.redraw.set(true);
    }

    /// Whether a render pass is pending.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.redraw.get()
    }

    pub(crate) fn clear_redraw(&self) {
        self.redraw.set(false);
    }

    /// The canvas's current absolute → relative projection.
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection.get()
    }

    pub(crate) fn set_projection(&self, projection: Projection) {
        self.projection.set(projection);
    }

    /// Measure `text` set in `font`.
    #[must_use]
    pub fn measure_text(&self, text: &str, font: &str) -> f64 {
        self.measurer.measure(text, font)
    }
}

/// Per-shape drawing, cloning and scaling behaviour.
pub trait Shape {
    /// Draw into `display` (relative space) with the style already applied.
    ///
    /// # Errors
    ///
    /// Propagates drawing API misuse such as path calls before
    /// `begin_path`.
    fn on_draw(&self, display: &Rect, style: &ElementStyle, pen: &mut Pen<'_>) -> CanvasResult<()>;

    /// Copy of the shape state for an effect clone.
    #[must_use]
    fn clone_for_effect(&self) -> Self
    where
        Self: Sized;

    /// Rescale by `factor` and return the new absolute dimensions.
    fn scale(&mut self, dimensions: &Rect, factor: f64) -> Rect;

    /// Follow a translation of the element's dimensions.
    fn translate(&mut self, _delta: Point) {}

    /// Recompute any display-space state from `projection`.
    fn project(&mut self, _projection: &Projection) {}
}

/// Fill and/or stroke the current path according to `style`.
pub(crate) fn paint_path(style: &ElementStyle, pen: &mut Pen<'_>) -> CanvasResult<()> {
    match style.fill() {
        Some(fill) if fill.solid_color().is_some() => pen.fill()?,
        Some(fill) => tracing::debug!(?fill, "unsupported fill style skipped"),
        None => {}
    }
    if style.stroke_color().is_some() {
        pen.stroke()?;
    }
    Ok(())
}

/// Shape-specific part of an element.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum ElementKind {
    Rectangle(RectangleShape),
    Text(TextShape),
    Circle(CircleShape),
    Path(PathShape),
    Group(CanvasGroup),
}

/// A node of the scene graph.
#[derive(Debug)]
pub struct CanvasElement {
    pub(crate) id: ElementId,
    pub(crate) dimensions: Rect,
    pub(crate) display_dimensions: Rect,
    pub(crate) layer: i32,
    pub(crate) style: ElementStyle,
    pub(crate) is_effect: bool,
    pub(crate) is_off_screen: bool,
    pub(crate) is_hover_target: bool,
    pub(crate) parent: Option<ElementId>,
    pub(crate) link: Option<CanvasLink>,
    pub(crate) listeners: ListenerMap,
    pub(crate) effect: Option<ElementId>,
    pub(crate) kind: ElementKind,
}

impl CanvasElement {
    fn with_kind(id: ElementId, dimensions: Rect, kind: ElementKind) -> Self {
        Self {
            id,
            dimensions,
            display_dimensions: dimensions,
            layer: 0,
            style: ElementStyle::new(),
            is_effect: false,
            is_off_screen: false,
            is_hover_target: false,
            parent: None,
            link: None,
            listeners: ListenerMap::default(),
            effect: None,
            kind,
        }
    }

    /// An axis-aligned rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] for negative or
    /// non-finite sizes.
    pub fn rectangle(id: impl Into<ElementId>, rect: Rect) -> CanvasResult<Self> {
        Self::rounded_rectangle(id, rect, 0.0)
    }

    /// A rectangle with rounded corners.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] for a malformed rectangle
    /// or a negative radius.
    pub fn rounded_rectangle(
        id: impl Into<ElementId>,
        rect: Rect,
        border_radius: f64,
    ) -> CanvasResult<Self> {
        rect.validate()?;
        if !border_radius.is_finite() || border_radius < 0.0 {
            return Err(CanvasError::InvalidGeometry(format!(
                "border radius must be a non-negative number, got {border_radius}"
            )));
        }
        Ok(Self::with_kind(
            id.into(),
            rect,
            ElementKind::Rectangle(RectangleShape::new(border_radius)),
        ))
    }

    /// A text label with its box's top-left corner at `origin`. The box
    /// is sized from the font once the element is attached to a canvas.
    #[must_use]
    pub fn text(id: impl Into<ElementId>, origin: Point, content: impl Into<String>) -> Self {
        let dimensions = Rect::new(origin.x, origin.y, 0.0, ElementStyle::new().font_size());
        Self::with_kind(
            id.into(),
            dimensions,
            ElementKind::Text(TextShape::new(content)),
        )
    }

    /// An ellipse given by its centre and per-axis radius.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] for a negative or
    /// non-finite radius.
    pub fn circle(id: impl Into<ElementId>, center: Point, radius: Point) -> CanvasResult<Self> {
        if !(center.is_finite() && radius.is_finite()) || radius.x < 0.0 || radius.y < 0.0 {
            return Err(CanvasError::InvalidGeometry(format!(
                "circle radius must be non-negative and finite, got {radius:?}"
            )));
        }
        let shape = CircleShape::new(center, radius);
        let dimensions = shape.bounds();
        Ok(Self::with_kind(id.into(), dimensions, ElementKind::Circle(shape)))
    }

    /// A closed polygon through `points`.
    #[must_use]
    pub fn path(id: impl Into<ElementId>, points: Vec<Point>) -> Self {
        let dimensions = Extrema::from_points(points.iter().copied())
            .map(|e| e.to_rect())
            .unwrap_or_default();
        Self::with_kind(id.into(), dimensions, ElementKind::Path(PathShape::new(points)))
    }

    /// An empty group whose children are placed relative to `reference`.
    #[must_use]
    pub fn group(id: impl Into<ElementId>, reference: Point) -> Self {
        let dimensions = Rect::new(reference.x, reference.y, 0.0, 0.0);
        Self::with_kind(
            id.into(),
            dimensions,
            ElementKind::Group(CanvasGroup::new(reference)),
        )
    }

    /// Set the draw-order layer.
    #[must_use]
    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Adjust the style while building.
    #[must_use]
    pub fn with_style(mut self, f: impl FnOnce(&mut ElementStyle)) -> Self {
        self.update_style(f);
        self
    }

    /// Element id.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Shape discriminant.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Rectangle(_) => ElementType::Rectangle,
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Circle(_) => ElementType::Circle,
            ElementKind::Path(_) => ElementType::Path,
            ElementKind::Group(_) => ElementType::Group,
        }
    }

    /// Shape-specific state.
    #[must_use]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Authoritative absolute-space bounding box.
    #[must_use]
    pub fn dimensions(&self) -> &Rect {
        &self.dimensions
    }

    /// Relative-space box from the last projection.
    #[must_use]
    pub fn display_dimensions(&self) -> &Rect {
        &self.display_dimensions
    }

    /// Draw-order layer.
    #[must_use]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    /// Style record.
    #[must_use]
    pub fn style(&self) -> &ElementStyle {
        &self.style
    }

    /// Whether this is a transient effect clone.
    #[must_use]
    pub fn is_effect(&self) -> bool {
        self.is_effect
    }

    /// Whether the last [`CanvasElement::update_dimensions`] found the
    /// element outside the viewport.
    #[must_use]
    pub fn is_off_screen(&self) -> bool {
        self.is_off_screen
    }

    /// Whether the pointer is currently over this element. For groups,
    /// true iff any child reports true.
    #[must_use]
    pub fn is_hover_target(&self) -> bool {
        match &self.kind {
            ElementKind::Group(group) => group.any_hover_target(),
            _ => self.is_hover_target,
        }
    }

    /// Id of the owning group, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&ElementId> {
        self.parent.as_ref()
    }

    /// Whether a canvas has been assigned.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.link.is_some()
    }

    /// Id of the live effect clone created by the last transform.
    #[must_use]
    pub fn effect_id(&self) -> Option<&ElementId> {
        self.effect.as_ref()
    }

    /// Mutate the style, letting the shape react to what changed.
    pub fn update_style(&mut self, f: impl FnOnce(&mut ElementStyle)) {
        f(&mut self.style);
        let changes = self.style.take_changes();
        if changes.iter().any(|p| p.affects_font()) {
            self.refresh_text_metrics();
        }
        if !changes.is_empty() {
            self.request_redraw();
        }
    }

    /// Register an event listener.
    pub fn add_event_listener<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&mut EventContext<'_>) + 'static,
    {
        self.listeners.add(kind, Box::new(listener));
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }

    /// Append a vertex to a path, growing its bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] on non-path elements and
    /// [`CanvasError::InvalidGeometry`] for non-finite points.
    pub fn add_point(&mut self, point: Point) -> CanvasResult<()> {
        if !point.is_finite() {
            return Err(CanvasError::InvalidGeometry(format!(
                "path point must be finite, got {point:?}"
            )));
        }
        let ElementKind::Path(path) = &mut self.kind else {
            return Err(CanvasError::InvalidOperation(format!(
                "add_point on non-path element {}",
                self.id
            )));
        };
        let first = path.points().is_empty();
        path.push(point);
        self.dimensions = if first {
            Rect::new(point.x, point.y, 0.0, 0.0)
        } else {
            let mut extrema = Extrema::from(self.dimensions);
            extrema.include(point);
            extrema.to_rect()
        };
        self.reproject();
        self.request_redraw();
        Ok(())
    }

    /// Recompute a path's bounding box from all of its points.
    pub fn update_extrema_from_points(&mut self) {
        let ElementKind::Path(path) = &self.kind else {
            return;
        };
        let Some(extrema) = path.extrema() else {
            return;
        };
        self.dimensions = extrema.to_rect();
        self.reproject();
        self.request_redraw();
    }

    pub(crate) fn attach(&mut self, link: &CanvasLink) {
        self.link = Some(link.clone());
        self.refresh_text_metrics();
        self.project(&link.projection());
        if let ElementKind::Group(group) = &mut self.kind {
            group.attach_children(link);
            self.refit_bounds();
            self.reproject();
        }
    }

    pub(crate) fn request_redraw(&self) {
        if let Some(link) = &self.link {
            link.request_redraw();
        }
    }

    fn current_projection(&self) -> Projection {
        self.link
            .as_ref()
            .map_or_else(Projection::identity, CanvasLink::projection)
    }

    fn reproject(&mut self) {
        let projection = self.current_projection();
        self.project(&projection);
    }

    fn project(&mut self, projection: &Projection) {
        self.display_dimensions = projection.rect_to_relative(&self.dimensions);
        match &mut self.kind {
            ElementKind::Rectangle(shape) => shape.project(projection),
            ElementKind::Text(shape) => shape.project(projection),
            ElementKind::Circle(shape) => shape.project(projection),
            ElementKind::Path(shape) => shape.project(projection),
            ElementKind::Group(_) => {}
        }
    }

    fn refresh_text_metrics(&mut self) {
        let ElementKind::Text(text) = &self.kind else {
            return;
        };
        let scale = text.scale();
        if let Some(link) = &self.link {
            let width = link.measure_text(text.content(), &self.style.font_string());
            self.dimensions.w = width * scale;
        }
        self.dimensions.h = self.style.font_size() * scale;
    }

    /// Re-project onto the viewport and recompute off-screen state.
    ///
    /// Groups first grow to cover children that resized since they were
    /// added. Groups that land off-screen leave their children's display
    /// boxes stale; they will not be drawn.
    pub fn update_dimensions(&mut self, viewport: &Rect) {
        self.refit_bounds();
        self.cull(viewport);
    }

    pub(crate) fn cull(&mut self, viewport: &Rect) {
        self.reproject();
        self.is_off_screen = !rects_overlap(viewport, &self.dimensions);
        if self.is_off_screen {
            return;
        }
        if let ElementKind::Group(group) = &mut self.kind {
            group.cull_children(viewport);
        }
    }

    /// Translate by `delta`. Effects are positioned independently and
    /// ignore this.
    pub fn adjust_dimensions(&mut self, delta: Point) {
        if self.is_effect {
            return;
        }
        self.dimensions = self.dimensions.translate(delta);
        match &mut self.kind {
            ElementKind::Rectangle(shape) => shape.translate(delta),
            ElementKind::Text(shape) => shape.translate(delta),
            ElementKind::Circle(shape) => shape.translate(delta),
            ElementKind::Path(shape) => shape.translate(delta),
            ElementKind::Group(group) => group.translate(delta),
        }
        self.reproject();
        self.request_redraw();
    }

    /// Draw onto the main surface, or the effect surface for effects.
    ///
    /// Does nothing while off-screen or detached. The surface's ambient
    /// style is restored before returning, including on error.
    ///
    /// # Errors
    ///
    /// Propagates drawing API misuse from the shape.
    pub fn draw(&mut self, surfaces: &mut Surfaces<'_>) -> CanvasResult<()> {
        if self.is_off_screen || self.link.is_none() {
            return Ok(());
        }
        if let ElementKind::Group(group) = &mut self.kind {
            return group.draw_children(surfaces);
        }

        let surface = if self.is_effect {
            &mut *surfaces.effect
        } else {
            &mut *surfaces.main
        };
        self.style.set_style(&mut *surface);
        let result = {
            let mut pen = Pen::new(&mut *surface);
            let display = &self.display_dimensions;
            match &self.kind {
                ElementKind::Rectangle(shape) => shape.on_draw(display, &self.style, &mut pen),
                ElementKind::Text(shape) => shape.on_draw(display, &self.style, &mut pen),
                ElementKind::Circle(shape) => shape.on_draw(display, &self.style, &mut pen),
                ElementKind::Path(shape) => shape.on_draw(display, &self.style, &mut pen),
                ElementKind::Group(_) => Ok(()),
            }
        };
        self.style.restore_style(&mut *surface);
        result
    }

    pub(crate) fn clone_for_effect(&self, id: ElementId) -> Self {
        let kind = match &self.kind {
            ElementKind::Rectangle(shape) => ElementKind::Rectangle(shape.clone_for_effect()),
            ElementKind::Text(shape) => ElementKind::Text(shape.clone_for_effect()),
            ElementKind::Circle(shape) => ElementKind::Circle(shape.clone_for_effect()),
            ElementKind::Path(shape) => ElementKind::Path(shape.clone_for_effect()),
            ElementKind::Group(group) => {
                let mut clone = group.clone_for_effect();
                clone.reparent(&id);
                ElementKind::Group(clone)
            }
        };
        Self {
            id,
            dimensions: self.dimensions,
            display_dimensions: self.display_dimensions,
            layer: self.layer,
            style: self.style.clone(),
            is_effect: true,
            is_off_screen: self.is_off_screen,
            is_hover_target: false,
            parent: None,
            link: None,
            listeners: ListenerMap::default(),
            effect: None,
            kind,
        }
    }

    /// Produce a recoloured/rescaled effect clone of this element.
    ///
    /// The source is left untouched apart from remembering the clone's id
    /// so a later leave/blur can ask the parent to drop it. The caller
    /// adds the clone to the same parent group (see
    /// [`CanvasElement::transform_child`]).
    pub fn transform(&mut self, details: &TransformDetails) -> CanvasElement {
        let mut clone = self.clone_for_effect(ElementId::effect_of(&self.id));
        if let Some(color) = &details.color {
            clone.recolor(color);
        }
        if let Some(factor) = details.scale {
            clone.scale(factor);
        }
        self.effect = Some(clone.id.clone());
        clone
    }

    fn recolor(&mut self, color: &str) {
        self.style.set_fill_color(color);
        self.style.take_changes();
        if let ElementKind::Group(group) = &mut self.kind {
            group.recolor_children(color);
        }
    }

    /// Rescale around the element's own centre. Only effects scale; on
    /// regular elements this is a no-op.
    pub fn scale(&mut self, factor: f64) {
        if !self.is_effect {
            return;
        }
        match &mut self.kind {
            ElementKind::Rectangle(shape) => self.dimensions = shape.scale(&self.dimensions, factor),
            ElementKind::Text(shape) => self.dimensions = shape.scale(&self.dimensions, factor),
            ElementKind::Circle(shape) => self.dimensions = shape.scale(&self.dimensions, factor),
            ElementKind::Path(shape) => self.dimensions = shape.scale(&self.dimensions, factor),
            ElementKind::Group(group) => {
                group.scale_children(factor);
                if let Some(bounds) = group.children_bounds(true) {
                    self.dimensions = bounds;
                }
            }
        }
        self.reproject();
    }

    /// Deliver an event: built-in hover bookkeeping, then listeners in
    /// registration order, then (for groups) routing to children, then a
    /// redraw request.
    pub fn handle_event(&mut self, event: &CanvasEvent) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        match event.kind {
            EventKind::Leave | EventKind::Blur => {
                outcome.remove_effect = self.effect.take();
                self.is_hover_target = false;
            }
            EventKind::Hover => self.is_hover_target = true,
            _ => {}
        }

        self.listeners.invoke(event, &self.id, &mut outcome.actions);

        if matches!(self.kind, ElementKind::Group(_)) {
            outcome.hits = self.route_to_children(event);
        } else {
            outcome.hits.push(self.id.clone());
        }

        self.request_redraw();
        outcome
    }

    /// Deliver a click at `point`.
    pub fn click(&mut self, point: Point) -> EventOutcome {
        self.handle_event(&CanvasEvent::pointer(EventKind::Click, point))
    }

    /// Deliver a hover at `point`.
    pub fn hover(&mut self, point: Point) -> EventOutcome {
        self.handle_event(&CanvasEvent::pointer(EventKind::Hover, point))
    }

    /// Deliver a leave at `point`.
    pub fn leave(&mut self, point: Point) -> EventOutcome {
        self.handle_event(&CanvasEvent::pointer(EventKind::Leave, point))
    }

    /// Deliver a right click at `point`.
    pub fn right_click(&mut self, point: Point) -> EventOutcome {
        self.handle_event(&CanvasEvent::pointer(EventKind::RightClick, point))
    }

    /// Deliver a double click at `point`.
    pub fn double_click(&mut self, point: Point) -> EventOutcome {
        self.handle_event(&CanvasEvent::pointer(EventKind::DoubleClick, point))
    }

    /// Deliver a key press.
    pub fn key_press(&mut self, key: impl Into<String>) -> EventOutcome {
        self.handle_event(&CanvasEvent::key_press(key))
    }

    /// Deliver a focus event.
    pub fn focus(&mut self) -> EventOutcome {
        self.handle_event(&CanvasEvent::focus_change(EventKind::Focus))
    }

    /// Deliver a blur event.
    pub fn blur(&mut self) -> EventOutcome {
        self.handle_event(&CanvasEvent::focus_change(EventKind::Blur))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::style::TextAlign;
    use crate::surface::{DrawCommand, DrawingSurface, FixedAdvanceMeasurer, RecordingSurface};

    fn link() -> CanvasLink {
        CanvasLink::new(Rc::new(FixedAdvanceMeasurer::default()))
    }

    fn draw(element: &mut CanvasElement) -> (RecordingSurface, RecordingSurface) {
        let mut main = RecordingSurface::new();
        let mut effect = RecordingSurface::new();
        {
            let mut surfaces = Surfaces {
                main: &mut main,
                effect: &mut effect,
            };
            element.draw(&mut surfaces).expect("draw");
        }
        (main, effect)
    }

    #[test]
    fn test_rectangle_rejects_malformed_geometry() {
        assert!(CanvasElement::rectangle("r", Rect::new(0.0, 0.0, -1.0, 1.0)).is_err());
        assert!(
            CanvasElement::rounded_rectangle("r", Rect::new(0.0, 0.0, 1.0, 1.0), -2.0).is_err()
        );
        assert!(CanvasElement::circle("c", Point::ORIGIN, Point::new(-1.0, 1.0)).is_err());
    }

    #[test]
    fn test_draw_is_noop_when_detached_or_off_screen() {
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let (main, _) = draw(&mut rect);
        assert!(main.commands().is_empty());

        rect.attach(&link());
        rect.update_dimensions(&Rect::new(500.0, 500.0, 10.0, 10.0));
        assert!(rect.is_off_screen());
        let (main, _) = draw(&mut rect);
        assert!(main.commands().is_empty());

        rect.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));
        let (main, _) = draw(&mut rect);
        assert_eq!(main.commands().len(), 1);
    }

    #[test]
    fn test_draw_restores_surface_style() {
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap()
            .with_style(|s| {
                s.set_fill_color("#ff0000");
                s.set_stroke_color(Some("#00ff00".into()));
                s.set_stroke_width(3.0);
            });
        rect.attach(&link());

        let mut main = RecordingSurface::new();
        let mut effect = RecordingSurface::new();
        let before = main.style();
        {
            let mut surfaces = Surfaces {
                main: &mut main,
                effect: &mut effect,
            };
            rect.draw(&mut surfaces).unwrap();
        }
        assert_eq!(main.style(), before);
        assert!(main.commands().contains(&DrawCommand::FillRect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            style: "#ff0000".into()
        }));
    }

    #[test]
    fn test_text_measures_on_attach_and_font_change() {
        let mut text = CanvasElement::text("t", Point::new(5.0, 5.0), "abcd")
            .with_style(|s| s.set_font_size(10.0));
        assert!((text.dimensions().h - 10.0).abs() < 1e-9);
        assert!(text.dimensions().w.abs() < 1e-9);

        text.attach(&link());
        assert!((text.dimensions().w - 20.0).abs() < 1e-9);

        text.update_style(|s| s.set_font_size(20.0));
        assert!((text.dimensions().w - 40.0).abs() < 1e-9);
        assert!((text.dimensions().h - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_draws_at_baseline_with_alignment() {
        let mut text = CanvasElement::text("t", Point::new(0.0, 0.0), "ab")
            .with_style(|s| {
                s.set_font_size(10.0);
                s.set_text_align(TextAlign::Center);
            });
        text.attach(&link());
        let (main, _) = draw(&mut text);
        let DrawCommand::FillText { at, font, .. } = &main.commands()[0] else {
            panic!("expected text, got {:?}", main.commands());
        };
        assert_eq!(*at, Point::new(5.0, 10.0));
        assert_eq!(font, "10px sans-serif");
    }

    #[test]
    fn test_adjust_dimensions_skips_effects() {
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let mut effect = rect.transform(&TransformDetails::default());
        effect.adjust_dimensions(Point::new(5.0, 5.0));
        assert_eq!(*effect.dimensions(), Rect::new(0.0, 0.0, 10.0, 10.0));

        rect.adjust_dimensions(Point::new(5.0, 5.0));
        assert_eq!(*rect.dimensions(), Rect::new(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn test_transform_leaves_source_untouched() {
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let effect = rect.transform(
            &TransformDetails::default()
                .with_color("#ffff00")
                .with_scale(2.0),
        );
        assert!(effect.is_effect());
        assert_eq!(effect.style().fill_color(), Some("#ffff00"));
        assert_eq!(*effect.dimensions(), Rect::new(-5.0, -5.0, 20.0, 20.0));
        assert_eq!(*rect.dimensions(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(rect.style().fill_color(), Some("#000000"));
        assert_eq!(rect.effect_id(), Some(effect.id()));
    }

    #[test]
    fn test_scale_is_noop_for_regular_elements() {
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        rect.scale(3.0);
        assert_eq!(*rect.dimensions(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_leave_requests_effect_removal() {
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        rect.hover(Point::new(1.0, 1.0));
        assert!(rect.is_hover_target());
        let effect = rect.transform(&TransformDetails::default());

        let outcome = rect.leave(Point::new(50.0, 50.0));
        assert!(!rect.is_hover_target());
        assert_eq!(outcome.remove_effect.as_ref(), Some(effect.id()));
        assert!(rect.effect_id().is_none());
    }

    #[test]
    fn test_events_invoke_listeners_and_mark_dirty() {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let sink = Rc::clone(&clicks);
        rect.add_event_listener(EventKind::Click, move |ctx| {
            sink.borrow_mut().push(ctx.point());
        });
        let link = link();
        rect.attach(&link);
        link.clear_redraw();

        let outcome = rect.click(Point::new(2.0, 3.0));
        assert_eq!(*clicks.borrow(), vec![Point::new(2.0, 3.0)]);
        assert_eq!(outcome.hits, vec![ElementId::from("r")]);
        assert!(link.needs_redraw());

        rect.right_click(Point::ORIGIN);
        assert_eq!(clicks.borrow().len(), 1);
    }

    #[test]
    fn test_path_add_point_grows_bounds() {
        let mut path = CanvasElement::path("p", Vec::new());
        path.add_point(Point::new(1.0, 1.0)).unwrap();
        assert_eq!(*path.dimensions(), Rect::new(1.0, 1.0, 0.0, 0.0));
        path.add_point(Point::new(4.0, -2.0)).unwrap();
        path.add_point(Point::new(-1.0, 3.0)).unwrap();
        assert_eq!(*path.dimensions(), Rect::new(-1.0, -2.0, 5.0, 5.0));

        let mut rect = CanvasElement::rectangle("r", Rect::default()).unwrap();
        assert!(matches!(
            rect.add_point(Point::ORIGIN),
            Err(CanvasError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_path_bulk_extrema_reprojects_and_redraws() {
        let link = link();
        link.set_projection(Projection {
            origin: Point::ORIGIN,
            zoom: Point::new(2.0, 2.0),
        });
        let mut path = CanvasElement::path("p", vec![Point::ORIGIN, Point::new(2.0, 1.0)]);
        path.attach(&link);
        link.clear_redraw();

        if let ElementKind::Path(shape) = &mut path.kind {
            shape.push(Point::new(5.0, 4.0));
        }
        path.update_extrema_from_points();
        assert_eq!(*path.dimensions(), Rect::new(0.0, 0.0, 5.0, 4.0));
        assert_eq!(*path.display_dimensions(), Rect::new(0.0, 0.0, 10.0, 8.0));
        assert!(link.needs_redraw());
    }

    #[test]
    fn test_text_glyphs_fit_box_under_uneven_zoom() {
        let link = link();
        link.set_projection(Projection {
            origin: Point::ORIGIN,
            zoom: Point::new(1.0, 2.0),
        });
        let mut text = CanvasElement::text("t", Point::ORIGIN, "ab")
            .with_style(|s| s.set_font_size(10.0));
        text.attach(&link);
        assert_eq!(*text.display_dimensions(), Rect::new(0.0, 0.0, 10.0, 20.0));

        let (main, _) = draw(&mut text);
        let DrawCommand::FillText { font, .. } = &main.commands()[0] else {
            panic!("expected text, got {:?}", main.commands());
        };
        // 2 glyphs × 10px × 0.5 advance fill the 10px-wide box exactly
        assert_eq!(font, "10px sans-serif");
    }

    #[test]
    fn test_effect_draws_on_effect_surface() {
        let mut rect = CanvasElement::rectangle("r", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let mut effect = rect.transform(&TransformDetails::default());
        effect.attach(&link());
        let (main, fx) = draw(&mut effect);
        assert!(main.commands().is_empty());
        assert_eq!(fx.commands().len(), 1);
    }
}
