//! The viewport controller: layers, pan/zoom, coordinate spaces and the
//! dirty-flag render pass.
//!
//! Three coordinate spaces are in play:
//!
//! * **physical** - pixels on the host document, offset by the surface's
//!   on-document bounds and scaled by `pixel_size / bounds.size`;
//! * **relative** - backing-store pixels of the visible window;
//! * **absolute** - permanent element coordinates.
//!
//! `relative = (absolute - view.origin) * zoom`. The visible window in
//! absolute units is the relative view rectangle, whose size is always
//! `pixel_size / zoom`.
//!
//! Pointer events are routed with the point exactly as delivered; groups
//! hit-test it against their children's display (relative) boxes.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::CanvasConfig;
use crate::element::{CanvasElement, CanvasLink, ElementId, TransformDetails};
use crate::group::CanvasGroup;
use crate::event::{CanvasEvent, EventAction, EventKind};
use crate::geometry::{Point, Rect, Size};
use crate::surface::{
    DrawingSurface, FixedAdvanceMeasurer, RecordingSurface, Surfaces, TextMeasurer,
};
use crate::viewport::Projection;
use crate::{CanvasError, CanvasResult};

type RenderHook = Box<dyn FnMut(&Rect)>;

/// A layered, zoomable canvas drawing onto a main and an effect surface.
pub struct Html5Canvas<S: DrawingSurface> {
    main: S,
    effect: S,
    config: CanvasConfig,
    pixel_size: Size,
    surface_bounds: Rect,
    relative_view: Rect,
    zoom: Point,
    absolute: Option<Rect>,
    layers: BTreeMap<i32, CanvasElement>,
    link: CanvasLink,
    focused: Option<ElementId>,
    drag_anchor: Option<Point>,
    before_render: Option<RenderHook>,
}

impl<S: DrawingSurface> std::fmt::Debug for Html5Canvas<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Html5Canvas")
            .field("pixel_size", &self.pixel_size)
            .field("surface_bounds", &self.surface_bounds)
            .field("relative_view", &self.relative_view)
            .field("zoom", &self.zoom)
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .field("needs_redraw", &self.link.needs_redraw())
            .finish_non_exhaustive()
    }
}

impl Html5Canvas<RecordingSurface> {
    /// A canvas over in-memory recording surfaces with fixed-advance text
    /// measurement, for tests and headless use.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] for an invalid config.
    pub fn recording(config: CanvasConfig) -> CanvasResult<Self> {
        Self::new(
            RecordingSurface::new(),
            RecordingSurface::new(),
            config,
            Rc::new(FixedAdvanceMeasurer::default()),
        )
    }
}

impl<S: DrawingSurface> Html5Canvas<S> {
    /// Build a canvas over `main` and `effect` surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] for an invalid config.
    pub fn new(
        main: S,
        effect: S,
        config: CanvasConfig,
        measurer: Rc<dyn TextMeasurer>,
    ) -> CanvasResult<Self> {
        config.validate()?;
        let pixel_size = config.pixel_size;
        let full = Rect::from_origin_size(Point::ORIGIN, pixel_size);
        let surface_bounds = config.surface_bounds.unwrap_or(full);
        let relative_view = config.initial_view.unwrap_or(full);
        let zoom = pixel_size
            .as_point()
            .divide_by(relative_view.size().as_point());

        let canvas = Self {
            main,
            effect,
            config,
            pixel_size,
            surface_bounds,
            relative_view,
            zoom,
            absolute: None,
            layers: BTreeMap::new(),
            link: CanvasLink::new(measurer),
            focused: None,
            drag_anchor: None,
            before_render: None,
        };
        canvas.sync_projection();
        tracing::debug!(?pixel_size, ?relative_view, "canvas created");
        Ok(canvas)
    }

    fn sync_projection(&self) {
        self.link.set_projection(self.projection());
    }

    fn invalidate(&self) {
        self.link.request_redraw();
    }

    /// Current absolute → relative projection.
    #[must_use]
    pub fn projection(&self) -> Projection {
        Projection {
            origin: self.relative_view.origin(),
            zoom: self.zoom,
        }
    }

    /// The visible window, in absolute units.
    #[must_use]
    pub fn relative_view(&self) -> &Rect {
        &self.relative_view
    }

    /// Per-axis zoom factor.
    #[must_use]
    pub fn zoom_factor(&self) -> Point {
        self.zoom
    }

    /// Backing-store size of the surfaces.
    #[must_use]
    pub fn pixel_size(&self) -> Size {
        self.pixel_size
    }

    /// On-document position and displayed size of the surface.
    #[must_use]
    pub fn surface_bounds(&self) -> &Rect {
        &self.surface_bounds
    }

    /// Union of everything ever added, `None` while empty.
    #[must_use]
    pub fn absolute_dimensions(&self) -> Option<&Rect> {
        self.absolute.as_ref()
    }

    /// Whether a render pass is pending.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.link.needs_redraw()
    }

    /// Force the next frame to redraw.
    pub fn request_redraw(&self) {
        self.invalidate();
    }

    /// The main drawing surface.
    #[must_use]
    pub fn main_surface(&self) -> &S {
        &self.main
    }

    /// The effect drawing surface.
    #[must_use]
    pub fn effect_surface(&self) -> &S {
        &self.effect
    }

    /// Mutable access to the main surface.
    pub fn main_surface_mut(&mut self) -> &mut S {
        &mut self.main
    }

    /// Mutable access to the effect surface.
    pub fn effect_surface_mut(&mut self) -> &mut S {
        &mut self.effect
    }

    /// Indices of the layers created so far, ascending.
    pub fn layer_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.layers.keys().copied()
    }

    /// The group backing layer `index`.
    #[must_use]
    pub fn layer(&self, index: i32) -> Option<&CanvasElement> {
        self.layers.get(&index)
    }

    /// Id of the focused element.
    #[must_use]
    pub fn focused(&self) -> Option<&ElementId> {
        self.focused.as_ref()
    }

    /// Install a hook run at the start of every render pass with the
    /// view about to be drawn.
    pub fn set_before_render(&mut self, hook: impl FnMut(&Rect) + 'static) {
        self.before_render = Some(Box::new(hook));
    }

    // -- elements -------------------------------------------------------

    /// Add `element` to the layer group for its layer, creating the layer
    /// on first use, and grow the absolute envelope to include it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DuplicateElement`] if the id is already in
    /// use anywhere on the canvas.
    pub fn add_element(&mut self, element: CanvasElement) -> CanvasResult<()> {
        if self.element(element.id()).is_some() {
            return Err(CanvasError::DuplicateElement(element.id().to_string()));
        }
        let index = element.layer();
        let id = element.id().clone();
        let link = self.link.clone();
        let layer = self.layers.entry(index).or_insert_with(|| {
            tracing::debug!(layer = index, "layer created");
            let mut group = CanvasElement::group(ElementId::layer(index), Point::ORIGIN)
                .with_layer(index);
            group.attach(&link);
            group
        });
        layer.add_element(element)?;
        self.grow_envelope();
        self.invalidate();
        tracing::debug!(element = %id, layer = index, "element added");
        Ok(())
    }

    // Layer bounds only grow, so folding them in keeps the envelope
    // covering everything ever added, including children that resized.
    fn grow_envelope(&mut self) {
        for layer in self.layers.values() {
            if !layer.as_group().is_some_and(CanvasGroup::has_bounds) {
                continue;
            }
            let bounds = *layer.dimensions();
            self.absolute = Some(self.absolute.map_or(bounds, |a| a.union(&bounds)));
        }
    }

    /// Remove an element (and its effect clone) wherever it lives.
    /// Returns `false` when no element has that id.
    pub fn remove_element(&mut self, id: &ElementId) -> bool {
        let removed = self
            .layers
            .values_mut()
            .find_map(|layer| layer.remove_descendant(id))
            .is_some();
        if !removed {
            return false;
        }
        if self.focused.as_ref() == Some(id) {
            self.focused = None;
        }
        self.invalidate();
        tracing::debug!(element = %id, "element removed");
        true
    }

    /// Look up an element anywhere on the canvas.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.layers.values().find_map(|layer| layer.find(id))
    }

    /// Mutable variant of [`Html5Canvas::element`].
    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        self.layers.values_mut().find_map(|layer| layer.find_mut(id))
    }

    /// Add an effect clone of `id` next to it. Returns the clone's id.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] for unknown ids.
    pub fn transform(&mut self, id: &ElementId, details: &TransformDetails) -> CanvasResult<ElementId> {
        let parent = self
            .layers
            .values_mut()
            .find_map(|layer| layer.find_parent_mut(id))
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        parent.transform_child(id, details)
    }

    // -- rendering ------------------------------------------------------

    /// Run one render pass if anything changed since the last one.
    ///
    /// Returns whether a pass ran. The dirty flag is only cleared when
    /// the pass completes.
    ///
    /// # Errors
    ///
    /// Propagates drawing errors from elements.
    pub fn render_frame(&mut self) -> CanvasResult<bool> {
        if !self.link.needs_redraw() {
            return Ok(false);
        }
        let view = self.relative_view;
        if let Some(hook) = self.before_render.as_mut() {
            hook(&view);
        }

        let clear = Rect::from_origin_size(Point::ORIGIN, self.pixel_size);
        self.main.clear_rect(&clear);
        self.effect.clear_rect(&clear);

        let mut surfaces = Surfaces {
            main: &mut self.main,
            effect: &mut self.effect,
        };
        for layer in self.layers.values_mut() {
            layer.update_dimensions(&view);
            layer.draw(&mut surfaces)?;
        }
        self.grow_envelope();

        self.link.clear_redraw();
        tracing::trace!(layers = self.layers.len(), "frame rendered");
        Ok(true)
    }

    // -- viewport -------------------------------------------------------

    /// Zoom in (`direction > 0`) or out (`direction < 0`) by one step,
    /// keeping the view centred.
    pub fn zoom(&mut self, direction: i32) {
        if direction == 0 {
            return;
        }
        let sign = f64::from(direction.signum());
        let rate = self.config.zoom_rate;
        let (min, max) = (self.config.min_zoom, self.config.max_zoom);
        let next = Point::new(
            (self.zoom.x + self.zoom.x * rate * sign).clamp(min.x, max.x),
            (self.zoom.y + self.zoom.y * rate * sign).clamp(min.y, max.y),
        );

        let size = self.pixel_size.as_point().divide_by(next);
        let delta = size - self.relative_view.size().as_point();
        self.relative_view = Rect::new(
            self.relative_view.x - delta.x / 2.0,
            self.relative_view.y - delta.y / 2.0,
            size.x,
            size.y,
        );
        self.zoom = next;
        self.sync_projection();
        self.invalidate();
        tracing::debug!(zoom_x = next.x, zoom_y = next.y, "zoomed");
    }

    /// Move the view's origin to `origin` (absolute units).
    pub fn pan(&mut self, origin: Point) {
        self.relative_view.x = origin.x;
        self.relative_view.y = origin.y;
        self.sync_projection();
        self.invalidate();
        tracing::debug!(x = origin.x, y = origin.y, "panned");
    }

    /// Pan by a physical-pixel delta, as produced by dragging: content
    /// follows the pointer.
    pub fn pan_by(&mut self, physical_delta: Point) {
        let delta = physical_delta.divide_by(self.zoom);
        self.pan(self.relative_view.origin() - delta);
    }

    /// Show `view`, deriving the zoom from it.
    ///
    /// The zoom is clamped to the configured limits; when clamping kicks
    /// in the shown window keeps `view`'s centre but is resized to
    /// `pixel_size / zoom`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] for a view without a
    /// positive finite size.
    pub fn change_view(&mut self, view: Rect) -> CanvasResult<()> {
        if !view.size().is_positive() || !view.origin().is_finite() {
            return Err(CanvasError::InvalidGeometry(format!(
                "view must have a positive finite size, got {view:?}"
            )));
        }
        let (min, max) = (self.config.min_zoom, self.config.max_zoom);
        let wanted = self.pixel_size.as_point().divide_by(view.size().as_point());
        let zoom = Point::new(wanted.x.clamp(min.x, max.x), wanted.y.clamp(min.y, max.y));
        let size = self.pixel_size.as_point().divide_by(zoom);
        let center = view.center();
        self.relative_view = if zoom == wanted {
            view
        } else {
            Rect::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
        };
        self.zoom = zoom;
        self.sync_projection();
        self.invalidate();
        tracing::debug!(?view, "view changed");
        Ok(())
    }

    /// Frame everything ever added, within the zoom limits. Returns
    /// `false` (and does nothing) while there is no content with a
    /// positive extent.
    ///
    /// # Errors
    ///
    /// Propagates [`Html5Canvas::change_view`] errors.
    pub fn fit_to_content(&mut self) -> CanvasResult<bool> {
        for layer in self.layers.values_mut() {
            layer.refit_bounds();
        }
        self.grow_envelope();
        match self.absolute {
            Some(bounds) if bounds.size().is_positive() => {
                self.change_view(bounds)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Start a drag at a physical point.
    pub fn begin_drag(&mut self, physical: Point) {
        self.drag_anchor = Some(physical);
    }

    /// Continue a drag; pans by the movement since the last call.
    /// Returns `false` when no drag is active.
    pub fn drag_to(&mut self, physical: Point) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        self.pan_by(physical - anchor);
        self.drag_anchor = Some(physical);
        true
    }

    /// Finish a drag. Returns whether one was active.
    pub fn end_drag(&mut self) -> bool {
        self.drag_anchor.take().is_some()
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Mouse-wheel zoom: scrolling up zooms in.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.zoom(1);
        } else if delta_y > 0.0 {
            self.zoom(-1);
        }
    }

    /// Update the surface's on-document bounds after a host layout change.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] without a positive size.
    pub fn set_surface_bounds(&mut self, bounds: Rect) -> CanvasResult<()> {
        if !bounds.size().is_positive() || !bounds.origin().is_finite() {
            return Err(CanvasError::InvalidGeometry(format!(
                "surface bounds must have a positive finite size, got {bounds:?}"
            )));
        }
        self.surface_bounds = bounds;
        Ok(())
    }

    /// Change the backing-store size, keeping zoom and view origin.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidGeometry`] without a positive size.
    pub fn resize(&mut self, pixel_size: Size) -> CanvasResult<()> {
        if !pixel_size.is_positive() {
            return Err(CanvasError::InvalidGeometry(format!(
                "pixel size must be positive, got {pixel_size:?}"
            )));
        }
        self.pixel_size = pixel_size;
        let size = pixel_size.as_point().divide_by(self.zoom);
        self.relative_view.w = size.x;
        self.relative_view.h = size.y;
        self.invalidate();
        tracing::debug!(?pixel_size, "resized");
        Ok(())
    }

    // -- coordinate conversion -----------------------------------------

    fn physical_scale(&self) -> Point {
        self.pixel_size
            .as_point()
            .divide_by(self.surface_bounds.size().as_point())
    }

    /// Physical (document) point → relative point.
    #[must_use]
    pub fn convert_physical_point_to_relative_point(&self, physical: Point) -> Point {
        (physical - self.surface_bounds.origin()).scale_by(self.physical_scale())
    }

    /// Relative point → physical (document) point.
    #[must_use]
    pub fn convert_relative_point_to_physical_point(&self, relative: Point) -> Point {
        relative.divide_by(self.physical_scale()) + self.surface_bounds.origin()
    }

    /// Absolute point → relative point.
    #[must_use]
    pub fn convert_absolute_point_to_relative_point(&self, absolute: Point) -> Point {
        self.projection().to_relative(absolute)
    }

    /// Relative point → absolute point.
    #[must_use]
    pub fn convert_relative_point_to_absolute_point(&self, relative: Point) -> Point {
        self.projection().to_absolute(relative)
    }

    /// Absolute rectangle → relative rectangle.
    #[must_use]
    pub fn convert_absolute_rect_to_relative_rect(&self, absolute: &Rect) -> Rect {
        self.projection().rect_to_relative(absolute)
    }

    /// Relative rectangle → absolute rectangle.
    #[must_use]
    pub fn convert_relative_rect_to_absolute_rect(&self, relative: &Rect) -> Rect {
        self.projection().rect_to_absolute(relative)
    }

    // -- events ---------------------------------------------------------

    /// Route an event. Pointer events go to every on-screen layer, which
    /// hit-test their children; a click also moves focus to the first
    /// element hit. Hover and leave also clear hover state left in
    /// off-screen layers. Key presses and focus changes go to the focused
    /// element. Returns the leaf elements that received the event.
    pub fn handle_event(&mut self, event: &CanvasEvent) -> Vec<ElementId> {
        if !event.kind.is_pointer() {
            return match self.focused.clone() {
                Some(id) => self.dispatch_to(&id, event),
                None => Vec::new(),
            };
        }

        let mut hits = Vec::new();
        let mut dropped = Vec::new();
        for (index, layer) in &mut self.layers {
            if layer.is_off_screen() {
                if matches!(event.kind, EventKind::Hover | EventKind::Leave) {
                    layer.release_hover(event.point);
                }
                continue;
            }
            let outcome = layer.handle_event(event);
            if outcome.actions.contains(&EventAction::Remove) {
                dropped.push(*index);
            }
            hits.extend(outcome.hits);
        }
        for index in dropped {
            self.layers.remove(&index);
        }

        if event.kind == EventKind::Click {
            self.set_focus(hits.first().cloned());
        }
        self.invalidate();
        tracing::trace!(kind = ?event.kind, hits = hits.len(), "event routed");
        hits
    }

    fn dispatch_to(&mut self, id: &ElementId, event: &CanvasEvent) -> Vec<ElementId> {
        if let Some(parent) = self
            .layers
            .values_mut()
            .find_map(|layer| layer.find_parent_mut(id))
        {
            return parent.dispatch_to_child(id, event);
        }
        Vec::new()
    }

    fn set_focus(&mut self, target: Option<ElementId>) {
        if self.focused == target {
            return;
        }
        if let Some(previous) = self.focused.take() {
            self.dispatch_to(&previous, &CanvasEvent::focus_change(EventKind::Blur));
        }
        if let Some(next) = &target {
            self.dispatch_to(next, &CanvasEvent::focus_change(EventKind::Focus));
        }
        self.focused = target;
    }

    /// Focus `id`, blurring the previous focus. Returns `false` for
    /// unknown ids.
    pub fn focus(&mut self, id: &ElementId) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        self.set_focus(Some(id.clone()));
        self.invalidate();
        true
    }

    /// Clear focus, blurring the focused element.
    pub fn blur(&mut self) {
        self.set_focus(None);
        self.invalidate();
    }

    /// Click at a physical point.
    pub fn click(&mut self, point: Point) -> Vec<ElementId> {
        self.handle_event(&CanvasEvent::pointer(EventKind::Click, point))
    }

    /// Pointer moved to a physical point.
    pub fn hover(&mut self, point: Point) -> Vec<ElementId> {
        self.handle_event(&CanvasEvent::pointer(EventKind::Hover, point))
    }

    /// Pointer left the surface.
    pub fn leave(&mut self, point: Point) -> Vec<ElementId> {
        self.handle_event(&CanvasEvent::pointer(EventKind::Leave, point))
    }

    /// Secondary click at a physical point.
    pub fn right_click(&mut self, point: Point) -> Vec<ElementId> {
        self.handle_event(&CanvasEvent::pointer(EventKind::RightClick, point))
    }

    /// Double click at a physical point.
    pub fn double_click(&mut self, point: Point) -> Vec<ElementId> {
        self.handle_event(&CanvasEvent::pointer(EventKind::DoubleClick, point))
    }

    /// Deliver a key press to the focused element.
    pub fn key_press(&mut self, key: impl Into<String>) -> Vec<ElementId> {
        self.handle_event(&CanvasEvent::key_press(key))
    }
}
