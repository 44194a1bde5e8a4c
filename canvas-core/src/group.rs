//! Groups: elements that own an ordered list of children.
//!
//! Children are positioned relative to the group's reference point and
//! are translated into absolute space when added. A group's dimensions
//! grow to the union of its non-effect children, including children that
//! resize after being added; removal never shrinks them. Effect clones
//! stay where they were created and are left out of the bounds.

use crate::element::{CanvasElement, CanvasLink, ElementId, ElementKind, TransformDetails};
use crate::event::{CanvasEvent, EventAction, EventKind, EventOutcome};
use crate::geometry::{point_in_rect, Point, Rect};
use crate::surface::Surfaces;
use crate::{CanvasError, CanvasResult};

/// Child storage of a group element, in insertion order.
#[derive(Debug, Default)]
pub struct CanvasGroup {
    reference: Point,
    children: Vec<CanvasElement>,
    has_bounds: bool,
}

impl CanvasGroup {
    pub(crate) fn new(reference: Point) -> Self {
        Self {
            reference,
            children: Vec::new(),
            has_bounds: false,
        }
    }

    /// Point children are placed relative to.
    #[must_use]
    pub fn reference(&self) -> Point {
        self.reference
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[CanvasElement] {
        &self.children
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the group has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child by id.
    #[must_use]
    pub fn child(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.children.iter().find(|c| c.id() == id)
    }

    fn position(&self, id: &ElementId) -> Option<usize> {
        self.children.iter().position(|c| c.id() == id)
    }

    pub(crate) fn any_hover_target(&self) -> bool {
        self.children.iter().any(CanvasElement::is_hover_target)
    }

    pub(crate) fn attach_children(&mut self, link: &CanvasLink) {
        for child in &mut self.children {
            child.attach(link);
        }
    }

    pub(crate) fn cull_children(&mut self, viewport: &Rect) {
        for child in &mut self.children {
            child.cull(viewport);
        }
    }

    /// Refit nested groups, then return the union of the children that
    /// count towards the bounds.
    fn refit_children(&mut self, include_effects: bool) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for child in &mut self.children {
            child.refit_bounds();
            if child.is_effect() && !include_effects {
                continue;
            }
            let r = *child.dimensions();
            bounds = Some(bounds.map_or(r, |b| b.union(&r)));
        }
        bounds
    }

    /// Whether any non-effect child has contributed to the bounds yet.
    #[must_use]
    pub fn has_bounds(&self) -> bool {
        self.has_bounds
    }

    pub(crate) fn translate(&mut self, delta: Point) {
        self.reference = self.reference + delta;
        for child in &mut self.children {
            child.adjust_dimensions(delta);
        }
    }

    pub(crate) fn draw_children(&mut self, surfaces: &mut Surfaces<'_>) -> CanvasResult<()> {
        for child in &mut self.children {
            child.draw(surfaces)?;
        }
        Ok(())
    }

    pub(crate) fn clone_for_effect(&self) -> Self {
        Self {
            reference: self.reference,
            children: self
                .children
                .iter()
                .map(|c| c.clone_for_effect(ElementId::effect_of(c.id())))
                .collect(),
            has_bounds: self.has_bounds,
        }
    }

    pub(crate) fn reparent(&mut self, parent: &ElementId) {
        for child in &mut self.children {
            child.parent = Some(parent.clone());
        }
    }

    pub(crate) fn recolor_children(&mut self, color: &str) {
        for child in &mut self.children {
            child.style.set_fill_color(color);
            child.style.take_changes();
            if let ElementKind::Group(group) = &mut child.kind {
                group.recolor_children(color);
            }
        }
    }

    pub(crate) fn scale_children(&mut self, factor: f64) {
        for child in &mut self.children {
            child.scale(factor);
        }
    }

    pub(crate) fn children_bounds(&self, include_effects: bool) -> Option<Rect> {
        self.children
            .iter()
            .filter(|c| include_effects || !c.is_effect())
            .map(|c| *c.dimensions())
            .reduce(|acc, r| acc.union(&r))
    }
}

fn not_a_group(id: &ElementId) -> CanvasError {
    CanvasError::InvalidOperation(format!("element {id} is not a group"))
}

impl CanvasElement {
    /// The group part of this element, if it is one.
    #[must_use]
    pub fn as_group(&self) -> Option<&CanvasGroup> {
        match &self.kind {
            ElementKind::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Add `child` to this group.
    ///
    /// The child is translated by the group's reference point, inherits
    /// the group's canvas (if any), and the group's dimensions grow to
    /// cover it unless it is an effect.
    ///
    /// # Errors
    ///
    /// [`CanvasError::InvalidOperation`] if this is not a group,
    /// [`CanvasError::DuplicateElement`] if a direct child already has
    /// the same id.
    pub fn add_element(&mut self, mut child: CanvasElement) -> CanvasResult<()> {
        let link = self.link.clone();
        let ElementKind::Group(group) = &mut self.kind else {
            return Err(not_a_group(&self.id));
        };
        if group.position(child.id()).is_some() {
            return Err(CanvasError::DuplicateElement(child.id().to_string()));
        }

        child.adjust_dimensions(group.reference);
        child.parent = Some(self.id.clone());
        if let Some(link) = &link {
            child.attach(link);
        }

        // An effect group's children are all effects and define its extent.
        if !child.is_effect() || self.is_effect {
            let bounds = *child.dimensions();
            self.dimensions = if group.has_bounds {
                self.dimensions.union(&bounds)
            } else {
                bounds
            };
            group.has_bounds = true;
        }
        tracing::trace!(group = %self.id, child = %child.id(), "child added");
        group.children.push(child);
        self.request_redraw();
        Ok(())
    }

    /// Grow this group's dimensions (and those of nested groups) to cover
    /// children that resized since they were added, such as text measured
    /// on attach or after a font change. Non-groups are unaffected.
    pub(crate) fn refit_bounds(&mut self) {
        let ElementKind::Group(group) = &mut self.kind else {
            return;
        };
        let Some(children) = group.refit_children(self.is_effect) else {
            return;
        };
        self.dimensions = if group.has_bounds {
            self.dimensions.union(&children)
        } else {
            children
        };
        group.has_bounds = true;
    }

    /// Send `Leave` to every hover-flagged child. Used when the pointer
    /// can no longer reach this group's children, e.g. it is off-screen.
    pub(crate) fn release_hover(&mut self, point: Point) {
        let hovered: Vec<ElementId> = self.as_group().map_or_else(Vec::new, |group| {
            group
                .children
                .iter()
                .filter(|c| c.is_hover_target())
                .map(|c| c.id().clone())
                .collect()
        });
        let leave = CanvasEvent::pointer(EventKind::Leave, point);
        for id in &hovered {
            self.dispatch_to_child(id, &leave);
        }
    }

    /// Remove a direct child, along with any live effect clone of it.
    /// Returns the detached child.
    pub fn remove_element(&mut self, id: &ElementId) -> Option<CanvasElement> {
        let ElementKind::Group(group) = &mut self.kind else {
            return None;
        };
        let index = group.position(id)?;
        let mut removed = group.children.remove(index);
        if let Some(effect) = removed.effect.take() {
            if let Some(index) = group.position(&effect) {
                group.children.remove(index);
            }
        }
        removed.parent = None;
        removed.link = None;
        self.request_redraw();
        Some(removed)
    }

    /// Remove an element anywhere below this group.
    pub fn remove_descendant(&mut self, id: &ElementId) -> Option<CanvasElement> {
        if let Some(removed) = self.remove_element(id) {
            return Some(removed);
        }
        let ElementKind::Group(group) = &mut self.kind else {
            return None;
        };
        group
            .children
            .iter_mut()
            .find_map(|child| child.remove_descendant(id))
    }

    /// Find this element or a descendant by id.
    #[must_use]
    pub fn find(&self, id: &ElementId) -> Option<&CanvasElement> {
        if &self.id == id {
            return Some(self);
        }
        match &self.kind {
            ElementKind::Group(group) => group.children.iter().find_map(|c| c.find(id)),
            _ => None,
        }
    }

    /// Mutable variant of [`CanvasElement::find`].
    pub fn find_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        if &self.id == id {
            return Some(self);
        }
        match &mut self.kind {
            ElementKind::Group(group) => group.children.iter_mut().find_map(|c| c.find_mut(id)),
            _ => None,
        }
    }

    /// The group (this one or a descendant) that directly owns `id`.
    pub fn find_parent_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        let owns = matches!(&self.kind, ElementKind::Group(group) if group.position(id).is_some());
        if owns {
            return Some(self);
        }
        match &mut self.kind {
            ElementKind::Group(group) => group
                .children
                .iter_mut()
                .find_map(|c| c.find_parent_mut(id)),
            _ => None,
        }
    }

    fn child_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        match &mut self.kind {
            ElementKind::Group(group) => group.children.iter_mut().find(|c| c.id() == id),
            _ => None,
        }
    }

    /// Add an effect clone of direct child `id`, replacing any previous
    /// effect of that child. Returns the clone's id.
    ///
    /// # Errors
    ///
    /// [`CanvasError::ElementNotFound`] if `id` is not a direct child,
    /// [`CanvasError::InvalidOperation`] if it is itself an effect.
    pub fn transform_child(
        &mut self,
        id: &ElementId,
        details: &TransformDetails,
    ) -> CanvasResult<ElementId> {
        let (previous, effect) = {
            let child = self
                .child_mut(id)
                .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
            if child.is_effect() {
                return Err(CanvasError::InvalidOperation(format!(
                    "effect {id} cannot be transformed"
                )));
            }
            let previous = child.effect.take();
            (previous, child.transform(details))
        };

        if let Some(previous) = previous {
            self.remove_element(&previous);
        }
        let effect_id = effect.id().clone();
        self.add_element(effect)?;
        tracing::debug!(source = %id, effect = %effect_id, "effect added");
        Ok(effect_id)
    }

    /// Deliver `event` to direct child `id` and apply what it asks for:
    /// dropping its effect, adding a transformed clone, or removing it.
    /// Returns the leaf elements that received the event.
    pub fn dispatch_to_child(&mut self, id: &ElementId, event: &CanvasEvent) -> Vec<ElementId> {
        let Some(child) = self.child_mut(id) else {
            return Vec::new();
        };
        let outcome = child.handle_event(event);
        self.apply_child_outcome(id, outcome)
    }

    fn apply_child_outcome(&mut self, id: &ElementId, outcome: EventOutcome) -> Vec<ElementId> {
        if let Some(effect) = &outcome.remove_effect {
            self.remove_element(effect);
        }
        for action in outcome.actions {
            match action {
                EventAction::Transform(details) => {
                    if let Err(err) = self.transform_child(id, &details) {
                        tracing::warn!(%err, target = %id, "listener transform failed");
                    }
                }
                EventAction::Remove => {
                    self.remove_element(id);
                }
            }
        }
        outcome.hits
    }

    pub(crate) fn route_to_children(&mut self, event: &CanvasEvent) -> Vec<ElementId> {
        let mut left = Vec::new();
        if matches!(event.kind, EventKind::Hover | EventKind::Leave) {
            if let Some(group) = self.as_group() {
                left = group
                    .children
                    .iter()
                    .filter(|c| {
                        c.is_hover_target()
                            && (event.kind == EventKind::Leave
                                || c.is_off_screen()
                                || !point_in_rect(event.point, c.display_dimensions()))
                    })
                    .map(|c| c.id().clone())
                    .collect();
            }
            let leave = CanvasEvent::pointer(EventKind::Leave, event.point);
            for id in &left {
                self.dispatch_to_child(id, &leave);
            }
        }

        if !event.kind.is_pointer() {
            return Vec::new();
        }
        let targets: Vec<ElementId> = self.as_group().map_or_else(Vec::new, |group| {
            group
                .children
                .iter()
                .filter(|c| {
                    !c.is_effect()
                        && !c.is_off_screen()
                        && point_in_rect(event.point, c.display_dimensions())
                })
                .map(|c| c.id().clone())
                .filter(|id| event.kind != EventKind::Leave || !left.contains(id))
                .collect()
        });

        let mut hits = Vec::new();
        for id in &targets {
            hits.extend(self.dispatch_to_child(id, event));
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::surface::FixedAdvanceMeasurer;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
        CanvasElement::rectangle(id, Rect::new(x, y, w, h)).unwrap()
    }

    fn attached_group(reference: Point) -> CanvasElement {
        let mut group = CanvasElement::group("g", reference);
        group.attach(&CanvasLink::new(Rc::new(FixedAdvanceMeasurer::default())));
        group
    }

    #[test]
    fn test_children_translate_by_reference() {
        let mut group = CanvasElement::group("g", Point::new(100.0, 50.0));
        group.add_element(rect("a", 0.0, 0.0, 10.0, 10.0)).unwrap();
        group.add_element(rect("b", 20.0, 5.0, 10.0, 10.0)).unwrap();

        let g = group.as_group().unwrap();
        assert_eq!(*g.children()[0].dimensions(), Rect::new(100.0, 50.0, 10.0, 10.0));
        assert_eq!(*group.dimensions(), Rect::new(100.0, 50.0, 30.0, 15.0));
        assert_eq!(g.children()[1].parent(), Some(&ElementId::from("g")));
    }

    #[test]
    fn test_add_rejects_duplicates_and_non_groups() {
        let mut group = CanvasElement::group("g", Point::ORIGIN);
        group.add_element(rect("a", 0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(matches!(
            group.add_element(rect("a", 0.0, 0.0, 1.0, 1.0)),
            Err(CanvasError::DuplicateElement(_))
        ));

        let mut leaf = rect("leaf", 0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            leaf.add_element(rect("x", 0.0, 0.0, 1.0, 1.0)),
            Err(CanvasError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_removal_does_not_shrink_bounds() {
        let mut group = CanvasElement::group("g", Point::ORIGIN);
        group.add_element(rect("a", 0.0, 0.0, 10.0, 10.0)).unwrap();
        group.add_element(rect("b", 50.0, 50.0, 10.0, 10.0)).unwrap();
        let removed = group.remove_element(&ElementId::from("b")).unwrap();
        assert!(removed.parent().is_none());
        assert_eq!(*group.dimensions(), Rect::new(0.0, 0.0, 60.0, 60.0));
        assert!(group.remove_element(&ElementId::from("b")).is_none());
    }

    #[test]
    fn test_attach_refits_to_measured_text() {
        let mut group = CanvasElement::group("g", Point::ORIGIN);
        let label = CanvasElement::text("t", Point::new(-30.0, 10.0), "abcdefghij")
            .with_style(|s| s.set_font_size(10.0));
        group.add_element(label).unwrap();
        assert!(group.dimensions().w.abs() < 1e-9);

        group.attach(&CanvasLink::new(Rc::new(FixedAdvanceMeasurer::default())));
        let text = *group.find(&ElementId::from("t")).unwrap().dimensions();
        assert_eq!(text, Rect::new(-30.0, 10.0, 50.0, 10.0));
        assert_eq!(*group.dimensions(), text);
    }

    #[test]
    fn test_font_change_refits_on_next_update() {
        let mut group = attached_group(Point::ORIGIN);
        let label = CanvasElement::text("t", Point::ORIGIN, "ab")
            .with_style(|s| s.set_font_size(10.0));
        group.add_element(label).unwrap();
        group
            .find_mut(&ElementId::from("t"))
            .unwrap()
            .update_style(|s| s.set_font_size(40.0));

        group.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(*group.dimensions(), Rect::new(0.0, 0.0, 40.0, 40.0));
    }

    #[test]
    fn test_effects_stay_out_of_bounds() {
        let mut group = attached_group(Point::ORIGIN);
        group.add_element(rect("a", 0.0, 0.0, 10.0, 10.0)).unwrap();
        group
            .transform_child(&ElementId::from("a"), &TransformDetails::default().with_scale(3.0))
            .unwrap();
        assert_eq!(*group.dimensions(), Rect::new(0.0, 0.0, 10.0, 10.0));

        group.adjust_dimensions(Point::new(5.0, 5.0));
        group.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(*group.dimensions(), Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(
            group.as_group().unwrap().children_bounds(false),
            Some(*group.dimensions())
        );
    }

    #[test]
    fn test_release_hover_sends_leave_to_hovered_children() {
        let left = Rc::new(RefCell::new(Vec::new()));
        let mut group = attached_group(Point::ORIGIN);
        for (id, x) in [("a", 0.0), ("b", 20.0)] {
            let mut child = rect(id, x, 0.0, 10.0, 10.0);
            let sink = Rc::clone(&left);
            child.add_event_listener(EventKind::Leave, move |ctx| {
                sink.borrow_mut().push(ctx.target().clone());
            });
            group.add_element(child).unwrap();
        }
        group.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));
        group.hover(Point::new(5.0, 5.0));
        assert!(group.is_hover_target());

        group.release_hover(Point::new(500.0, 500.0));
        assert!(!group.is_hover_target());
        assert_eq!(*left.borrow(), vec![ElementId::from("a")]);
    }

    #[test]
    fn test_click_reaches_only_hit_children() {
        let mut group = attached_group(Point::ORIGIN);
        group.add_element(rect("a", 0.0, 0.0, 10.0, 10.0)).unwrap();
        group.add_element(rect("b", 20.0, 0.0, 10.0, 10.0)).unwrap();
        group.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));

        let outcome = group.click(Point::new(25.0, 5.0));
        assert_eq!(outcome.hits, vec![ElementId::from("b")]);

        let outcome = group.click(Point::new(15.0, 5.0));
        assert!(outcome.hits.is_empty());
    }

    #[test]
    fn test_hover_listener_adds_effect_and_leave_removes_it() {
        let mut group = attached_group(Point::ORIGIN);
        let mut child = rect("a", 0.0, 0.0, 10.0, 10.0);
        child.add_event_listener(EventKind::Hover, |ctx| {
            ctx.transform(TransformDetails::default().with_color("#ff0").with_scale(1.1));
        });
        group.add_element(child).unwrap();
        group.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));

        group.hover(Point::new(5.0, 5.0));
        let g = group.as_group().unwrap();
        assert_eq!(g.len(), 2);
        assert!(g.children()[1].is_effect());
        assert!(group.is_hover_target());

        // a second hover replaces rather than stacks
        group.hover(Point::new(6.0, 6.0));
        assert_eq!(group.as_group().unwrap().len(), 2);

        group.hover(Point::new(60.0, 60.0));
        let g = group.as_group().unwrap();
        assert_eq!(g.len(), 1);
        assert!(!group.is_hover_target());
    }

    #[test]
    fn test_remove_action_detaches_child() {
        let mut group = attached_group(Point::ORIGIN);
        let mut child = rect("a", 0.0, 0.0, 10.0, 10.0);
        child.add_event_listener(EventKind::DoubleClick, |ctx| ctx.remove());
        group.add_element(child).unwrap();
        group.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));

        group.double_click(Point::new(1.0, 1.0));
        assert!(group.as_group().unwrap().is_empty());
    }

    #[test]
    fn test_effects_are_not_hit_tested() {
        let seen = Rc::new(RefCell::new(0));
        let mut group = attached_group(Point::ORIGIN);
        let mut child = rect("a", 0.0, 0.0, 10.0, 10.0);
        let counter = Rc::clone(&seen);
        child.add_event_listener(EventKind::Click, move |_| *counter.borrow_mut() += 1);
        group.add_element(child).unwrap();
        group
            .transform_child(&ElementId::from("a"), &TransformDetails::default())
            .unwrap();
        group.update_dimensions(&Rect::new(0.0, 0.0, 100.0, 100.0));

        let outcome = group.click(Point::new(5.0, 5.0));
        assert_eq!(outcome.hits, vec![ElementId::from("a")]);
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_nested_find_and_remove() {
        let mut outer = CanvasElement::group("outer", Point::ORIGIN);
        let mut inner = CanvasElement::group("inner", Point::new(10.0, 10.0));
        inner.add_element(rect("leaf", 0.0, 0.0, 5.0, 5.0)).unwrap();
        outer.add_element(inner).unwrap();

        let leaf = ElementId::from("leaf");
        assert_eq!(
            *outer.find(&leaf).unwrap().dimensions(),
            Rect::new(10.0, 10.0, 5.0, 5.0)
        );
        assert_eq!(outer.find_parent_mut(&leaf).unwrap().id().as_str(), "inner");
        assert!(outer.remove_descendant(&leaf).is_some());
        assert!(outer.find(&leaf).is_none());
    }

    #[test]
    fn test_group_effect_scales_children() {
        let mut outer = CanvasElement::group("outer", Point::ORIGIN);
        let mut inner = CanvasElement::group("inner", Point::ORIGIN);
        inner.add_element(rect("a", 0.0, 0.0, 10.0, 10.0)).unwrap();
        inner.add_element(rect("b", 10.0, 0.0, 10.0, 10.0)).unwrap();
        outer.add_element(inner).unwrap();

        let effect_id = outer
            .transform_child(
                &ElementId::from("inner"),
                &TransformDetails::default().with_color("red").with_scale(2.0),
            )
            .unwrap();
        let effect = outer.find(&effect_id).unwrap();
        assert!(effect.is_effect());
        let children = effect.as_group().unwrap().children();
        assert!(children.iter().all(CanvasElement::is_effect));
        assert!(children.iter().all(|c| c.style().fill_color() == Some("red")));
        assert_eq!(*effect.dimensions(), Rect::new(-5.0, -5.0, 30.0, 20.0));
        assert_eq!(children[0].parent(), Some(&effect_id));
    }
}
