//! Element events, listeners and the actions listeners may request.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, TransformDetails};
use crate::geometry::Point;

/// Kinds of events an element can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Primary button click.
    Click,
    /// Pointer entered or moved over the element.
    Hover,
    /// Pointer left the element.
    Leave,
    /// Secondary button click.
    RightClick,
    /// Double click.
    DoubleClick,
    /// Key pressed while the element has focus.
    KeyPress,
    /// Element gained focus.
    Focus,
    /// Element lost focus.
    Blur,
}

impl EventKind {
    /// Whether the event carries a meaningful pointer position and is
    /// routed by hit testing.
    #[must_use]
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::Click | Self::Hover | Self::Leave | Self::RightClick | Self::DoubleClick
        )
    }
}

/// An event travelling down the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasEvent {
    /// What happened.
    pub kind: EventKind,
    /// Pointer position, as delivered by the host (not converted).
    pub point: Point,
    /// Key name for [`EventKind::KeyPress`].
    pub key: Option<String>,
}

impl CanvasEvent {
    /// A pointer event at `point`.
    #[must_use]
    pub fn pointer(kind: EventKind, point: Point) -> Self {
        Self {
            kind,
            point,
            key: None,
        }
    }

    /// A key press.
    #[must_use]
    pub fn key_press(key: impl Into<String>) -> Self {
        Self {
            kind: EventKind::KeyPress,
            point: Point::ORIGIN,
            key: Some(key.into()),
        }
    }

    /// A focus change event without a position.
    #[must_use]
    pub fn focus_change(kind: EventKind) -> Self {
        Self {
            kind,
            point: Point::ORIGIN,
            key: None,
        }
    }
}

/// Follow-up work a listener asks the element's parent to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    /// Add an effect clone of the target with these changes.
    Transform(TransformDetails),
    /// Remove the target from its parent.
    Remove,
}

/// What a listener sees, plus a sink for requested actions.
pub struct EventContext<'a> {
    event: &'a CanvasEvent,
    target: &'a ElementId,
    actions: &'a mut Vec<EventAction>,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        event: &'a CanvasEvent,
        target: &'a ElementId,
        actions: &'a mut Vec<EventAction>,
    ) -> Self {
        Self {
            event,
            target,
            actions,
        }
    }

    /// The event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event.kind
    }

    /// Pointer position of the event.
    #[must_use]
    pub fn point(&self) -> Point {
        self.event.point
    }

    /// Key name, for key presses.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.event.key.as_deref()
    }

    /// Id of the element whose listener is running.
    #[must_use]
    pub fn target(&self) -> &ElementId {
        self.target
    }

    /// Ask the parent to add a transformed effect clone of the target.
    pub fn transform(&mut self, details: TransformDetails) {
        self.actions.push(EventAction::Transform(details));
    }

    /// Ask the parent to remove the target.
    pub fn remove(&mut self) {
        self.actions.push(EventAction::Remove);
    }
}

/// A registered event handler.
pub type Listener = Box<dyn FnMut(&mut EventContext<'_>)>;

/// Listener lists keyed by event kind, invoked in registration order.
#[derive(Default)]
pub struct ListenerMap {
    listeners: HashMap<EventKind, Vec<Listener>>,
}

impl fmt::Debug for ListenerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, list) in &self.listeners {
            map.entry(kind, &list.len());
        }
        map.finish()
    }
}

impl ListenerMap {
    /// Append a listener for `kind`.
    pub fn add(&mut self, kind: EventKind, listener: Listener) {
        self.listeners.entry(kind).or_default().push(listener);
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Run every listener for the event's kind, collecting requested actions.
    pub fn invoke(&mut self, event: &CanvasEvent, target: &ElementId, actions: &mut Vec<EventAction>) {
        let Some(list) = self.listeners.get_mut(&event.kind) else {
            return;
        };
        for listener in list.iter_mut() {
            let mut ctx = EventContext::new(event, target, actions);
            listener(&mut ctx);
        }
    }
}

/// Result of delivering an event to an element (and, for groups, its
/// subtree).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOutcome {
    /// Effect clone the parent should drop (set on leave/blur).
    pub remove_effect: Option<ElementId>,
    /// Actions the element's own listeners requested.
    pub actions: Vec<EventAction>,
    /// Leaf elements that received the event.
    pub hits: Vec<ElementId>,
}
