//! Scene graph interface
//!
//! What the accessibility layer needs from the host's visual object tree:
//! bounds, coordinate transforms, visibility, pointer interactivity,
//! listener presence and dispatch of synthetic semantic events.

use std::collections::HashMap;
use std::fmt;

use parallax_dom::{Point, Rect};

use crate::attributes::AttrValue;

/// Scene-graph object identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event types known to the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    // Pointer events
    Click,
    PointerDown,
    PointerTap,

    // Synthetic semantic events
    KeyboardClick,
    ValueChanged,
    SelectionChanged,
    Scroll,
    ExpandRow,
    CollapseRow,
    OpenMenu,
    CloseMenu,
    Increment,
    Decrement,
}

impl EventType {
    /// Pointer events that make an object look clickable
    pub const PRESS: &'static [EventType] = &[Self::Click, Self::PointerDown, Self::PointerTap];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::PointerDown => "pointerdown",
            Self::PointerTap => "pointertap",
            Self::KeyboardClick => "keyboardClick",
            Self::ValueChanged => "valueChanged",
            Self::SelectionChanged => "selectionChanged",
            Self::Scroll => "scroll",
            Self::ExpandRow => "expandRow",
            Self::CollapseRow => "collapseRow",
            Self::OpenMenu => "openMenu",
            Self::CloseMenu => "closeMenu",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
        }
    }
}

/// Synthetic semantic event sent to the scene graph
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    KeyboardClick,
    ValueChanged { new_value: AttrValue },
    SelectionChanged { index: usize },
    Scroll { scroll_top: f64 },
    ExpandRow,
    CollapseRow,
    OpenMenu,
    CloseMenu,
    Increment,
    Decrement,
}

impl SceneEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::KeyboardClick => EventType::KeyboardClick,
            Self::ValueChanged { .. } => EventType::ValueChanged,
            Self::SelectionChanged { .. } => EventType::SelectionChanged,
            Self::Scroll { .. } => EventType::Scroll,
            Self::ExpandRow => EventType::ExpandRow,
            Self::CollapseRow => EventType::CollapseRow,
            Self::OpenMenu => EventType::OpenMenu,
            Self::CloseMenu => EventType::CloseMenu,
            Self::Increment => EventType::Increment,
            Self::Decrement => EventType::Decrement,
        }
    }

    /// Whether a listener may suppress the default action
    pub fn cancelable(&self) -> bool {
        !matches!(self, Self::ValueChanged { .. } | Self::SelectionChanged { .. } | Self::Scroll { .. })
    }
}

/// Result of dispatching a synthetic event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    #[default]
    Handled,
    HandledAndSuppressDefault,
}

impl Dispatch {
    pub fn default_prevented(self) -> bool {
        self == Self::HandledAndSuppressDefault
    }

    /// Combine two listener results; suppression wins
    pub fn merge(self, other: Dispatch) -> Dispatch {
        if self.default_prevented() || other.default_prevented() {
            Self::HandledAndSuppressDefault
        } else {
            Self::Handled
        }
    }
}

/// Host scene graph
pub trait SceneGraph {
    /// Local bounding box, `None` while the object has no defined bounds
    fn local_bounds(&self, object: ObjectId) -> Option<Rect>;

    /// Local point to global (surface device pixel) space
    fn to_global(&self, object: ObjectId, point: Point) -> Point;

    /// Global point to the object's local space
    fn to_local(&self, object: ObjectId, point: Point) -> Point;

    fn is_visible(&self, object: ObjectId) -> bool;

    /// Pointer interactivity
    fn is_interactive(&self, object: ObjectId) -> bool;

    fn has_listener(&self, object: ObjectId, event: EventType) -> bool;

    fn dispatch(&mut self, object: ObjectId, event: &SceneEvent) -> Dispatch;
}

/// Scene listener callback
pub type SceneListener = Box<dyn FnMut(ObjectId, &SceneEvent) -> Dispatch>;

/// Translate-then-scale transform relative to the parent object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub tx: f64,
    pub ty: f64,
    pub sx: f64,
    pub sy: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { tx: 0.0, ty: 0.0, sx: 1.0, sy: 1.0 }
    }
}

impl Transform {
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self { tx, ty, ..Self::default() }
    }

    pub fn with_scale(mut self, sx: f64, sy: f64) -> Self {
        self.sx = sx;
        self.sy = sy;
        self
    }

    fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.sx + self.tx, p.y * self.sy + self.ty)
    }

    fn invert(&self, p: Point) -> Point {
        let sx = if self.sx == 0.0 { 1.0 } else { self.sx };
        let sy = if self.sy == 0.0 { 1.0 } else { self.sy };
        Point::new((p.x - self.tx) / sx, (p.y - self.ty) / sy)
    }
}

struct SceneObject {
    parent: Option<ObjectId>,
    bounds: Option<Rect>,
    transform: Transform,
    visible: bool,
    interactive: bool,
    listeners: HashMap<EventType, Vec<SceneListener>>,
}

/// In-memory scene graph for headless hosts and tests
///
/// Dispatch bubbles from the target through its ancestors; every
/// dispatched event is also appended to a log.
#[derive(Default)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    log: Vec<(ObjectId, SceneEvent)>,
}

impl fmt::Debug for MemoryScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryScene")
            .field("objects", &self.objects.len())
            .field("log", &self.log)
            .finish()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visible, non-interactive object with the given local bounds
    pub fn add(&mut self, parent: Option<ObjectId>, bounds: Rect) -> ObjectId {
        let id = ObjectId(self.objects.len() as u64 + 1);
        self.objects.push(SceneObject {
            parent,
            bounds: Some(bounds),
            transform: Transform::default(),
            visible: true,
            interactive: false,
            listeners: HashMap::new(),
        });
        id
    }

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        (id.0 as usize).checked_sub(1).and_then(|i| self.objects.get(i))
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        (id.0 as usize).checked_sub(1).and_then(|i| self.objects.get_mut(i))
    }

    pub fn set_bounds(&mut self, id: ObjectId, bounds: Option<Rect>) {
        if let Some(o) = self.object_mut(id) { o.bounds = bounds; }
    }

    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) {
        if let Some(o) = self.object_mut(id) { o.transform = transform; }
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) {
        if let Some(o) = self.object_mut(id) { o.visible = visible; }
    }

    pub fn set_interactive(&mut self, id: ObjectId, interactive: bool) {
        if let Some(o) = self.object_mut(id) { o.interactive = interactive; }
    }

    /// Register a listener
    pub fn on<F>(&mut self, id: ObjectId, event: EventType, listener: F)
    where
        F: FnMut(ObjectId, &SceneEvent) -> Dispatch + 'static,
    {
        if let Some(o) = self.object_mut(id) {
            o.listeners.entry(event).or_default().push(Box::new(listener));
        }
    }

    /// Every event dispatched so far, in order
    pub fn dispatched(&self) -> &[(ObjectId, SceneEvent)] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn chain(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(o) = self.object(c) else { break };
            chain.push(c);
            current = o.parent;
        }
        chain
    }
}

impl SceneGraph for MemoryScene {
    fn local_bounds(&self, object: ObjectId) -> Option<Rect> {
        self.object(object).and_then(|o| o.bounds)
    }

    fn to_global(&self, object: ObjectId, point: Point) -> Point {
        self.chain(object)
            .into_iter()
            .filter_map(|id| self.object(id))
            .fold(point, |p, o| o.transform.apply(p))
    }

    fn to_local(&self, object: ObjectId, point: Point) -> Point {
        self.chain(object)
            .into_iter()
            .rev()
            .filter_map(|id| self.object(id))
            .fold(point, |p, o| o.transform.invert(p))
    }

    fn is_visible(&self, object: ObjectId) -> bool {
        self.object(object).is_some_and(|o| o.visible)
    }

    fn is_interactive(&self, object: ObjectId) -> bool {
        self.object(object).is_some_and(|o| o.interactive)
    }

    fn has_listener(&self, object: ObjectId, event: EventType) -> bool {
        self.object(object)
            .and_then(|o| o.listeners.get(&event))
            .is_some_and(|l| !l.is_empty())
    }

    fn dispatch(&mut self, object: ObjectId, event: &SceneEvent) -> Dispatch {
        self.log.push((object, event.clone()));
        let event_type = event.event_type();
        let mut result = Dispatch::Handled;
        for id in self.chain(object) {
            let Some(o) = self.object_mut(id) else { continue };
            if let Some(listeners) = o.listeners.get_mut(&event_type) {
                for listener in listeners.iter_mut() {
                    result = result.merge(listener(object, event));
                }
            }
        }
        if !event.cancelable() {
            return Dispatch::Handled;
        }
        tracing::trace!("Dispatched {} to object {}: {:?}", event_type.name(), object, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_transform_chain() {
        let mut scene = MemoryScene::new();
        let parent = scene.add(None, Rect::from_xywh(0.0, 0.0, 200.0, 200.0));
        let child = scene.add(Some(parent), Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
        scene.set_transform(parent, Transform::translate(100.0, 50.0).with_scale(2.0, 2.0));
        scene.set_transform(child, Transform::translate(5.0, 5.0));

        let global = scene.to_global(child, Point::new(1.0, 1.0));
        assert_eq!(global, Point::new(112.0, 62.0));
        assert_eq!(scene.to_local(child, global), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_dispatch_bubbles_and_suppresses() {
        let mut scene = MemoryScene::new();
        let parent = scene.add(None, Rect::default());
        let child = scene.add(Some(parent), Rect::default());
        scene.on(parent, EventType::KeyboardClick, |_, _| Dispatch::HandledAndSuppressDefault);

        assert!(scene.has_listener(parent, EventType::KeyboardClick));
        assert!(!scene.has_listener(child, EventType::KeyboardClick));
        assert_eq!(scene.dispatch(child, &SceneEvent::KeyboardClick), Dispatch::HandledAndSuppressDefault);
        assert_eq!(scene.dispatched().len(), 1);
    }

    #[test]
    fn test_non_cancelable_never_suppressed() {
        let mut scene = MemoryScene::new();
        let obj = scene.add(None, Rect::default());
        scene.on(obj, EventType::Scroll, |_, _| Dispatch::HandledAndSuppressDefault);
        assert_eq!(scene.dispatch(obj, &SceneEvent::Scroll { scroll_top: 4.0 }), Dispatch::Handled);
    }
}
