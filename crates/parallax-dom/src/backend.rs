//! DOM backend
//!
//! The primitive operations the projection needs from a real DOM.

use crate::{DomError, ElementId};

/// Event listener an element is created with
///
/// The backend forwards matching events to the host, which routes them
/// back into the accessibility layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    KeyDown,
    Click,
    Focus,
    Scroll,
    Input,
}

impl Listener {
    /// DOM event type name
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::KeyDown => "keydown",
            Self::Click => "click",
            Self::Focus => "focus",
            Self::Scroll => "scroll",
            Self::Input => "input",
        }
    }
}

/// Element-level DOM operations
pub trait DomBackend {
    /// Create a detached element
    fn create_element(
        &mut self,
        tag: &str,
        attrs: &[(String, String)],
        listeners: &[Listener],
    ) -> ElementId;

    /// Drop an element and its whole subtree
    fn destroy(&mut self, el: ElementId);

    /// Look up a connected or detached element by its `id` attribute
    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    fn tag(&self, el: ElementId) -> Option<&str>;

    fn attribute(&self, el: ElementId, name: &str) -> Option<&str>;

    /// Names of all attributes currently set, in insertion order
    fn attribute_names(&self, el: ElementId) -> Vec<String>;

    /// Set an attribute. Returns false when the value was already current.
    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) -> bool;

    /// Remove an attribute. Returns false when it was not present.
    fn remove_attribute(&mut self, el: ElementId, name: &str) -> bool;

    fn parent(&self, el: ElementId) -> Option<ElementId>;

    fn children(&self, el: ElementId) -> Vec<ElementId>;

    /// Insert `child` under `parent` at `index`, moving it if already attached
    fn insert_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
        index: usize,
    ) -> Result<(), DomError>;

    /// Detach `child` from `parent`. The element stays alive.
    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> bool;

    /// Platform focus primitive. Returns whether focus landed.
    fn focus(&mut self, el: ElementId) -> bool;

    fn focused(&self) -> Option<ElementId>;
}
