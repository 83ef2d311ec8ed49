//! Focus Management
//!
//! Tab index bookkeeping, visibility and enablement inference, and the
//! synchronous focus request that patches just enough of the projected
//! element for the platform focus primitive to succeed.

use parallax_dom::DomBackend;

use crate::arena::NodeId;
use crate::attributes::Attributes;
use crate::scene::{EventType, SceneGraph};
use crate::tree::AccessibilityTree;
use crate::{A11yError, Result};

/// Tab index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabIndex {
    /// No tabindex at all
    #[default]
    Unset,
    /// Negative: focusable from script and arrow keys only
    Programmatic(i32),
    /// Zero or positive: part of sequential Tab order
    Sequential(i32),
}

impl TabIndex {
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<i32>() {
            Ok(n) => Self::from_value(n),
            Err(_) => Self::Unset,
        }
    }

    pub fn from_value(n: i32) -> Self {
        if n < 0 { Self::Programmatic(n) } else { Self::Sequential(n) }
    }

    pub fn of(attributes: &Attributes) -> Self {
        attributes.tab_index().map(Self::from_value).unwrap_or_default()
    }

    /// A tab index is present, whatever its value
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn is_focusable(&self) -> bool {
        matches!(self, Self::Sequential(_))
    }

    pub fn value(&self) -> Option<i32> {
        match self {
            Self::Unset => None,
            Self::Programmatic(n) | Self::Sequential(n) => Some(*n),
        }
    }
}

/// Visibility: the explicit override, else the scene object's own flag
pub fn is_visible(tree: &AccessibilityTree, scene: &dyn SceneGraph, node: NodeId) -> bool {
    let Some(n) = tree.node(node) else { return false };
    n.visible().unwrap_or_else(|| scene.is_visible(n.object()))
}

/// Enablement: the explicit override, else disabled only when the object
/// is not pointer-interactive yet has a press listener
pub fn is_enabled(tree: &AccessibilityTree, scene: &dyn SceneGraph, node: NodeId) -> bool {
    let Some(n) = tree.node(node) else { return false };
    n.enabled().unwrap_or_else(|| {
        let object = n.object();
        let looks_clickable = EventType::PRESS.iter().any(|e| scene.has_listener(object, *e));
        scene.is_interactive(object) || !looks_clickable
    })
}

/// Result of a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Focused,
    /// No element yet; focus lands after the next reconciliation pass
    Deferred,
    /// The platform declined focus
    Refused,
}

/// Move DOM focus to a node's element
///
/// Runs outside the reconciliation pass: stale `hidden`, `disabled` and
/// `tabindex` state is patched on the element first so focus can land
/// in the same call.
pub fn request_focus(
    tree: &mut AccessibilityTree,
    scene: &dyn SceneGraph,
    dom: &mut dyn DomBackend,
    node: NodeId,
) -> Result<FocusOutcome> {
    let n = tree.node(node).ok_or(A11yError::StaleNode)?;
    let tab_index = TabIndex::of(n.attributes());

    let Some(el) = dom.element_by_id(n.dom_id()) else {
        tracing::warn!("No element for {} yet, deferring focus", n.dom_id());
        tree.set_pending_focus(node);
        return Ok(FocusOutcome::Deferred);
    };

    if is_visible(tree, scene, node) {
        dom.remove_attribute(el, "hidden");
    }
    if is_enabled(tree, scene, node) {
        dom.remove_attribute(el, "disabled");
        dom.remove_attribute(el, "aria-disabled");
    }
    if let Some(value) = tab_index.value() {
        dom.set_attribute(el, "tabindex", &value.to_string());
    }

    if dom.focus(el) {
        tree.set_focused(Some(node));
        Ok(FocusOutcome::Focused)
    } else {
        tracing::debug!("Focus refused for element {:?}", el);
        Ok(FocusOutcome::Refused)
    }
}
