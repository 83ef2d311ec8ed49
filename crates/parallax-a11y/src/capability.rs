//! Role Capabilities
//!
//! Role behaviour as data: an optional child validator stricter than the
//! registry's permitted set, a default-attribute initializer run at bind
//! time, a key handler and the DOM listeners the projected element needs.

use parallax_dom::{DomBackend, Key, KeyboardInput, Listener};

use crate::arena::NodeId;
use crate::attributes::{AttrValue, Attributes};
use crate::focus::{self, TabIndex};
use crate::navigation;
use crate::role::Role;
use crate::scene::{SceneEvent, SceneGraph};
use crate::tree::AccessibilityTree;
use crate::{A11yError, Result};

/// Extra check run by `add_child` after the registry accepted the role
pub type ChildValidator = fn(&AccessibilityTree, NodeId, NodeId) -> Result<()>;

/// Default attributes applied when a node is bound
pub type AttributeInit = fn(&mut Attributes);

pub type KeyHandler = fn(&mut KeyContext<'_>, NodeId, &KeyboardInput) -> KeyOutcome;

/// Behaviour attached to a role
#[derive(Debug, Clone, Copy, Default)]
pub struct Capability {
    pub validate_child: Option<ChildValidator>,
    pub init: Option<AttributeInit>,
    pub key_handler: Option<KeyHandler>,
    pub listeners: &'static [Listener],
}

/// Everything a key handler may touch
pub struct KeyContext<'a> {
    pub tree: &'a mut AccessibilityTree,
    pub scene: &'a mut dyn SceneGraph,
    pub dom: &'a mut dyn DomBackend,
}

impl<'a> KeyContext<'a> {
    pub fn new(
        tree: &'a mut AccessibilityTree,
        scene: &'a mut dyn SceneGraph,
        dom: &'a mut dyn DomBackend,
    ) -> Self {
        Self { tree, scene, dom }
    }

    /// Dispatch a synthetic event to the node's scene object
    pub fn dispatch(&mut self, node: NodeId, event: SceneEvent) -> crate::Dispatch {
        match self.tree.object(node) {
            Some(object) => self.scene.dispatch(object, &event),
            None => crate::Dispatch::Handled,
        }
    }

    /// Focus a node, logging anything but success
    pub fn focus(&mut self, node: NodeId) {
        match focus::request_focus(self.tree, &*self.scene, &mut *self.dom, node) {
            Ok(outcome) => tracing::trace!("Focus request: {:?}", outcome),
            Err(e) => tracing::warn!("Focus request failed: {}", e),
        }
    }
}

/// Whether a key was consumed
///
/// `Handled` means the host should prevent the default action and stop
/// propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Handled,
}

impl KeyOutcome {
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

/// Run the node's key handler
pub fn handle_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    if input.has_command_modifier() {
        return KeyOutcome::Ignored;
    }
    let Some(role) = ctx.tree.role(node) else {
        return KeyOutcome::Ignored;
    };
    match ctx.tree.registry().capability(role).key_handler {
        Some(handler) => handler(ctx, node, input),
        None => KeyOutcome::Ignored,
    }
}

// === Listener sets ===

const ACTIVATION_LISTENERS: &[Listener] = &[Listener::KeyDown, Listener::Focus, Listener::Click];
const KEY_LISTENERS: &[Listener] = &[Listener::KeyDown, Listener::Focus];
const RANGE_LISTENERS: &[Listener] = &[Listener::KeyDown, Listener::Focus, Listener::Input];
const SCROLLBAR_LISTENERS: &[Listener] = &[Listener::KeyDown, Listener::Focus, Listener::Scroll];
const TEXT_LISTENERS: &[Listener] = &[Listener::Focus, Listener::Input];
const COMBOBOX_LISTENERS: &[Listener] = &[Listener::KeyDown, Listener::Focus, Listener::Input];
const SCROLL_LISTENERS: &[Listener] = &[Listener::Scroll];

/// Capability for a role
pub fn for_role(role: Role) -> Capability {
    match role {
        Role::Table => Capability {
            validate_child: Some(single_table_head_and_foot),
            ..Default::default()
        },
        Role::Grid | Role::TreeGrid => Capability {
            validate_child: Some(single_table_head_and_foot),
            listeners: SCROLL_LISTENERS,
            ..Default::default()
        },
        Role::Listbox | Role::Log | Role::Feed => Capability {
            listeners: SCROLL_LISTENERS,
            ..Default::default()
        },

        Role::Button => Capability {
            init: Some(|a| a.set_input_type("button")),
            key_handler: Some(activation_key),
            listeners: ACTIVATION_LISTENERS,
            ..Default::default()
        },
        Role::Link => Capability {
            key_handler: Some(activation_key),
            listeners: ACTIVATION_LISTENERS,
            ..Default::default()
        },
        Role::Checkbox | Role::Switch => Capability {
            init: Some(|a| {
                a.set_input_type("checkbox");
                a.set_checked(false);
            }),
            key_handler: Some(activation_key),
            listeners: ACTIVATION_LISTENERS,
            ..Default::default()
        },
        Role::Radio => Capability {
            init: Some(|a| {
                a.set_input_type("radio");
                a.set_checked(false);
            }),
            key_handler: Some(radio_key),
            listeners: ACTIVATION_LISTENERS,
            ..Default::default()
        },

        Role::MenuItem => Capability {
            validate_child: Some(single_submenu),
            key_handler: Some(menu_item_key),
            listeners: ACTIVATION_LISTENERS,
            ..Default::default()
        },
        Role::MenuItemCheckbox | Role::MenuItemRadio => Capability {
            init: Some(|a| a.set_aria_checked(false)),
            key_handler: Some(menu_item_key),
            listeners: ACTIVATION_LISTENERS,
            ..Default::default()
        },
        Role::Combobox => Capability {
            init: Some(|a| {
                a.set_expanded(false);
                a.set_value("");
            }),
            key_handler: Some(combobox_key),
            listeners: COMBOBOX_LISTENERS,
            ..Default::default()
        },

        Role::Slider => Capability {
            init: Some(|a| {
                a.set_input_type("range");
                init_range(a);
                a.set_step(1.0);
            }),
            key_handler: Some(range_key),
            listeners: RANGE_LISTENERS,
            ..Default::default()
        },
        Role::SpinButton => Capability {
            init: Some(|a| {
                a.set_input_type("number");
                init_range(a);
            }),
            key_handler: Some(range_key),
            listeners: RANGE_LISTENERS,
            ..Default::default()
        },
        Role::ScrollBar => Capability {
            init: Some(|a| {
                a.set_value_now(0.0);
                a.set_value_min(0.0);
                a.set_value_max(100.0);
                a.set_orientation("vertical");
            }),
            key_handler: Some(range_key),
            listeners: SCROLLBAR_LISTENERS,
            ..Default::default()
        },
        Role::ProgressBar => Capability {
            init: Some(|a| {
                a.set_value(0.0);
                a.set_max(100.0);
            }),
            ..Default::default()
        },
        Role::Meter => Capability {
            init: Some(init_range),
            ..Default::default()
        },

        Role::Tab | Role::Option => Capability {
            init: Some(|a| a.set_aria_selected(false)),
            key_handler: Some(selection_key),
            listeners: ACTIVATION_LISTENERS,
            ..Default::default()
        },

        Role::TextBox => Capability {
            init: Some(|a| {
                a.set_input_type("text");
                a.set_value("");
            }),
            listeners: TEXT_LISTENERS,
            ..Default::default()
        },
        Role::SearchBox => Capability {
            init: Some(|a| {
                a.set_input_type("search");
                a.set_value("");
            }),
            listeners: TEXT_LISTENERS,
            ..Default::default()
        },
        Role::TextArea => Capability {
            init: Some(|a| a.set_value("")),
            listeners: TEXT_LISTENERS,
            ..Default::default()
        },

        Role::Heading => Capability {
            init: Some(|a| a.set_level(2)),
            ..Default::default()
        },
        Role::TreeItem => Capability {
            validate_child: Some(single_group),
            ..Default::default()
        },

        Role::Row | Role::Cell | Role::GridCell | Role::ColumnHeader | Role::RowHeader => Capability {
            key_handler: Some(navigation::handle_key),
            listeners: KEY_LISTENERS,
            ..Default::default()
        },

        _ => Capability::default(),
    }
}

fn init_range(a: &mut Attributes) {
    a.set_value(0.0);
    a.set_min(0.0);
    a.set_max(100.0);
}

// === Child validators ===

/// Children of `parent` with `role`, ignoring `except`
fn count_children(tree: &AccessibilityTree, parent: NodeId, role: Role, except: NodeId) -> usize {
    tree.children(parent)
        .iter()
        .filter(|c| **c != except && tree.role(**c) == Some(role))
        .count()
}

fn single_child_of(
    tree: &AccessibilityTree,
    parent: NodeId,
    child: NodeId,
    role: Role,
    reason: &'static str,
) -> Result<()> {
    let (Some(parent_role), Some(child_role)) = (tree.role(parent), tree.role(child)) else {
        return Err(A11yError::StaleNode);
    };
    if child_role == role && count_children(tree, parent, role, child) > 0 {
        return Err(A11yError::ChildConstraint { parent: parent_role, child: child_role, reason });
    }
    Ok(())
}

fn single_table_head_and_foot(tree: &AccessibilityTree, parent: NodeId, child: NodeId) -> Result<()> {
    single_child_of(tree, parent, child, Role::TableHead, "a table has at most one TABLEHEAD")?;
    single_child_of(tree, parent, child, Role::TableFoot, "a table has at most one TABLEFOOT")
}

fn single_submenu(tree: &AccessibilityTree, parent: NodeId, child: NodeId) -> Result<()> {
    single_child_of(tree, parent, child, Role::Menu, "a menu item owns at most one submenu")
}

fn single_group(tree: &AccessibilityTree, parent: NodeId, child: NodeId) -> Result<()> {
    single_child_of(tree, parent, child, Role::Group, "a tree item owns at most one GROUP")
}

// === Activation ===

/// Activate a node as if by keyboard
///
/// Dispatches `keyboardClick`; unless the scene suppresses the default,
/// toggle roles flip their checked state.
pub fn activate(ctx: &mut KeyContext<'_>, node: NodeId) -> KeyOutcome {
    let Some(role) = ctx.tree.role(node) else {
        return KeyOutcome::Ignored;
    };
    if ctx.dispatch(node, SceneEvent::KeyboardClick).default_prevented() {
        return KeyOutcome::Handled;
    }

    let toggled = match role {
        Role::Checkbox | Role::Switch => ctx.tree.attributes_mut(node).map(|a| {
            let on = !a.checked().unwrap_or(false);
            a.set_checked(on);
        }),
        Role::MenuItemCheckbox => ctx.tree.attributes_mut(node).map(|a| {
            let on = !a.aria_checked().unwrap_or(false);
            a.set_aria_checked(on);
        }),
        Role::Radio => check_exclusive(ctx.tree, node, role, |a, on| a.set_checked(on)),
        Role::MenuItemRadio => check_exclusive(ctx.tree, node, role, |a, on| a.set_aria_checked(on)),
        Role::Tab | Role::Option => select_exclusive(ctx.tree, node, role),
        // toggle buttons only
        Role::Button if ctx.tree.attributes(node).is_some_and(|a| a.pressed().is_some()) => {
            ctx.tree.attributes_mut(node).map(|a| {
                let on = !a.pressed().unwrap_or(false);
                a.set_pressed(on);
            })
        }
        _ => Ok(()),
    };
    if let Err(e) = toggled {
        tracing::warn!("Activation of {} failed: {}", role, e);
    }
    KeyOutcome::Handled
}

/// Check `node`, unchecking same-role siblings
fn check_exclusive(
    tree: &mut AccessibilityTree,
    node: NodeId,
    role: Role,
    set: fn(&mut Attributes, bool),
) -> Result<()> {
    let siblings: Vec<NodeId> = match tree.parent(node) {
        Some(parent) => tree.children(parent).to_vec(),
        None => vec![node],
    };
    for sibling in siblings {
        if tree.role(sibling) != Some(role) {
            continue;
        }
        let on = sibling == node;
        let current = tree.attributes(sibling).and_then(|a| {
            if role == Role::Radio { a.checked() } else { a.aria_checked() }
        });
        if current != Some(on) {
            set(tree.attributes_mut(sibling)?, on);
        }
    }
    Ok(())
}

fn is_activation_key(role: Role, key: &Key) -> bool {
    match role {
        Role::Link => *key == Key::Enter,
        Role::Checkbox | Role::Switch | Role::Radio => *key == Key::Space,
        _ => matches!(key, Key::Enter | Key::Space),
    }
}

fn activation_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    let Some(role) = ctx.tree.role(node) else {
        return KeyOutcome::Ignored;
    };
    if is_activation_key(role, &input.key) {
        activate(ctx, node)
    } else {
        KeyOutcome::Ignored
    }
}

fn radio_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    if input.key == Key::Space {
        return activate(ctx, node);
    }
    selection_key(ctx, node, input)
}

// === Range widgets ===

/// Current value, bounds and step of a range widget
struct RangeState {
    value: f64,
    min: f64,
    max: f64,
    step: f64,
    aria: bool,
}

impl RangeState {
    fn read(role: Role, a: &Attributes) -> Self {
        if role == Role::ScrollBar {
            Self {
                value: a.value_now().unwrap_or(0.0),
                min: a.value_min().unwrap_or(0.0),
                max: a.value_max().unwrap_or(100.0),
                step: 1.0,
                aria: true,
            }
        } else {
            Self {
                value: a.value().and_then(|v| v.as_number()).unwrap_or(0.0),
                min: a.min().unwrap_or(0.0),
                max: a.max().unwrap_or(100.0),
                step: a.step().filter(|s| *s > 0.0).unwrap_or(1.0),
                aria: false,
            }
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = if self.min <= self.max { (self.min, self.max) } else { (self.max, self.min) };
        value.max(lo).min(hi)
    }

    fn write(&self, a: &mut Attributes, value: f64) {
        if self.aria {
            a.set_value_now(value);
        } else {
            a.set_value(value);
        }
    }
}

fn range_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    let Some((role, attrs)) = ctx.tree.node(node).map(|n| (n.role(), n.attributes())) else {
        return KeyOutcome::Ignored;
    };
    let range = RangeState::read(role, attrs);

    let (event, target) = match input.key {
        Key::ArrowUp | Key::ArrowRight => (Some(SceneEvent::Increment), range.value + range.step),
        Key::ArrowDown | Key::ArrowLeft => (Some(SceneEvent::Decrement), range.value - range.step),
        Key::PageUp => (None, range.value + range.step * 10.0),
        Key::PageDown => (None, range.value - range.step * 10.0),
        Key::Home => (None, range.min),
        Key::End => (None, range.max),
        _ => return KeyOutcome::Ignored,
    };

    if let Some(event) = event {
        if ctx.dispatch(node, event).default_prevented() {
            return KeyOutcome::Handled;
        }
    }
    set_range_value(ctx, node, target);
    KeyOutcome::Handled
}

/// Clamp, store and announce a new range value
fn set_range_value(ctx: &mut KeyContext<'_>, node: NodeId, value: f64) {
    let Some((role, attrs)) = ctx.tree.node(node).map(|n| (n.role(), n.attributes())) else {
        return;
    };
    let range = RangeState::read(role, attrs);
    let value = range.clamp(value);
    if value == range.value {
        return;
    }
    if let Ok(a) = ctx.tree.attributes_mut(node) {
        range.write(a, value);
    }
    ctx.dispatch(node, SceneEvent::ValueChanged { new_value: AttrValue::Num(value) });
}

/// Apply a value typed into the projected element
pub fn apply_input(ctx: &mut KeyContext<'_>, node: NodeId, value: &str) -> KeyOutcome {
    let Some(role) = ctx.tree.role(node) else {
        return KeyOutcome::Ignored;
    };
    match role {
        Role::Slider | Role::SpinButton | Role::ScrollBar => match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => set_range_value(ctx, node, n),
            _ => tracing::debug!("Ignoring non-numeric input {:?} for {}", value, role),
        },
        Role::TextBox | Role::SearchBox | Role::TextArea | Role::Combobox => {
            let unchanged = ctx
                .tree
                .attributes(node)
                .and_then(|a| a.value())
                .is_some_and(|v| v.to_text() == value);
            if unchanged {
                return KeyOutcome::Handled;
            }
            if let Ok(a) = ctx.tree.attributes_mut(node) {
                a.set_value(value);
            }
            ctx.dispatch(node, SceneEvent::ValueChanged { new_value: AttrValue::from(value) });
        }
        _ => return KeyOutcome::Ignored,
    }
    KeyOutcome::Handled
}

/// Forward a scroll of the projected element
pub fn apply_scroll(ctx: &mut KeyContext<'_>, node: NodeId, scroll_top: f64) -> KeyOutcome {
    if !ctx.tree.contains(node) {
        return KeyOutcome::Ignored;
    }
    ctx.dispatch(node, SceneEvent::Scroll { scroll_top });
    KeyOutcome::Handled
}

// === Menus ===

fn submenu_of(tree: &AccessibilityTree, item: NodeId) -> Option<NodeId> {
    tree.children(item).iter().copied().find(|c| tree.role(*c) == Some(Role::Menu))
}

/// The menu item owning the submenu `item` lives in
fn owning_item(tree: &AccessibilityTree, item: NodeId) -> Option<NodeId> {
    let menu = tree.parent(item).filter(|m| tree.role(*m) == Some(Role::Menu))?;
    tree.parent(menu).filter(|o| tree.role(*o) == Some(Role::MenuItem))
}

fn menu_item_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    let submenu = submenu_of(ctx.tree, node);
    match (&input.key, submenu) {
        (Key::Enter | Key::Space | Key::ArrowRight, Some(_)) => {
            if let Ok(a) = ctx.tree.attributes_mut(node) {
                a.set_expanded(true);
            }
            ctx.dispatch(node, SceneEvent::OpenMenu);
            KeyOutcome::Handled
        }
        (Key::Enter | Key::Space, None) => activate(ctx, node),
        (Key::Escape | Key::ArrowLeft, _) => {
            let Some(owner) = owning_item(ctx.tree, node) else {
                return KeyOutcome::Ignored;
            };
            if let Ok(a) = ctx.tree.attributes_mut(owner) {
                a.set_expanded(false);
            }
            ctx.dispatch(owner, SceneEvent::CloseMenu);
            ctx.focus(owner);
            KeyOutcome::Handled
        }
        (Key::ArrowUp | Key::ArrowDown | Key::Home | Key::End, _) => {
            const ITEMS: &[Role] = &[Role::MenuItem, Role::MenuItemCheckbox, Role::MenuItemRadio];
            match sibling_target(ctx.tree, node, ITEMS, &input.key, Axis::Vertical) {
                Some(target) => {
                    rove(ctx.tree, node, target);
                    ctx.focus(target);
                    KeyOutcome::Handled
                }
                None => KeyOutcome::Ignored,
            }
        }
        _ => KeyOutcome::Ignored,
    }
}

fn combobox_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    let (expanded, event) = match input.key {
        Key::ArrowDown => (true, SceneEvent::OpenMenu),
        Key::Escape => (false, SceneEvent::CloseMenu),
        _ => return KeyOutcome::Ignored,
    };
    if let Ok(a) = ctx.tree.attributes_mut(node) {
        a.set_expanded(expanded);
    }
    ctx.dispatch(node, event);
    KeyOutcome::Handled
}

// === Selection among siblings ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
    Both,
}

impl Axis {
    fn step(self, key: &Key) -> Option<isize> {
        match (self, key) {
            (Self::Vertical | Self::Both, Key::ArrowUp) => Some(-1),
            (Self::Vertical | Self::Both, Key::ArrowDown) => Some(1),
            (Self::Horizontal | Self::Both, Key::ArrowLeft) => Some(-1),
            (Self::Horizontal | Self::Both, Key::ArrowRight) => Some(1),
            _ => None,
        }
    }
}

/// Sibling a key moves to, `None` when the key does not apply
fn sibling_target(
    tree: &AccessibilityTree,
    node: NodeId,
    roles: &[Role],
    key: &Key,
    axis: Axis,
) -> Option<NodeId> {
    let parent = tree.parent(node)?;
    let items: Vec<NodeId> = tree
        .children(parent)
        .iter()
        .copied()
        .filter(|c| tree.role(*c).is_some_and(|r| roles.contains(&r)))
        .collect();
    let current = items.iter().position(|c| *c == node)?;
    let target = match key {
        Key::Home => 0,
        Key::End => items.len().checked_sub(1)?,
        key => {
            let step = axis.step(key)?;
            current.saturating_add_signed(step).min(items.len() - 1)
        }
    };
    items.get(target).copied()
}

/// Hand the roving tab stop from `from` to `to`
///
/// When focus sits on a descendant of `from` (the key bubbled up to it),
/// that descendant is the origin of the move and gives up its stop too.
pub(crate) fn rove(tree: &mut AccessibilityTree, from: NodeId, to: NodeId) {
    let inner = tree
        .focused()
        .filter(|f| *f != from && *f != to && tree.ancestors(*f).contains(&from));
    let origin = inner.unwrap_or(from);
    if origin == to {
        return;
    }
    let inherited = tree
        .attributes(origin)
        .map(TabIndex::of)
        .and_then(|t| t.value())
        .unwrap_or(0);
    if let Ok(a) = tree.attributes_mut(to) {
        a.set_tab_index(inherited);
    }
    for stale in [Some(from), inner].into_iter().flatten() {
        if stale == to {
            continue;
        }
        if let Ok(a) = tree.attributes_mut(stale) {
            a.set_tab_index(-1);
        }
    }
}

fn selection_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    let Some(role) = ctx.tree.role(node) else {
        return KeyOutcome::Ignored;
    };
    let axis = match role {
        Role::Option => Axis::Vertical,
        Role::Tab => Axis::Horizontal,
        _ => Axis::Both,
    };
    if matches!(role, Role::Tab | Role::Option) && is_activation_key(role, &input.key) {
        return activate(ctx, node);
    }
    let Some(target) = sibling_target(ctx.tree, node, &[role], &input.key, axis) else {
        return KeyOutcome::Ignored;
    };
    if target == node {
        return KeyOutcome::Handled;
    }

    let select = if role == Role::Radio {
        check_exclusive(ctx.tree, target, role, |a, on| a.set_checked(on))
    } else {
        select_exclusive(ctx.tree, target, role)
    };
    if let Err(e) = select {
        tracing::warn!("Selection change failed: {}", e);
        return KeyOutcome::Handled;
    }
    rove(ctx.tree, node, target);

    if let Some(container) = ctx.tree.parent(target) {
        let index = ctx.tree.children(container).iter().position(|c| *c == target).unwrap_or(0);
        ctx.dispatch(container, SceneEvent::SelectionChanged { index });
    }
    ctx.focus(target);
    KeyOutcome::Handled
}

/// Set `aria-selected` on `node` and clear it on same-role siblings
fn select_exclusive(tree: &mut AccessibilityTree, node: NodeId, role: Role) -> Result<()> {
    let multi = tree
        .parent(node)
        .and_then(|p| tree.attributes(p))
        .and_then(|a| a.multi_selectable())
        .unwrap_or(false);
    let siblings: Vec<NodeId> = match tree.parent(node) {
        Some(parent) if !multi => tree.children(parent).to_vec(),
        _ => vec![node],
    };
    for sibling in siblings {
        if tree.role(sibling) != Some(role) {
            continue;
        }
        let on = sibling == node;
        if tree.attributes(sibling).and_then(|a| a.aria_selected()) != Some(on) {
            tree.attributes_mut(sibling)?.set_aria_selected(on);
        }
    }
    Ok(())
}
