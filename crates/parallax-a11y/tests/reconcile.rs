//! Reconciliation tests for parallax-a11y
//!
//! Drives the translator against the in-memory scene and DOM.

use parallax_a11y::{
    AccessibilityTree, Attr, NodeId, Relation, Role, Surface, Transform, Translator, request_focus,
    FocusOutcome, MemoryScene,
};
use parallax_dom::{DomBackend, ElementId, MemoryDom, Rect};

struct Harness {
    scene: MemoryScene,
    dom: MemoryDom,
    tree: AccessibilityTree,
    translator: Translator,
}

impl Harness {
    fn new() -> Self {
        let dom = MemoryDom::new();
        let translator = Translator::new(dom.root(), Surface::default());
        Self { scene: MemoryScene::new(), dom, tree: AccessibilityTree::new("pxa-"), translator }
    }

    fn node(&mut self, parent: Option<NodeId>, role: Role, bounds: Rect) -> NodeId {
        let scene_parent = parent.and_then(|p| self.tree.object(p));
        let object = self.scene.add(scene_parent, bounds);
        let node = self.tree.bind(object, role).unwrap();
        match parent {
            Some(p) => self.tree.add_child(p, node).unwrap(),
            None => self.tree.set_root(node).unwrap(),
        }
        node
    }

    fn update(&mut self) -> parallax_a11y::UpdateStats {
        self.translator.update(&mut self.tree, &self.scene, &mut self.dom)
    }

    fn element(&self, node: NodeId) -> ElementId {
        self.dom.element_by_id(self.tree.dom_id(node).unwrap()).unwrap()
    }
}

fn area() -> Rect {
    Rect::from_xywh(0.0, 0.0, 100.0, 100.0)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_checkbox_checked_projection() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Form, area());
    let checkbox = h.node(Some(root), Role::Checkbox, Rect::from_xywh(5.0, 5.0, 10.0, 10.0));

    assert_eq!(h.tree.attributes(checkbox).unwrap().checked(), Some(false));
    h.update();
    let el = h.element(checkbox);
    assert_eq!(h.dom.tag(el), Some("input"));
    assert_eq!(h.dom.attribute(el, "type"), Some("checkbox"));
    assert_eq!(h.dom.attribute(el, "checked"), None);

    h.tree.attributes_mut(checkbox).unwrap().set_checked(true);
    h.update();
    assert_eq!(h.dom.attribute(el, "checked"), Some(""));
}

#[test]
fn test_second_pass_is_silent() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Application, area());
    let list = h.node(Some(root), Role::List, Rect::from_xywh(0.0, 0.0, 50.0, 50.0));
    for i in 0..3 {
        h.node(Some(list), Role::ListItem, Rect::from_xywh(0.0, i as f64 * 10.0, 50.0, 10.0));
    }

    let first = h.update();
    assert_eq!(first.visited, 5);
    h.dom.reset_stats();

    let second = h.update();
    assert_eq!(second.visited, 0);
    assert_eq!(second.mutations(), 0);
    assert_eq!(h.dom.stats().total(), 0);
}

#[test]
fn test_clean_subtree_is_skipped() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Application, area());
    let left = h.node(Some(root), Role::Group, area());
    let right = h.node(Some(root), Role::Group, area());
    let button = h.node(Some(left), Role::Button, area());
    h.node(Some(right), Role::Button, area());
    h.update();

    h.tree.attributes_mut(button).unwrap().set_label("Save");
    let stats = h.update();
    // root, left, button
    assert_eq!(stats.visited, 3);
    assert_eq!(stats.attrs_set, 1);
    assert_eq!(h.dom.attribute(h.element(button), "aria-label"), Some("Save"));
}

#[test]
fn test_every_visited_node_is_clean_after_pass() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Grid, area());
    let body = h.node(Some(root), Role::TableBody, area());
    let row = h.node(Some(body), Role::Row, area());
    let cell = h.node(Some(row), Role::GridCell, area());
    h.update();
    for n in [root, body, row, cell] {
        assert!(!h.tree.is_marked_for_update(n));
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[test]
fn test_flipped_bounds_stay_inside_parent() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Region, Rect::from_xywh(0.0, 0.0, 200.0, 200.0));
    let child = h.node(Some(root), Role::Img, Rect::from_xywh(0.0, 0.0, 40.0, 20.0));
    let object = h.tree.object(child).unwrap();
    h.scene.set_transform(object, Transform::translate(100.0, 80.0).with_scale(-1.0, -1.0));

    h.update();
    let style = h.dom.attribute(h.element(child), "style").unwrap().to_string();
    assert!(style.contains("left:60px;top:60px;width:40px;height:20px"), "{}", style);
}

#[test]
fn test_missing_bounds_fall_back() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Region, area());
    let child = h.node(Some(root), Role::Button, area());
    let object = h.tree.object(child).unwrap();
    h.scene.set_bounds(object, None);

    let stats = h.update();
    assert_eq!(stats.fallbacks, 1);
    let style = h.dom.attribute(h.element(child), "style").unwrap();
    assert!(style.contains("left:0px;top:0px;width:1px;height:1px"));
}

#[test]
fn test_surface_scale_applies() {
    let mut h = Harness::new();
    h.translator.set_surface(Surface::new(200.0, 200.0, 100.0, 100.0));
    let root = h.node(None, Role::Region, Rect::from_xywh(20.0, 40.0, 100.0, 60.0));
    h.update();
    let style = h.dom.attribute(h.element(root), "style").unwrap();
    assert!(style.contains("left:10px;top:20px;width:50px;height:30px"));
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn test_reparent_moves_element() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Application, area());
    let x = h.node(Some(root), Role::Group, area());
    let y = h.node(Some(root), Role::Group, area());
    let button = h.node(Some(x), Role::Button, area());
    h.update();
    let button_el = h.element(button);

    h.tree.add_child(y, button).unwrap();
    let stats = h.update();

    assert_eq!(h.element(button), button_el);
    assert_eq!(h.dom.children(h.element(y)), vec![button_el]);
    assert!(h.dom.children(h.element(x)).is_empty());
    assert_eq!(stats.created, 0);
    assert_eq!(stats.destroyed, 0);
}

#[test]
fn test_child_order_follows_tree() {
    let mut h = Harness::new();
    let root = h.node(None, Role::List, area());
    let items: Vec<_> = (0..3).map(|_| h.node(Some(root), Role::ListItem, area())).collect();
    h.update();

    h.tree.add_child_at(root, items[2], 0).unwrap();
    h.update();
    let expected: Vec<_> = [items[2], items[0], items[1]].iter().map(|n| h.element(*n)).collect();
    assert_eq!(h.dom.children(h.element(root)), expected);
}

#[test]
fn test_removed_subtree_is_destroyed_and_rebuilt() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Application, area());
    let group = h.node(Some(root), Role::Group, area());
    let button = h.node(Some(group), Role::Button, area());
    h.update();

    h.tree.remove_child(root, group);
    let stats = h.update();
    assert_eq!(stats.destroyed, 1);
    assert!(h.dom.element_by_id(h.tree.dom_id(group).unwrap()).is_none());
    assert!(h.dom.element_by_id(h.tree.dom_id(button).unwrap()).is_none());

    h.tree.add_child(root, group).unwrap();
    h.update();
    let group_el = h.element(group);
    assert_eq!(h.dom.children(group_el), vec![h.element(button)]);
    assert_eq!(h.dom.attribute(h.element(button), "type"), Some("button"));
}

#[test]
fn test_nested_menu_item_is_replaced_with_div() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Menu, area());
    let outer = h.node(Some(root), Role::MenuItem, area());
    let label = h.node(None, Role::MenuItem, area());
    h.tree.set_root(root).unwrap();
    h.update();
    assert!(h.dom.element_by_id(h.tree.dom_id(label).unwrap()).is_none());

    h.tree.add_child(outer, label).unwrap();
    h.update();
    let el = h.element(label);
    assert_eq!(h.dom.tag(el), Some("div"));
    assert_eq!(h.dom.attribute(el, "role"), None);
    assert_eq!(h.dom.attribute(h.element(outer), "role"), Some("menuitem"));

    // moved back under a menu: becomes an <li> again
    h.tree.add_child(root, label).unwrap();
    let stats = h.update();
    assert_eq!(stats.replaced, 1);
    let el = h.element(label);
    assert_eq!(h.dom.tag(el), Some("li"));
    assert_eq!(h.dom.attribute(el, "role"), Some("menuitem"));
    assert_eq!(h.dom.parent(el), Some(h.element(root)));
}

#[test]
fn test_hidden_and_disabled_inference() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Application, area());
    let hidden = h.node(Some(root), Role::Button, area());
    let link = h.node(Some(root), Role::Link, area());
    h.scene.set_visible(h.tree.object(hidden).unwrap(), false);
    h.scene.on(h.tree.object(link).unwrap(), parallax_a11y::EventType::PointerTap, |_, _| {
        parallax_a11y::Dispatch::Handled
    });
    h.update();

    assert_eq!(h.dom.attribute(h.element(hidden), "hidden"), Some(""));
    assert_eq!(h.dom.attribute(h.element(link), "aria-disabled"), Some("true"));

    h.tree.set_visible(hidden, Some(true)).unwrap();
    h.update();
    assert_eq!(h.dom.attribute(h.element(hidden), "hidden"), None);
}

#[test]
fn test_stale_attribute_removed() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Region, area());
    h.tree.set_attribute(root, Attr::Title, "Panel").unwrap();
    h.update();
    assert_eq!(h.dom.attribute(h.element(root), "title"), Some("Panel"));

    h.tree.remove_attribute(root, Attr::Title).unwrap();
    let stats = h.update();
    assert_eq!(stats.attrs_removed, 1);
    assert_eq!(h.dom.attribute(h.element(root), "title"), None);
}

#[test]
fn test_released_relation_target_leaves_no_dangling_id() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Region, area());
    let label = h.node(Some(root), Role::Label, area());
    let input = h.node(Some(root), Role::TextBox, area());
    h.tree.set_relation(input, Relation::LabelledBy, Some(label)).unwrap();
    h.update();
    let label_id = h.tree.dom_id(label).unwrap().to_string();
    let input_el = h.element(input);
    assert_eq!(h.dom.attribute(input_el, "aria-labelledby"), Some(label_id.as_str()));

    h.tree.release(label).unwrap();
    assert!(h.tree.is_marked_for_update(input));
    h.update();

    assert_eq!(h.tree.relation(input, Relation::LabelledBy), None);
    assert!(h.dom.element_by_id(&label_id).is_none());
    assert_eq!(h.dom.attribute(input_el, "aria-labelledby"), None);
}

// ============================================================================
// FOCUS
// ============================================================================

#[test]
fn test_deferred_focus_lands_after_pass() {
    let mut h = Harness::new();
    let root = h.node(None, Role::Application, area());
    let button = h.node(Some(root), Role::Button, area());
    h.scene.set_interactive(h.tree.object(button).unwrap(), true);

    let outcome = request_focus(&mut h.tree, &h.scene, &mut h.dom, button).unwrap();
    assert_eq!(outcome, FocusOutcome::Deferred);

    h.update();
    assert_eq!(h.dom.focused(), Some(h.element(button)));
    assert_eq!(h.tree.focused(), Some(button));
    assert_eq!(h.tree.pending_focus(), None);
}

#[test]
fn test_root_change_remounts() {
    let mut h = Harness::new();
    let first = h.node(None, Role::Application, area());
    h.update();
    let second = h.node(None, Role::Document, area());
    h.update();

    let container = h.dom.root();
    assert_eq!(h.dom.children(container), vec![h.element(second)]);
    assert!(h.dom.element_by_id(h.tree.dom_id(first).unwrap()).is_none());
}
