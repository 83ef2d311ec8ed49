//! Engine tests for parallax
//!
//! Mount lifecycle, frame ticks and DOM event routing through the
//! tree registry.

use parallax::a11y::{MemoryScene, SceneEvent};
use parallax::dom::MemoryDom;
use parallax::{
    AttrValue, Config, DomBackend, DomEvent, DomEventKind, ElementId, EngineError, Key,
    KeyOutcome, MountId, NodeId, Rect, Role, Surface, TreeRegistry,
};

struct Host {
    scene: MemoryScene,
    dom: MemoryDom,
    registry: TreeRegistry,
}

impl Host {
    fn new(config: Config) -> Self {
        Self { scene: MemoryScene::new(), dom: MemoryDom::new(), registry: TreeRegistry::new(config) }
    }

    fn mount(&mut self, role: Role) -> MountId {
        let object = self.scene.add(None, Rect::from_xywh(0.0, 0.0, 400.0, 300.0));
        let body = self.dom.root();
        let container = self.registry.create_container(&mut self.dom, body).unwrap();
        self.registry.create(object, role, container).unwrap()
    }

    fn add(&mut self, mount: MountId, parent: NodeId, role: Role) -> NodeId {
        let tree = self.registry.tree_mut(mount).unwrap();
        let object = self.scene.add(tree.object(parent), Rect::from_xywh(10.0, 10.0, 80.0, 20.0));
        let node = tree.bind(object, role).unwrap();
        tree.add_child(parent, node).unwrap();
        node
    }

    fn root(&self, mount: MountId) -> NodeId {
        self.registry.tree(mount).unwrap().root().unwrap()
    }

    fn element(&self, mount: MountId, node: NodeId) -> ElementId {
        let dom_id = self.registry.tree(mount).unwrap().dom_id(node).unwrap();
        self.dom.element_by_id(dom_id).unwrap()
    }

    fn tick(&mut self) -> parallax::TickReport {
        self.registry.tick(&self.scene, &mut self.dom)
    }

    fn send(&mut self, mut event: DomEvent) -> (KeyOutcome, DomEvent) {
        let outcome = self.registry.handle_dom_event(&mut self.scene, &mut self.dom, &mut event);
        (outcome, event)
    }
}

// ============================================================================
// MOUNTS
// ============================================================================

#[test]
fn test_mounts_project_distinct_ids() {
    let mut host = Host::new(Config::default());
    let a = host.mount(Role::Application);
    let b = host.mount(Role::Application);
    let button_a = host.add(a, host.root(a), Role::Button);
    let button_b = host.add(b, host.root(b), Role::Button);

    let report = host.tick();
    assert_eq!(report.visited(), 4);
    assert_eq!(report.stats(a).map(|s| s.created), Some(2));

    let id_a = host.registry.tree(a).unwrap().dom_id(button_a).unwrap().to_string();
    let id_b = host.registry.tree(b).unwrap().dom_id(button_b).unwrap().to_string();
    assert!(id_a.starts_with("pxa-0-"));
    assert!(id_b.starts_with("pxa-1-"));
    assert_eq!(host.registry.locate(&host.dom, host.element(b, button_b)), Some((b, button_b)));

    assert!(host.tick().is_idle());
}

#[test]
fn test_destroy_removes_projection() {
    let mut host = Host::new(Config::default());
    let mount = host.mount(Role::Document);
    host.tick();
    let root_el = host.element(mount, host.root(mount));
    let container = host.registry.translator(mount).unwrap().container();

    host.registry.destroy(mount, &mut host.dom).unwrap();
    assert!(host.registry.is_empty());
    assert!(host.dom.children(container).is_empty());
    assert_eq!(host.dom.tag(root_el), None);
    assert!(matches!(host.registry.tree(mount), Err(EngineError::UnknownMount(m)) if m == mount));
    assert!(host.registry.destroy(mount, &mut host.dom).is_err());
}

#[test]
fn test_container_requires_live_parent() {
    let mut host = Host::new(Config::default());
    let body = host.dom.root();
    let parent = host.registry.create_container(&mut host.dom, body).unwrap();
    host.dom.destroy(parent);
    let result = host.registry.create_container(&mut host.dom, parent);
    assert!(matches!(result, Err(EngineError::Dom(_))));
}

#[test]
fn test_config_drives_translators() {
    let config = Config::from_json(
        r#"{"dom_id_prefix": "acc-", "surface": {"device_width": 800, "device_height": 600, "css_width": 400, "css_height": 300}}"#,
    )
    .unwrap();
    let mut host = Host::new(config);
    let mount = host.mount(Role::Region);
    host.tick();

    let root = host.root(mount);
    let el = host.element(mount, root);
    let object = host.registry.tree(mount).unwrap().object(root).unwrap();
    let expected = format!("acc-0-{}", object);
    assert_eq!(host.dom.attribute(el, "id"), Some(expected.as_str()));
    let style = host.dom.attribute(el, "style").unwrap();
    assert!(style.contains("width:200px;height:150px"), "{}", style);
    assert!(style.contains("outline:none"));

    host.registry.set_surface(Surface::default());
    let report = host.tick();
    assert_eq!(report.visited(), 1);
    let style = host.dom.attribute(el, "style").unwrap();
    assert!(style.contains("width:400px;height:300px"), "{}", style);
}

// ============================================================================
// DOM EVENTS
// ============================================================================

#[test]
fn test_space_toggles_checkbox() {
    let mut host = Host::new(Config::default());
    let mount = host.mount(Role::Form);
    let checkbox = host.add(mount, host.root(mount), Role::Checkbox);
    host.tick();
    let el = host.element(mount, checkbox);

    let (outcome, event) = host.send(DomEvent::key_down(el, Key::Space));
    assert_eq!(outcome, KeyOutcome::Handled);
    assert!(event.is_default_prevented());
    assert!(event.is_propagation_stopped());
    let object = host.registry.tree(mount).unwrap().object(checkbox).unwrap();
    assert_eq!(host.scene.dispatched(), &[(object, SceneEvent::KeyboardClick)]);

    host.tick();
    assert_eq!(host.dom.attribute(el, "checked"), Some(""));

    let (outcome, event) = host.send(DomEvent::key_down(el, Key::Character('x')));
    assert_eq!(outcome, KeyOutcome::Ignored);
    assert!(!event.is_default_prevented());
}

#[test]
fn test_keydown_bubbles_to_ancestor() {
    let mut host = Host::new(Config::default());
    let mount = host.mount(Role::Menu);
    let menu = host.root(mount);
    let first = host.add(mount, menu, Role::MenuItem);
    let second = host.add(mount, menu, Role::MenuItem);
    let label = host.add(mount, first, Role::Text);
    host.tick();

    let (outcome, _) = host.send(DomEvent::key_down(host.element(mount, label), Key::ArrowDown));
    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(host.registry.tree(mount).unwrap().focused(), Some(second));
    assert_eq!(host.dom.focused(), Some(host.element(mount, second)));
}

#[test]
fn test_input_updates_text_value() {
    let mut host = Host::new(Config::default());
    let mount = host.mount(Role::Form);
    let field = host.add(mount, host.root(mount), Role::TextBox);
    host.tick();

    let (outcome, _) = host.send(DomEvent::input(host.element(mount, field), "hello"));
    assert_eq!(outcome, KeyOutcome::Handled);
    let tree = host.registry.tree(mount).unwrap();
    assert_eq!(tree.attributes(field).and_then(|a| a.value()).map(|v| v.to_text()), Some("hello".to_string()));
    let object = tree.object(field).unwrap();
    assert_eq!(
        host.scene.dispatched(),
        &[(object, SceneEvent::ValueChanged { new_value: AttrValue::from("hello") })]
    );
}

#[test]
fn test_scroll_is_forwarded() {
    let mut host = Host::new(Config::default());
    let mount = host.mount(Role::Listbox);
    host.tick();
    let root = host.root(mount);

    let (outcome, event) = host.send(DomEvent::scroll(host.element(mount, root), 120.0));
    assert_eq!(outcome, KeyOutcome::Handled);
    assert!(!event.is_default_prevented());
    let object = host.registry.tree(mount).unwrap().object(root).unwrap();
    assert_eq!(host.scene.dispatched(), &[(object, SceneEvent::Scroll { scroll_top: 120.0 })]);
}

#[test]
fn test_focus_event_records_node() {
    let mut host = Host::new(Config::default());
    let mount = host.mount(Role::Application);
    let button = host.add(mount, host.root(mount), Role::Button);
    host.tick();

    let el = host.element(mount, button);
    let (outcome, _) = host.send(DomEvent::new(el, DomEventKind::Focus));
    assert_eq!(outcome, KeyOutcome::Ignored);
    assert_eq!(host.registry.tree(mount).unwrap().focused(), Some(button));
}

#[test]
fn test_unprojected_element_is_ignored() {
    let mut host = Host::new(Config::default());
    let mount = host.mount(Role::Application);
    host.tick();
    let container = host.registry.translator(mount).unwrap().container();

    let (outcome, event) = host.send(DomEvent::click(container));
    assert_eq!(outcome, KeyOutcome::Ignored);
    assert!(!event.is_default_prevented());
    assert!(host.scene.dispatched().is_empty());
}
