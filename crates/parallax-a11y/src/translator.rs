//! Translator
//!
//! Incremental reconciliation of the accessibility tree into a live DOM
//! subtree. Each pass walks breadth-first from the root through dirty
//! nodes only, places every visited node relative to its parent, builds
//! the element it should have and patches the DOM to match: create on
//! demand, replace on tag change, keyed child diff, attribute diff.

use std::collections::{HashSet, VecDeque};

use parallax_dom::{DomBackend, ElementId, Listener, Point};

use crate::arena::NodeId;
use crate::focus;
use crate::layout::{self, Placement, Surface};
use crate::role::Role;
use crate::scene::SceneGraph;
use crate::tree::AccessibilityTree;

/// Tags that support the `disabled` attribute natively
const FORM_TAGS: &[&str] = &["button", "fieldset", "input", "select", "textarea"];

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub visited: usize,
    pub created: usize,
    pub replaced: usize,
    pub attrs_set: usize,
    pub attrs_removed: usize,
    pub inserted: usize,
    pub removed: usize,
    pub destroyed: usize,
    /// Nodes placed with the placeholder rectangle
    pub fallbacks: usize,
}

impl UpdateStats {
    /// DOM mutations of any kind
    pub fn mutations(&self) -> usize {
        self.created
            + self.replaced
            + self.attrs_set
            + self.attrs_removed
            + self.inserted
            + self.removed
            + self.destroyed
    }
}

/// Element a node should project to
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    pub tag: &'static str,
    /// Wire-form attributes, `id` first
    pub attributes: Vec<(String, String)>,
    pub listeners: &'static [Listener],
}

/// Reconciliation engine for one mounted tree
#[derive(Debug)]
pub struct Translator {
    container: ElementId,
    surface: Surface,
    placeholder: f64,
    focus_outline: bool,
    first_run: bool,
    mounted: Option<ElementId>,
}

impl Translator {
    /// Translator projecting into `container`
    pub fn new(container: ElementId, surface: Surface) -> Self {
        Self {
            container,
            surface,
            placeholder: 1.0,
            focus_outline: false,
            first_run: true,
            mounted: None,
        }
    }

    /// Side of the square used when bounds are unavailable
    pub fn with_placeholder(mut self, size: f64) -> Self {
        self.placeholder = size;
        self
    }

    /// Keep the platform focus outline on projected elements
    pub fn with_focus_outline(mut self, enabled: bool) -> Self {
        self.focus_outline = enabled;
        self
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Element currently projecting the root node
    pub fn mounted(&self) -> Option<ElementId> {
        self.mounted
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Change the surface; the next pass revisits every node
    pub fn set_surface(&mut self, surface: Surface) {
        if self.surface != surface {
            self.surface = surface;
            self.first_run = true;
        }
    }

    /// Force the next pass to treat the whole tree as dirty
    pub fn invalidate(&mut self) {
        self.first_run = true;
    }

    /// Run one reconciliation pass
    pub fn update(
        &mut self,
        tree: &mut AccessibilityTree,
        scene: &dyn SceneGraph,
        dom: &mut dyn DomBackend,
    ) -> UpdateStats {
        let mut stats = UpdateStats::default();
        let mut detached = Vec::new();

        let Some(root) = tree.root() else {
            if let Some(old) = self.mounted.take() {
                dom.destroy(old);
                stats.destroyed += 1;
            }
            return stats;
        };

        if self.first_run {
            tree.mark_subtree_for_update(root);
            self.first_run = false;
        }

        let mut queue = VecDeque::new();
        if tree.is_marked_for_update(root) {
            queue.push_back((root, Point::ORIGIN));
        }

        while let Some((node, parent_origin)) = queue.pop_front() {
            if !tree.is_marked_for_update(node) {
                continue;
            }
            let Some(object) = tree.object(node) else { continue };
            stats.visited += 1;

            let placement = layout::place(scene, object, parent_origin, &self.surface, self.placeholder);
            if placement.fallback {
                stats.fallbacks += 1;
                tracing::warn!("No bounds for object {}, using placeholder", object);
            }

            let Some(spec) = self.describe(tree, scene, node, &placement) else { continue };
            let el = self.ensure_element(tree, dom, node, &spec, &mut stats);

            if node == root {
                self.mount(dom, el, &mut detached, &mut stats);
            }
            sync_attributes(dom, el, &spec.attributes, &mut stats);
            self.sync_children(tree, dom, node, el, &mut detached, &mut stats);
            tree.mark_as_updated(node);

            for &child in tree.children(node) {
                if tree.is_marked_for_update(child) {
                    queue.push_back((child, placement.origin));
                }
            }
        }

        for el in detached {
            if dom.parent(el).is_none() && dom.tag(el).is_some() {
                dom.destroy(el);
                stats.destroyed += 1;
            }
        }

        if let Some(pending) = tree.take_pending_focus() {
            match focus::request_focus(tree, scene, dom, pending) {
                Ok(outcome) => tracing::debug!("Pending focus applied: {:?}", outcome),
                Err(e) => tracing::warn!("Pending focus failed: {}", e),
            }
        }

        if stats.visited > 0 {
            tracing::debug!(
                "Reconciled {} nodes: {} created, {} replaced, {} attrs set, {} removed, {} destroyed",
                stats.visited,
                stats.created,
                stats.replaced,
                stats.attrs_set,
                stats.attrs_removed,
                stats.destroyed
            );
        }
        stats
    }

    /// Remove the mounted subtree from the DOM
    pub fn teardown(&mut self, dom: &mut dyn DomBackend) {
        if let Some(el) = self.mounted.take() {
            dom.destroy(el);
        }
        self.first_run = true;
    }

    /// Build the element description for a node
    pub fn describe(
        &self,
        tree: &AccessibilityTree,
        scene: &dyn SceneGraph,
        node: NodeId,
        placement: &Placement,
    ) -> Option<ElementSpec> {
        let n = tree.node(node)?;
        let registry = tree.registry();
        let tag = tag_for(tree, node)?;

        let mut attributes = vec![("id".to_string(), n.dom_id().to_string())];
        if registry.emits_role_attribute(n.role()) && !is_submenu_label(tree, node) {
            attributes.push(("role".to_string(), n.role().aria_name().to_string()));
        }
        attributes.extend(n.attributes().projected());
        for (relation, target) in n.relations() {
            if let Some(target_id) = tree.dom_id(target) {
                attributes.push((relation.wire_name().to_string(), target_id.to_string()));
            }
        }
        attributes.push(("style".to_string(), layout::style_for(&placement.rect, self.focus_outline)));

        if !focus::is_visible(tree, scene, node) {
            attributes.push(("hidden".to_string(), String::new()));
        }
        if !focus::is_enabled(tree, scene, node) {
            if FORM_TAGS.contains(&tag) {
                attributes.push(("disabled".to_string(), String::new()));
            } else {
                attributes.push(("aria-disabled".to_string(), "true".to_string()));
            }
        }

        Some(ElementSpec {
            tag,
            attributes,
            listeners: registry.capability(n.role()).listeners,
        })
    }

    /// Find the node's element, creating it or replacing it on tag change
    fn ensure_element(
        &mut self,
        tree: &AccessibilityTree,
        dom: &mut dyn DomBackend,
        node: NodeId,
        spec: &ElementSpec,
        stats: &mut UpdateStats,
    ) -> ElementId {
        let dom_id = tree.dom_id(node).unwrap_or_default();
        let Some(old) = dom.element_by_id(dom_id) else {
            stats.created += 1;
            return dom.create_element(spec.tag, &spec.attributes, spec.listeners);
        };
        if dom.tag(old) == Some(spec.tag) {
            return old;
        }

        tracing::trace!("Replacing <{:?}> for {} with <{}>", dom.tag(old), dom_id, spec.tag);
        let new = dom.create_element(spec.tag, &spec.attributes, spec.listeners);
        for (i, child) in dom.children(old).into_iter().enumerate() {
            if let Err(e) = dom.insert_child(new, child, i) {
                tracing::warn!("Failed to move child during replace: {}", e);
            }
        }
        if let Some(parent) = dom.parent(old) {
            let index = dom.children(parent).iter().position(|c| *c == old).unwrap_or(0);
            if let Err(e) = dom.insert_child(parent, new, index) {
                tracing::warn!("Failed to insert replacement: {}", e);
            }
        }
        if self.mounted == Some(old) {
            self.mounted = Some(new);
        }
        dom.destroy(old);
        stats.replaced += 1;
        new
    }

    /// Keep the root element as the container's child
    fn mount(
        &mut self,
        dom: &mut dyn DomBackend,
        el: ElementId,
        detached: &mut Vec<ElementId>,
        stats: &mut UpdateStats,
    ) {
        if let Some(old) = self.mounted.filter(|old| *old != el) {
            if dom.remove_child(self.container, old) {
                stats.removed += 1;
                detached.push(old);
            }
        }
        if dom.parent(el) != Some(self.container) {
            let index = dom.children(self.container).len();
            match dom.insert_child(self.container, el, index) {
                Ok(()) => stats.inserted += 1,
                Err(e) => tracing::warn!("Failed to mount root element: {}", e),
            }
        }
        self.mounted = Some(el);
    }

    /// Make the element's children match the node's children, by id
    fn sync_children(
        &self,
        tree: &mut AccessibilityTree,
        dom: &mut dyn DomBackend,
        node: NodeId,
        el: ElementId,
        detached: &mut Vec<ElementId>,
        stats: &mut UpdateStats,
    ) {
        let children = tree.children(node).to_vec();
        let mut desired = Vec::with_capacity(children.len());
        for child in children {
            let Some(dom_id) = tree.dom_id(child).map(str::to_string) else { continue };
            let child_el = match dom.element_by_id(&dom_id) {
                Some(existing) => existing,
                None => {
                    let tag = tag_for(tree, child).unwrap_or("div");
                    let listeners = tree
                        .role(child)
                        .map(|r| tree.registry().capability(r).listeners)
                        .unwrap_or(&[]);
                    let created = dom.create_element(tag, &[("id".to_string(), dom_id)], listeners);
                    stats.created += 1;
                    // a fresh element needs its whole subtree projected
                    tree.mark_local(child);
                    created
                }
            };
            desired.push(child_el);
        }

        for (i, child_el) in desired.iter().enumerate() {
            if dom.children(el).get(i) == Some(child_el) {
                continue;
            }
            match dom.insert_child(el, *child_el, i) {
                Ok(()) => stats.inserted += 1,
                Err(e) => tracing::warn!("Failed to insert child element: {}", e),
            }
        }

        let current = dom.children(el);
        for extra in current.into_iter().skip(desired.len()) {
            if dom.remove_child(el, extra) {
                stats.removed += 1;
                detached.push(extra);
            }
        }
    }
}

/// A MENUITEM directly under a MENUITEM pairs a label with a submenu
fn is_submenu_label(tree: &AccessibilityTree, node: NodeId) -> bool {
    tree.role(node) == Some(Role::MenuItem)
        && tree.parent(node).and_then(|p| tree.role(p)) == Some(Role::MenuItem)
}

fn tag_for(tree: &AccessibilityTree, node: NodeId) -> Option<&'static str> {
    let role = tree.role(node)?;
    if is_submenu_label(tree, node) {
        return Some("div");
    }
    Some(tree.registry().tag_for(role))
}

fn sync_attributes(
    dom: &mut dyn DomBackend,
    el: ElementId,
    desired: &[(String, String)],
    stats: &mut UpdateStats,
) {
    for (name, value) in desired {
        if dom.set_attribute(el, name, value) {
            stats.attrs_set += 1;
        }
    }
    let keep: HashSet<&str> = desired.iter().map(|(n, _)| n.as_str()).collect();
    for name in dom.attribute_names(el) {
        if !keep.contains(name.as_str()) && dom.remove_attribute(el, &name) {
            stats.attrs_removed += 1;
        }
    }
}
