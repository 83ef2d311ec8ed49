//! Accessibility Tree
//!
//! Nodes live in a generational arena; parent links are plain [`NodeId`]s.
//! Every structural mutation goes through [`AccessibilityTree`], which
//! checks the role registry and the role's capability before touching
//! anything, and keeps the dirty flag bubbled up to the root.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use crate::arena::{NodeArena, NodeId};
use crate::attributes::{Attr, AttrValue, Attributes};
use crate::role::{Role, RoleRegistry};
use crate::scene::ObjectId;
use crate::{A11yError, Result};

/// Relationship attribute pointing at another node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Controls,
    DescribedBy,
    LabelledBy,
    FlowTo,
    Owns,
    ActiveDescendant,
}

impl Relation {
    pub const ALL: &'static [Relation] = &[
        Self::Controls,
        Self::DescribedBy,
        Self::LabelledBy,
        Self::FlowTo,
        Self::Owns,
        Self::ActiveDescendant,
    ];

    /// Camel-style key
    pub fn key(&self) -> &'static str {
        match self {
            Self::Controls => "controls",
            Self::DescribedBy => "describedBy",
            Self::LabelledBy => "labelledBy",
            Self::FlowTo => "flowTo",
            Self::Owns => "owns",
            Self::ActiveDescendant => "activeDescendant",
        }
    }

    /// Attribute carrying the target's dom id
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Controls => "aria-controls",
            Self::DescribedBy => "aria-describedby",
            Self::LabelledBy => "aria-labelledby",
            Self::FlowTo => "aria-flowto",
            Self::Owns => "aria-owns",
            Self::ActiveDescendant => "aria-activedescendant",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-object accessibility record
#[derive(Debug, Clone)]
pub struct AccessibilityNode {
    object: ObjectId,
    role: Role,
    dom_id: String,
    attributes: Attributes,
    relations: BTreeMap<Relation, NodeId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visible: Option<bool>,
    enabled: Option<bool>,
    dirty: bool,
}

impl AccessibilityNode {
    /// Scene-graph object this node describes
    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Stable element id, fixed at bind time
    pub fn dom_id(&self) -> &str {
        &self.dom_id
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in presentation order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn relations(&self) -> impl Iterator<Item = (Relation, NodeId)> + '_ {
        self.relations.iter().map(|(r, n)| (*r, *n))
    }

    /// Explicit visibility override
    pub fn visible(&self) -> Option<bool> {
        self.visible
    }

    /// Explicit enablement override
    pub fn enabled(&self) -> Option<bool> {
        self.enabled
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Accessibility tree
#[derive(Debug)]
pub struct AccessibilityTree {
    registry: &'static RoleRegistry,
    nodes: NodeArena<AccessibilityNode>,
    bindings: HashMap<ObjectId, NodeId>,
    id_prefix: String,
    root: Option<NodeId>,
    focused: Option<NodeId>,
    pending_focus: Option<NodeId>,
}

impl AccessibilityTree {
    /// Create an empty tree over the standard role registry
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self::with_registry(RoleRegistry::standard(), id_prefix)
    }

    pub fn with_registry(registry: &'static RoleRegistry, id_prefix: impl Into<String>) -> Self {
        Self {
            registry,
            nodes: NodeArena::new(),
            bindings: HashMap::new(),
            id_prefix: id_prefix.into(),
            root: None,
            focused: None,
            pending_focus: None,
        }
    }

    pub fn registry(&self) -> &'static RoleRegistry {
        self.registry
    }

    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    // === Binding ===

    /// Attach a new node with `role` to a scene-graph object
    ///
    /// The role's default attributes are applied and the node starts dirty.
    pub fn bind(&mut self, object: ObjectId, role: Role) -> Result<NodeId> {
        if self.bindings.contains_key(&object) {
            return Err(A11yError::AlreadyBound(object));
        }
        let mut attributes = Attributes::new();
        if let Some(init) = self.registry.capability(role).init {
            init(&mut attributes);
        }
        let id = self.nodes.insert(AccessibilityNode {
            object,
            role,
            dom_id: format!("{}{}", self.id_prefix, object.0),
            attributes,
            relations: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            visible: None,
            enabled: None,
            dirty: true,
        });
        self.bindings.insert(object, id);
        tracing::trace!("Bound object {} as {}", object, role);
        Ok(id)
    }

    /// Bind with a role given by name (`"checkbox"`, `"TABLEBODY"`)
    pub fn bind_named(&mut self, object: ObjectId, role: &str) -> Result<NodeId> {
        let role = Role::from_name(role)?;
        self.bind(object, role)
    }

    /// Detach a node, orphan its children and free it
    pub fn release(&mut self, id: NodeId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(A11yError::StaleNode)?;
        let (parent, children, object) = (node.parent, node.children.clone(), node.object);

        if let Some(parent) = parent {
            self.detach(parent, id);
        }
        for child in children {
            if let Some(c) = self.nodes.get_mut(child) {
                c.parent = None;
                c.dirty = true;
            }
        }
        self.nodes.remove(id);
        self.bindings.remove(&object);

        // drop relations targeting the released node
        let owners: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.relations.values().any(|t| *t == id))
            .map(|(owner, _)| owner)
            .collect();
        for owner in owners {
            if let Some(n) = self.nodes.get_mut(owner) {
                n.relations.retain(|_, t| *t != id);
            }
            self.mark_for_update(owner);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.pending_focus == Some(id) {
            self.pending_focus = None;
        }
        Ok(())
    }

    // === Lookup ===

    pub fn node(&self, id: NodeId) -> Option<&AccessibilityNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.node(id).map(|n| n.role)
    }

    pub fn object(&self, id: NodeId) -> Option<ObjectId> {
        self.node(id).map(|n| n.object)
    }

    pub fn dom_id(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.dom_id.as_str())
    }

    /// Node bound to a scene-graph object
    pub fn node_for(&self, object: ObjectId) -> Option<NodeId> {
        self.bindings.get(&object).copied()
    }

    /// Resolve a projected element id back to its node
    pub fn node_by_dom_id(&self, dom_id: &str) -> Option<NodeId> {
        let raw = dom_id.strip_prefix(self.id_prefix.as_str())?;
        let object = ObjectId(raw.parse().ok()?);
        self.node_for(object)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Root and focus ===

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Designate the node reconciliation starts from
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            return Err(A11yError::StaleNode);
        }
        self.root = Some(id);
        self.mark_for_update(id);
        Ok(())
    }

    /// Node that last received DOM focus through this tree
    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|id| self.contains(*id))
    }

    /// Record which node's element holds DOM focus
    pub fn set_focused(&mut self, id: Option<NodeId>) {
        self.focused = id;
    }

    pub(crate) fn set_pending_focus(&mut self, id: NodeId) {
        self.pending_focus = Some(id);
    }

    pub(crate) fn take_pending_focus(&mut self) -> Option<NodeId> {
        self.pending_focus.take().filter(|id| self.nodes.contains(*id))
    }

    pub fn pending_focus(&self) -> Option<NodeId> {
        self.pending_focus
    }

    // === Structure ===

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children in presentation order (empty for a stale id)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Breadth-first listing of `id` and everything below it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            out.push(next);
            queue.extend(self.children(next).iter().copied());
        }
        out
    }

    /// Append `child` under `parent`
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.add_child_at(parent, child, index)
    }

    /// Insert `child` under `parent` at `index` (clamped)
    ///
    /// Every check runs before any mutation, so a rejected call leaves the
    /// tree untouched. A child that already has a parent is detached from
    /// it first.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        let parent_role = self.role(parent).ok_or(A11yError::StaleNode)?;
        let Some(child_role) = self.role(child) else {
            return Err(A11yError::InvalidChildRole {
                parent: parent_role,
                child: None,
                permitted: self.registry.permitted_children(parent_role).listed(),
            });
        };

        if child == parent || self.ancestors(parent).contains(&child) {
            return Err(A11yError::ChildConstraint {
                parent: parent_role,
                child: child_role,
                reason: "a node cannot contain itself or one of its ancestors",
            });
        }

        if !self.registry.permits(parent_role, child_role) {
            return Err(A11yError::InvalidChildRole {
                parent: parent_role,
                child: Some(child_role),
                permitted: self.registry.permitted_children(parent_role).listed(),
            });
        }

        if let Some(validate) = self.registry.capability(parent_role).validate_child {
            validate(self, parent, child)?;
        }

        if let Some(old_parent) = self.parent(child) {
            self.detach(old_parent, child);
        }

        if let Some(p) = self.nodes.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        self.mark_for_update(child);
        tracing::trace!("Added {} under {}", child_role, parent_role);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self.children(parent).iter().position(|c| *c == child) {
            Some(index) => self.remove_child_at(parent, index).is_some(),
            None => false,
        }
    }

    /// Detach the child at `index`; out of range is a no-op
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let p = self.nodes.get_mut(parent)?;
        if index >= p.children.len() {
            return None;
        }
        let child = p.children.remove(index);
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
        self.mark_for_update(parent);
        Some(child)
    }

    /// Detach every child, returning them in their former order
    pub fn remove_all_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let Some(p) = self.nodes.get_mut(parent) else {
            return Vec::new();
        };
        let children = std::mem::take(&mut p.children);
        for child in &children {
            if let Some(c) = self.nodes.get_mut(*child) {
                c.parent = None;
            }
        }
        if !children.is_empty() {
            self.mark_for_update(parent);
        }
        children
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
        self.mark_for_update(parent);
    }

    // === Dirty tracking ===

    /// Mark a node dirty along with every ancestor up to the root
    pub fn mark_for_update(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get_mut(c)) {
            node.dirty = true;
            current = node.parent;
        }
    }

    pub fn is_marked_for_update(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.dirty)
    }

    /// Clear the flag on this node only
    pub fn mark_as_updated(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.dirty = false;
        }
    }

    /// Mark a whole subtree dirty
    pub fn mark_subtree_for_update(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            self.mark_local(node);
        }
        self.mark_for_update(id);
    }

    /// Set the flag without touching ancestors
    pub(crate) fn mark_local(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.dirty = true;
        }
    }

    // === Attributes ===

    pub fn attributes(&self, id: NodeId) -> Option<&Attributes> {
        self.node(id).map(|n| &n.attributes)
    }

    /// Mutable attribute bag; the node is marked for update
    pub fn attributes_mut(&mut self, id: NodeId) -> Result<&mut Attributes> {
        if !self.contains(id) {
            return Err(A11yError::StaleNode);
        }
        self.mark_for_update(id);
        self.nodes
            .get_mut(id)
            .map(|n| &mut n.attributes)
            .ok_or(A11yError::StaleNode)
    }

    pub fn set_attribute(&mut self, id: NodeId, attr: Attr, value: impl Into<AttrValue>) -> Result<()> {
        self.attributes_mut(id)?.set(attr, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, attr: Attr) -> Result<Option<AttrValue>> {
        Ok(self.attributes_mut(id)?.remove(attr))
    }

    /// Live relation target
    pub fn relation(&self, id: NodeId, relation: Relation) -> Option<NodeId> {
        self.node(id)
            .and_then(|n| n.relations.get(&relation).copied())
            .filter(|target| self.contains(*target))
    }

    /// Set or clear a relationship attribute
    pub fn set_relation(&mut self, id: NodeId, relation: Relation, target: Option<NodeId>) -> Result<()> {
        if !self.contains(id) {
            return Err(A11yError::StaleNode);
        }
        if let Some(target) = target {
            if !self.contains(target) {
                return Err(A11yError::MissingAccessibility(format!("{} target", relation)));
            }
            if relation == Relation::LabelledBy && target == id {
                return Err(A11yError::SelfReference { relation });
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            match target {
                Some(target) => node.relations.insert(relation, target),
                None => node.relations.remove(&relation),
            };
        }
        self.mark_for_update(id);
        Ok(())
    }

    /// Override inferred visibility; `None` restores inference
    pub fn set_visible(&mut self, id: NodeId, visible: Option<bool>) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(A11yError::StaleNode)?;
        node.visible = visible;
        self.mark_for_update(id);
        Ok(())
    }

    /// Override inferred enablement; `None` restores inference
    pub fn set_enabled(&mut self, id: NodeId, enabled: Option<bool>) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(A11yError::StaleNode)?;
        node.enabled = enabled;
        self.mark_for_update(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> AccessibilityTree {
        AccessibilityTree::new("t-")
    }

    #[test]
    fn test_bind_applies_defaults() {
        let mut tree = tree();
        let cb = tree.bind(ObjectId(1), Role::Checkbox).unwrap();
        assert_eq!(tree.attributes(cb).unwrap().checked(), Some(false));
        assert_eq!(tree.dom_id(cb), Some("t-1"));
        assert!(tree.is_marked_for_update(cb));
        assert_eq!(tree.node_by_dom_id("t-1"), Some(cb));
    }

    #[test]
    fn test_bind_twice() {
        let mut tree = tree();
        tree.bind(ObjectId(1), Role::Button).unwrap();
        assert_eq!(tree.bind(ObjectId(1), Role::Link), Err(A11yError::AlreadyBound(ObjectId(1))));
        assert!(matches!(tree.bind_named(ObjectId(2), "widget"), Err(A11yError::UnknownRole(_))));
    }

    #[test]
    fn test_rejects_cycle() {
        let mut tree = tree();
        let a = tree.bind(ObjectId(1), Role::Group).unwrap();
        let b = tree.bind(ObjectId(2), Role::Group).unwrap();
        tree.add_child(a, b).unwrap();
        assert!(matches!(tree.add_child(b, a), Err(A11yError::ChildConstraint { .. })));
        assert!(matches!(tree.add_child(a, a), Err(A11yError::ChildConstraint { .. })));
    }

    #[test]
    fn test_add_child_at_clamps_index() {
        let mut tree = tree();
        let list = tree.bind(ObjectId(1), Role::List).unwrap();
        let a = tree.bind(ObjectId(2), Role::ListItem).unwrap();
        let b = tree.bind(ObjectId(3), Role::ListItem).unwrap();
        tree.add_child_at(list, a, 10).unwrap();
        tree.add_child_at(list, b, 0).unwrap();
        assert_eq!(tree.children(list), &[b, a]);
    }

    #[test]
    fn test_move_within_same_parent() {
        let mut tree = tree();
        let list = tree.bind(ObjectId(1), Role::List).unwrap();
        let items: Vec<_> = (2..5)
            .map(|i| {
                let item = tree.bind(ObjectId(i), Role::ListItem).unwrap();
                tree.add_child(list, item).unwrap();
                item
            })
            .collect();
        tree.add_child_at(list, items[0], 2).unwrap();
        assert_eq!(tree.children(list), &[items[1], items[2], items[0]]);
    }

    #[test]
    fn test_remove_child_at_out_of_range() {
        let mut tree = tree();
        let list = tree.bind(ObjectId(1), Role::List).unwrap();
        assert_eq!(tree.remove_child_at(list, 3), None);
    }

    #[test]
    fn test_remove_all_children() {
        let mut tree = tree();
        let group = tree.bind(ObjectId(1), Role::Group).unwrap();
        let a = tree.bind(ObjectId(2), Role::Button).unwrap();
        let b = tree.bind(ObjectId(3), Role::Button).unwrap();
        tree.add_child(group, a).unwrap();
        tree.add_child(group, b).unwrap();

        assert_eq!(tree.remove_all_children(group), vec![a, b]);
        assert!(tree.children(group).is_empty());
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn test_release_orphans_children() {
        let mut tree = tree();
        let outer = tree.bind(ObjectId(1), Role::Region).unwrap();
        let group = tree.bind(ObjectId(2), Role::Group).unwrap();
        let button = tree.bind(ObjectId(3), Role::Button).unwrap();
        tree.add_child(outer, group).unwrap();
        tree.add_child(group, button).unwrap();

        tree.release(group).unwrap();
        assert!(!tree.contains(group));
        assert!(tree.children(outer).is_empty());
        assert_eq!(tree.parent(button), None);
        assert_eq!(tree.node_for(ObjectId(2)), None);
        assert_eq!(tree.release(group), Err(A11yError::StaleNode));
    }

    #[test]
    fn test_relations() {
        let mut tree = tree();
        let label = tree.bind(ObjectId(1), Role::Label).unwrap();
        let input = tree.bind(ObjectId(2), Role::TextBox).unwrap();

        tree.set_relation(input, Relation::LabelledBy, Some(label)).unwrap();
        assert_eq!(tree.relation(input, Relation::LabelledBy), Some(label));
        assert_eq!(
            tree.set_relation(input, Relation::LabelledBy, Some(input)),
            Err(A11yError::SelfReference { relation: Relation::LabelledBy })
        );

        tree.release(label).unwrap();
        assert_eq!(tree.relation(input, Relation::LabelledBy), None);
        assert!(matches!(
            tree.set_relation(input, Relation::Controls, Some(label)),
            Err(A11yError::MissingAccessibility(_))
        ));
    }

    #[test]
    fn test_mark_as_updated_is_local() {
        let mut tree = tree();
        let group = tree.bind(ObjectId(1), Role::Group).unwrap();
        let button = tree.bind(ObjectId(2), Role::Button).unwrap();
        tree.add_child(group, button).unwrap();

        tree.mark_as_updated(group);
        assert!(!tree.is_marked_for_update(group));
        assert!(tree.is_marked_for_update(button));
    }
}
