//! In-memory DOM (arena-based allocation)
//!
//! Elements live in a flat arena and are addressed by [`ElementId`].
//! Destroyed slots go on a free list and come back with a bumped
//! generation, so a stale id resolves to nothing.

use std::collections::HashMap;

use crate::{DomBackend, DomError, ElementId, Listener};

/// Tags that take focus without a `tabindex`
const NATIVELY_FOCUSABLE: &[&str] = &["a", "button", "input", "select", "textarea"];

/// Element record
#[derive(Debug)]
struct Element {
    tag: String,
    /// Attributes in insertion order
    attrs: Vec<(String, String)>,
    listeners: Vec<Listener>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

/// Mutation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub created: u64,
    pub destroyed: u64,
    pub attrs_set: u64,
    pub attrs_removed: u64,
    pub inserted: u64,
    pub removed: u64,
}

impl MutationStats {
    /// Total number of mutations of any kind
    pub fn total(&self) -> u64 {
        self.created + self.destroyed + self.attrs_set + self.attrs_removed + self.inserted + self.removed
    }
}

/// Arena-backed DOM
#[derive(Debug)]
pub struct MemoryDom {
    elements: Vec<Option<Element>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    by_id: HashMap<String, ElementId>,
    root: ElementId,
    focused: Option<ElementId>,
    stats: MutationStats,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a DOM holding only a `body` root
    pub fn new() -> Self {
        let body = Element {
            tag: "body".to_string(),
            attrs: Vec::new(),
            listeners: Vec::new(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            elements: vec![Some(body)],
            generations: vec![0],
            free_list: Vec::new(),
            by_id: HashMap::new(),
            root: ElementId::new(0, 0),
            focused: None,
            stats: MutationStats::default(),
        }
    }

    /// The document body
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    /// Number of live elements, root included
    pub fn len(&self) -> usize {
        self.elements.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, el: ElementId) -> bool {
        self.get(el).is_some()
    }

    /// Listeners the element was created with
    pub fn listeners(&self, el: ElementId) -> &[Listener] {
        self.get(el).map(|e| e.listeners.as_slice()).unwrap_or(&[])
    }

    /// Check whether the element is reachable from the root
    pub fn is_connected(&self, el: ElementId) -> bool {
        let mut current = Some(el);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.get(id).and_then(|e| e.parent);
        }
        false
    }

    /// Serialize an element subtree (attributes in insertion order)
    pub fn outer_html(&self, el: ElementId) -> String {
        let mut out = String::new();
        self.write_html(el, &mut out);
        out
    }

    fn write_html(&self, el: ElementId, out: &mut String) {
        let Some(element) = self.get(el) else { return };
        out.push('<');
        out.push_str(&element.tag);
        for (name, value) in &element.attrs {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
        }
        out.push('>');
        for &child in &element.children {
            self.write_html(child, out);
        }
        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }

    fn is_current(&self, el: ElementId) -> bool {
        self.generations.get(el.index as usize) == Some(&el.generation)
    }

    fn get(&self, el: ElementId) -> Option<&Element> {
        if !self.is_current(el) {
            return None;
        }
        self.elements.get(el.index as usize).and_then(|e| e.as_ref())
    }

    fn get_mut(&mut self, el: ElementId) -> Option<&mut Element> {
        if !self.is_current(el) {
            return None;
        }
        self.elements.get_mut(el.index as usize).and_then(|e| e.as_mut())
    }

    /// Number of slots ever allocated, live or free
    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    fn is_ancestor_or_self(&self, candidate: ElementId, of: ElementId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.get(id).and_then(|e| e.parent);
        }
        false
    }

    fn detach(&mut self, child: ElementId) {
        let Some(parent) = self.get(child).and_then(|e| e.parent) else { return };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }

    fn unregister_id(&mut self, el: ElementId, value: &str) {
        if self.by_id.get(value) == Some(&el) {
            self.by_id.remove(value);
        }
    }
}

impl DomBackend for MemoryDom {
    fn create_element(
        &mut self,
        tag: &str,
        attrs: &[(String, String)],
        listeners: &[Listener],
    ) -> ElementId {
        let id = match self.free_list.pop() {
            Some(index) => ElementId::new(index, self.generations[index as usize]),
            None => {
                self.elements.push(None);
                self.generations.push(0);
                ElementId::new(self.elements.len() as u32 - 1, 0)
            }
        };
        let mut element = Element {
            tag: tag.to_string(),
            attrs: Vec::with_capacity(attrs.len()),
            listeners: listeners.to_vec(),
            parent: None,
            children: Vec::new(),
        };
        for (name, value) in attrs {
            match element.attrs.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value.clone(),
                None => element.attrs.push((name.clone(), value.clone())),
            }
        }
        if let Some(dom_id) = element.get_attr("id") {
            self.by_id.insert(dom_id.to_string(), id);
        }
        self.elements[id.index as usize] = Some(element);
        self.stats.created += 1;
        tracing::trace!("Created <{}> as {:?}", tag, id);
        id
    }

    fn destroy(&mut self, el: ElementId) {
        if el == self.root || !self.contains(el) {
            return;
        }
        self.detach(el);

        let mut stack = vec![el];
        while let Some(id) = stack.pop() {
            if !self.is_current(id) {
                continue;
            }
            let Some(element) = self.elements.get_mut(id.index as usize).and_then(|e| e.take()) else {
                continue;
            };
            self.generations[id.index as usize] += 1;
            self.free_list.push(id.index);
            if let Some(dom_id) = element.get_attr("id") {
                self.unregister_id(id, dom_id);
            }
            if self.focused == Some(id) {
                self.focused = None;
            }
            stack.extend(element.children.iter().copied());
            self.stats.destroyed += 1;
        }
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.by_id.get(id).copied()
    }

    fn tag(&self, el: ElementId) -> Option<&str> {
        self.get(el).map(|e| e.tag.as_str())
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<&str> {
        self.get(el).and_then(|e| e.get_attr(name))
    }

    fn attribute_names(&self, el: ElementId) -> Vec<String> {
        self.get(el)
            .map(|e| e.attrs.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) -> bool {
        let Some(element) = self.get_mut(el) else { return false };
        let previous = match element.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) if slot.1 == value => return false,
            Some(slot) => Some(std::mem::replace(&mut slot.1, value.to_string())),
            None => {
                element.attrs.push((name.to_string(), value.to_string()));
                None
            }
        };
        if name == "id" {
            if let Some(old) = previous {
                self.unregister_id(el, &old);
            }
            self.by_id.insert(value.to_string(), el);
        }
        self.stats.attrs_set += 1;
        true
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) -> bool {
        let Some(element) = self.get_mut(el) else { return false };
        let Some(pos) = element.attrs.iter().position(|(n, _)| n == name) else {
            return false;
        };
        let (_, old) = element.attrs.remove(pos);
        if name == "id" {
            self.unregister_id(el, &old);
        }
        self.stats.attrs_removed += 1;
        true
    }

    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.get(el).and_then(|e| e.parent)
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.get(el).map(|e| e.children.clone()).unwrap_or_default()
    }

    fn insert_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
        index: usize,
    ) -> Result<(), DomError> {
        if !self.contains(parent) {
            return Err(DomError::UnknownElement(parent));
        }
        if !self.contains(child) {
            return Err(DomError::UnknownElement(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }

        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        self.stats.inserted += 1;
        Ok(())
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child);
        self.stats.removed += 1;
        true
    }

    fn focus(&mut self, el: ElementId) -> bool {
        let Some(element) = self.get(el) else { return false };
        let focusable = element.get_attr("tabindex").is_some()
            || NATIVELY_FOCUSABLE.contains(&element.tag.as_str());
        let blocked = element.get_attr("hidden").is_some() || element.get_attr("disabled").is_some();
        if !focusable || blocked || !self.is_connected(el) {
            return false;
        }
        self.focused = Some(el);
        true
    }

    fn focused(&self) -> Option<ElementId> {
        self.focused
    }
}
