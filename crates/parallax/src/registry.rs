//! Tree Registry
//!
//! Owns every mounted accessibility tree. The host creates one mount per
//! canvas, calls [`TreeRegistry::tick`] once per frame and forwards DOM
//! events from projected elements to [`TreeRegistry::handle_dom_event`].

use std::fmt;

use parallax_a11y::capability::{self, KeyContext};
use parallax_a11y::{
    AccessibilityTree, KeyOutcome, NodeId, ObjectId, Role, SceneGraph, Surface, Translator,
    UpdateStats,
};
use parallax_dom::{DomBackend, DomError, DomEvent, DomEventKind, ElementId};

use crate::{Config, EngineError, Result};

/// Handle to a mounted tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountId(u32);

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Mount {
    id: MountId,
    tree: AccessibilityTree,
    translator: Translator,
}

/// Result of one frame tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub mounts: Vec<(MountId, UpdateStats)>,
}

impl TickReport {
    /// Nodes visited across all mounts
    pub fn visited(&self) -> usize {
        self.mounts.iter().map(|(_, s)| s.visited).sum()
    }

    /// DOM mutations across all mounts
    pub fn mutations(&self) -> usize {
        self.mounts.iter().map(|(_, s)| s.mutations()).sum()
    }

    pub fn is_idle(&self) -> bool {
        self.visited() == 0
    }

    pub fn stats(&self, id: MountId) -> Option<&UpdateStats> {
        self.mounts.iter().find(|(m, _)| *m == id).map(|(_, s)| s)
    }
}

/// Registry of mounted trees
pub struct TreeRegistry {
    config: Config,
    mounts: Vec<Mount>,
    next_id: u32,
}

impl TreeRegistry {
    pub fn new(config: Config) -> Self {
        Self { config, mounts: Vec::new(), next_id: 0 }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mount a new tree rooted at `root_object`, projected into `container`
    pub fn create(&mut self, root_object: ObjectId, root_role: Role, container: ElementId) -> Result<MountId> {
        let id = MountId(self.next_id);
        let mut tree = AccessibilityTree::new(format!("{}{}-", self.config.dom_id_prefix, id.0));
        let root = tree.bind(root_object, root_role)?;
        tree.set_root(root)?;

        let translator = Translator::new(container, self.config.surface)
            .with_placeholder(self.config.placeholder_size)
            .with_focus_outline(self.config.focus_outline);

        self.next_id += 1;
        self.mounts.push(Mount { id, tree, translator });
        tracing::info!("Created mount {} ({}) in container {:?}", id, root_role, container);
        Ok(id)
    }

    /// Create a `div` under `parent` to serve as a mount container
    pub fn create_container(&self, dom: &mut dyn DomBackend, parent: ElementId) -> Result<ElementId> {
        if dom.tag(parent).is_none() {
            return Err(DomError::UnknownElement(parent).into());
        }
        let index = dom.children(parent).len();
        let style = ("style".to_string(), "position:relative;overflow:hidden".to_string());
        let el = dom.create_element("div", &[style], &[]);
        dom.insert_child(parent, el, index)?;
        Ok(el)
    }

    /// Unmount a tree and remove its projection from the DOM
    pub fn destroy(&mut self, id: MountId, dom: &mut dyn DomBackend) -> Result<()> {
        let index = self.index_of(id)?;
        let mut mount = self.mounts.remove(index);
        mount.translator.teardown(dom);
        tracing::info!("Destroyed mount {} ({} nodes)", id, mount.tree.len());
        Ok(())
    }

    pub fn tree(&self, id: MountId) -> Result<&AccessibilityTree> {
        Ok(&self.mounts[self.index_of(id)?].tree)
    }

    pub fn tree_mut(&mut self, id: MountId) -> Result<&mut AccessibilityTree> {
        let index = self.index_of(id)?;
        Ok(&mut self.mounts[index].tree)
    }

    pub fn translator(&self, id: MountId) -> Result<&Translator> {
        Ok(&self.mounts[self.index_of(id)?].translator)
    }

    pub fn mount_ids(&self) -> impl Iterator<Item = MountId> + '_ {
        self.mounts.iter().map(|m| m.id)
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Change the rendering surface of every mount
    pub fn set_surface(&mut self, surface: Surface) {
        self.config.surface = surface;
        for mount in &mut self.mounts {
            mount.translator.set_surface(surface);
        }
    }

    /// Run one reconciliation pass on every mount
    pub fn tick(&mut self, scene: &dyn SceneGraph, dom: &mut dyn DomBackend) -> TickReport {
        let mut report = TickReport::default();
        for mount in &mut self.mounts {
            let stats = mount.translator.update(&mut mount.tree, scene, dom);
            report.mounts.push((mount.id, stats));
        }
        if !report.is_idle() {
            tracing::debug!("Tick: {} nodes visited, {} DOM mutations", report.visited(), report.mutations());
        }
        report
    }

    /// Mount and node projected by `el`
    pub fn locate(&self, dom: &dyn DomBackend, el: ElementId) -> Option<(MountId, NodeId)> {
        let dom_id = dom.attribute(el, "id")?;
        self.mounts
            .iter()
            .find_map(|m| m.tree.node_by_dom_id(dom_id).map(|node| (m.id, node)))
    }

    /// Route a DOM event from a projected element into its tree
    ///
    /// Keydown tries the target node, then its ancestors, until one
    /// handles the key. A handled event has its default prevented and
    /// its propagation stopped.
    pub fn handle_dom_event(
        &mut self,
        scene: &mut dyn SceneGraph,
        dom: &mut dyn DomBackend,
        event: &mut DomEvent,
    ) -> KeyOutcome {
        let Some((id, node)) = self.locate(&*dom, event.target) else {
            tracing::trace!("DOM event on unprojected element {:?}", event.target);
            return KeyOutcome::Ignored;
        };
        let Some(mount) = self.mounts.iter_mut().find(|m| m.id == id) else {
            return KeyOutcome::Ignored;
        };

        let mut ctx = KeyContext::new(&mut mount.tree, scene, dom);
        let outcome = match &event.kind {
            DomEventKind::KeyDown(input) => {
                let mut chain = vec![node];
                chain.extend(ctx.tree.ancestors(node));
                chain
                    .into_iter()
                    .map(|n| capability::handle_key(&mut ctx, n, input))
                    .find(|o| o.is_handled())
                    .unwrap_or(KeyOutcome::Ignored)
            }
            DomEventKind::Click => capability::activate(&mut ctx, node),
            DomEventKind::Input { value } => capability::apply_input(&mut ctx, node, value),
            DomEventKind::Scroll { top, .. } => capability::apply_scroll(&mut ctx, node, *top),
            DomEventKind::Focus => {
                ctx.tree.set_focused(Some(node));
                KeyOutcome::Ignored
            }
        };

        tracing::trace!("{:?} on {:?} in mount {}: {:?}", event.kind.listener(), node, id, outcome);
        if outcome.is_handled() {
            event.prevent_default();
            event.stop_propagation();
        }
        outcome
    }

    fn index_of(&self, id: MountId) -> Result<usize> {
        self.mounts
            .iter()
            .position(|m| m.id == id)
            .ok_or(EngineError::UnknownMount(id))
    }
}

impl fmt::Debug for TreeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeRegistry")
            .field("mounts", &self.mounts.iter().map(|m| m.id).collect::<Vec<_>>())
            .field("next_id", &self.next_id)
            .finish()
    }
}
