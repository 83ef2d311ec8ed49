//! Parallax DOM
//!
//! The element tree that accessibility nodes are projected into.
//!
//! The accessibility core never touches a concrete DOM. It talks to a
//! [`DomBackend`]: create an element with a tag, attributes and listeners,
//! patch attributes, move children around and focus. [`MemoryDom`] is the
//! arena-backed implementation used headlessly and in tests.

mod backend;
mod events;
mod geometry;
mod memory;

pub use backend::{DomBackend, Listener};
pub use events::{DomEvent, DomEventKind, Key, KeyboardInput};
pub use geometry::{Point, Rect};
pub use memory::{MemoryDom, MutationStats};

/// Element identifier (generational index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ElementId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Raw arena index
    pub fn index(self) -> u32 {
        self.index
    }
}

/// DOM error
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Unknown element {0:?}")]
    UnknownElement(ElementId),

    #[error("Cannot insert {child:?} into its own descendant {parent:?}")]
    HierarchyRequest { parent: ElementId, child: ElementId },
}
