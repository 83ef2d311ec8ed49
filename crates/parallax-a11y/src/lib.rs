//! Parallax Accessibility
//!
//! A parallel accessibility tree mirroring a canvas scene graph, projected
//! into a live DOM subtree so assistive technology can perceive and
//! operate the canvas UI.
//!
//! - [`role`]: role registry (tag, permitted children, capability)
//! - [`tree`]: node arena and the role-checked mutation API
//! - [`capability`]: per-role validators, defaults and key handlers
//! - [`navigation`]: grid/treegrid arrow-key state machine
//! - [`translator`]: incremental reconciliation into the DOM

pub mod arena;
pub mod attributes;
pub mod capability;
pub mod focus;
pub mod layout;
pub mod navigation;
pub mod role;
pub mod scene;
pub mod translator;
pub mod tree;

pub use arena::NodeId;
pub use attributes::{Attr, AttrValue, Attributes};
pub use capability::{Capability, KeyContext, KeyOutcome};
pub use focus::{FocusOutcome, TabIndex, request_focus};
pub use layout::Surface;
pub use navigation::GridNavigator;
pub use role::{Children, Role, RoleRegistry};
pub use scene::{Dispatch, EventType, MemoryScene, ObjectId, SceneEvent, SceneGraph, Transform};
pub use translator::{Translator, UpdateStats};
pub use tree::{AccessibilityNode, AccessibilityTree, Relation};

use std::fmt;

/// Accessibility error
///
/// Every variant is a caller defect; none is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum A11yError {
    #[error("{}", invalid_child_message(.parent, .child, .permitted))]
    InvalidChildRole {
        parent: Role,
        /// `None` when the candidate carries no accessibility information
        child: Option<Role>,
        permitted: Vec<Role>,
    },

    #[error("{child} cannot be added to {parent}: {reason}")]
    ChildConstraint {
        parent: Role,
        child: Role,
        reason: &'static str,
    },

    #[error("{relation} cannot reference the node itself")]
    SelfReference { relation: Relation },

    #[error("Missing accessibility information: {0}")]
    MissingAccessibility(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Scene object {0} is already bound")]
    AlreadyBound(ObjectId),

    #[error("Node no longer exists")]
    StaleNode,
}

fn invalid_child_message(parent: &Role, child: &Option<Role>, permitted: &[Role]) -> String {
    let Some(child) = child else {
        return format!("cannot add a node without accessibility information to {}", parent);
    };
    if permitted.is_empty() {
        return format!("role {} is not permitted under {} (no children allowed)", child, parent);
    }
    format!("role {} is not permitted under {} (permitted: {})", child, parent, RoleList(permitted))
}

struct RoleList<'a>(&'a [Role]);

impl fmt::Display for RoleList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, role) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(role.name())?;
        }
        Ok(())
    }
}

/// Result type for accessibility operations
pub type Result<T> = std::result::Result<T, A11yError>;
