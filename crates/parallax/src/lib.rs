//! Parallax
//!
//! Keeps an accessibility tree beside a canvas scene graph and projects it
//! into a live DOM subtree, so assistive technology can read and operate a
//! UI that is only ever painted.
//!
//! # Example
//! ```rust,ignore
//! use parallax::{Config, TreeRegistry};
//!
//! parallax::init_logging(&Config::default().log_filter);
//! let mut registry = TreeRegistry::new(Config::default());
//! let mount = registry.create(root_object, Role::Application, container)?;
//! // once per frame
//! registry.tick(&scene, &mut dom);
//! ```

mod config;
mod registry;

pub use config::Config;
pub use registry::{MountId, TickReport, TreeRegistry};

pub use parallax_a11y::{
    A11yError, AccessibilityTree, Attr, AttrValue, KeyOutcome, NodeId, ObjectId, Role, SceneEvent,
    SceneGraph, Surface, Translator, UpdateStats,
};
pub use parallax_dom::{DomBackend, DomError, DomEvent, DomEventKind, ElementId, Key, Rect};

// Re-export sub-crates for advanced usage
pub use parallax_a11y as a11y;
pub use parallax_dom as dom;

use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a `fmt` subscriber filtered by `RUST_LOG`, or `filter` when unset
///
/// Returns false when a global subscriber was already installed.
pub fn init_logging(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Accessibility error: {0}")]
    A11y(#[from] A11yError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Unknown mount {0}")]
    UnknownMount(MountId),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging("parallax=debug");
        assert!(!init_logging("parallax=debug"));
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::from(A11yError::StaleNode);
        assert!(err.to_string().starts_with("Accessibility error"));
        let json = serde_json::from_str::<Config>("{").unwrap_err();
        assert!(matches!(EngineError::from(json), EngineError::Config(_)));
    }
}
