//! DOM Events
//!
//! Input events arriving on projected elements.

use crate::{ElementId, Listener};

/// Keyboard key (DOM `KeyboardEvent.key` values)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Space,
    Escape,
    Tab,
    Character(char),
    Other(String),
}

impl Key {
    /// Parse a DOM key value
    pub fn parse(value: &str) -> Self {
        match value {
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Enter" => Self::Enter,
            " " | "Spacebar" => Self::Space,
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Character(c),
                    _ => Self::Other(other.to_string()),
                }
            }
        }
    }

    pub fn is_arrow(&self) -> bool {
        matches!(self, Self::ArrowUp | Self::ArrowDown | Self::ArrowLeft | Self::ArrowRight)
    }
}

/// Keyboard input with modifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardInput {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyboardInput {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false, ctrl: false, alt: false, meta: false }
    }

    pub fn shift(mut self) -> Self { self.shift = true; self }
    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }

    /// True when any modifier other than shift is held
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// DOM event payload
#[derive(Debug, Clone, PartialEq)]
pub enum DomEventKind {
    KeyDown(KeyboardInput),
    Click,
    Focus,
    Scroll { top: f64, left: f64 },
    Input { value: String },
}

impl DomEventKind {
    /// Listener that receives this kind of event
    pub fn listener(&self) -> Listener {
        match self {
            Self::KeyDown(_) => Listener::KeyDown,
            Self::Click => Listener::Click,
            Self::Focus => Listener::Focus,
            Self::Scroll { .. } => Listener::Scroll,
            Self::Input { .. } => Listener::Input,
        }
    }
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: DomEventKind,
    pub target: ElementId,
    pub cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn new(target: ElementId, kind: DomEventKind) -> Self {
        let cancelable = matches!(kind, DomEventKind::KeyDown(_) | DomEventKind::Click);
        Self {
            kind,
            target,
            cancelable,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Create a keydown event
    pub fn key_down(target: ElementId, key: Key) -> Self {
        Self::new(target, DomEventKind::KeyDown(KeyboardInput::new(key)))
    }

    /// Create a click event
    pub fn click(target: ElementId) -> Self {
        Self::new(target, DomEventKind::Click)
    }

    /// Create a scroll event
    pub fn scroll(target: ElementId, top: f64) -> Self {
        Self::new(target, DomEventKind::Scroll { top, left: 0.0 })
    }

    /// Create an input event
    pub fn input(target: ElementId, value: impl Into<String>) -> Self {
        Self::new(target, DomEventKind::Input { value: value.into() })
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}
