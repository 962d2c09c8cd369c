//! Input abstraction layer.
//!
//! Normalizes host pointer and keyboard events into a unified
//! `InputEvent` enum consumed by the gesture machine. Coordinates are in
//! canvas space; the host subtracts scroll offsets before forwarding.

/// A normalized input event from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { x: f32, y: f32 },

    /// Pointer moved.
    PointerMove { x: f32, y: f32 },

    /// Pointer released.
    PointerUp { x: f32, y: f32 },

    /// Completed click. Ports, connectors and empty canvas react to
    /// clicks rather than presses.
    Click { x: f32, y: f32 },

    /// Key press, named the way `KeyboardEvent.key` names it.
    Key { key: String },
}

impl InputEvent {
    pub fn from_pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown { x, y }
    }

    pub fn from_pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn from_pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp { x, y }
    }

    pub fn from_click(x: f32, y: f32) -> Self {
        Self::Click { x, y }
    }

    pub fn from_key(key: impl Into<String>) -> Self {
        Self::Key { key: key.into() }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::Click { x, y } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }

    /// Whether this is the cancel key.
    pub fn is_escape(&self) -> bool {
        matches!(self, Self::Key { key } if key == "Escape")
    }
}
