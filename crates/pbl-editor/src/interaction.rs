//! Pointer and link gesture state machine.
//!
//! Pure interaction state: the machine never touches the graph. It reads
//! input events already resolved to a `Hit` and emits `CanvasMutation`s
//! that the controller applies. Dragging and linking are mutually
//! exclusive by construction.
//!
//! ```text
//! Idle ──press header──▶ Dragging ──move──▶ Dragging ──release──▶ Idle
//! Idle ──click port───▶ Linking ──click other port──▶ Idle (+ Link)
//!                        Linking ──same port / canvas / Escape──▶ Idle
//! ```

use crate::input::InputEvent;
use pbl_core::{ConnectionId, NodeId, PortRef};
use pbl_render::Hit;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        node: NodeId,
        start_pointer: (f32, f32),
        start_node: (f32, f32),
    },
    Linking {
        from: PortRef,
    },
}

/// A change the gesture asks the controller to make.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasMutation {
    /// Absolute position for a dragged card.
    MoveNode { id: NodeId, x: f32, y: f32 },
    /// Link two ports, in click order. Validation happens in the graph.
    Link { first: PortRef, second: PortRef },
    RemoveConnection(ConnectionId),
}

#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    state: Gesture,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Gesture {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == Gesture::Idle
    }

    /// The port a pending link started from.
    pub fn linking_from(&self) -> Option<PortRef> {
        match self.state {
            Gesture::Linking { from } => Some(from),
            _ => None,
        }
    }

    /// Feed one event. `origin_of` reports a card's current position.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        hit: Hit,
        origin_of: impl Fn(NodeId) -> Option<(f32, f32)>,
    ) -> Vec<CanvasMutation> {
        match event {
            InputEvent::PointerDown { x, y } => {
                if let Hit::Header(id) = hit
                    && let Some(origin) = origin_of(id)
                {
                    self.press_header(id, (*x, *y), origin);
                }
                vec![]
            }
            InputEvent::PointerMove { x, y } => self.pointer_move(*x, *y).into_iter().collect(),
            InputEvent::PointerUp { .. } => {
                self.release();
                vec![]
            }
            InputEvent::Click { .. } => match hit {
                Hit::Port(port) => self.click_port(port).into_iter().collect(),
                Hit::Connector(id) => self.click_connector(id).into_iter().collect(),
                Hit::Header(_) | Hit::Body(_) | Hit::Canvas => {
                    self.cancel();
                    vec![]
                }
            },
            InputEvent::Key { .. } => {
                if event.is_escape() {
                    self.cancel();
                }
                vec![]
            }
        }
    }

    /// Start dragging `node`. Only from `Idle`; returns whether it started.
    pub fn press_header(&mut self, node: NodeId, pointer: (f32, f32), node_pos: (f32, f32)) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.state = Gesture::Dragging {
            node,
            start_pointer: pointer,
            start_node: node_pos,
        };
        true
    }

    /// New absolute position for the dragged card: origin plus pointer delta.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<CanvasMutation> {
        let Gesture::Dragging {
            node,
            start_pointer,
            start_node,
        } = self.state
        else {
            return None;
        };
        let nx = start_node.0 + (x - start_pointer.0);
        let ny = start_node.1 + (y - start_pointer.1);
        log::trace!("drag {node} to ({nx}, {ny})");
        Some(CanvasMutation::MoveNode { id: node, x: nx, y: ny })
    }

    pub fn release(&mut self) {
        if matches!(self.state, Gesture::Dragging { .. }) {
            self.state = Gesture::Idle;
        }
    }

    /// A port was clicked. Starts a link from `Idle`; from `Linking` it
    /// either cancels (same port) or asks for the link.
    pub fn click_port(&mut self, port: PortRef) -> Option<CanvasMutation> {
        match self.state {
            Gesture::Idle => {
                self.state = Gesture::Linking { from: port };
                None
            }
            Gesture::Linking { from } => {
                self.state = Gesture::Idle;
                (from != port).then_some(CanvasMutation::Link {
                    first: from,
                    second: port,
                })
            }
            Gesture::Dragging { .. } => None,
        }
    }

    /// A connector was clicked: remove it. A pending link is dropped too.
    pub fn click_connector(&mut self, id: ConnectionId) -> Option<CanvasMutation> {
        match self.state {
            Gesture::Dragging { .. } => None,
            Gesture::Idle | Gesture::Linking { .. } => {
                self.state = Gesture::Idle;
                Some(CanvasMutation::RemoveConnection(id))
            }
        }
    }

    /// Abandon a pending link. Drags end only on release.
    pub fn cancel(&mut self) {
        if matches!(self.state, Gesture::Linking { .. }) {
            self.state = Gesture::Idle;
        }
    }

    /// Drop any gesture that refers to a card that no longer exists.
    pub fn forget_node(&mut self, id: NodeId) {
        let stale = match self.state {
            Gesture::Dragging { node, .. } => node == id,
            Gesture::Linking { from } => from.node == id,
            Gesture::Idle => false,
        };
        if stale {
            self.state = Gesture::Idle;
        }
    }
}
