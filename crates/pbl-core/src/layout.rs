//! Declared card geometry.
//!
//! Every dimension the canvas needs is a constant here rather than a
//! measurement of rendered output, so port anchors, connector paths and
//! hit testing are deterministic and can be computed headless.

use crate::node::{Node, NodeKind};
use serde::{Deserialize, Serialize};

/// Geometry and placement settings for the canvas.
///
/// Deserializes with per-field defaults, so a host can override any
/// subset: `{"wideCardWidth": 420}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasMetrics {
    pub narrow_card_width: f32,
    pub wide_card_width: f32,
    pub header_height: f32,
    pub port_list_top_padding: f32,
    pub port_spacing: f32,
    pub port_radius: f32,
    pub min_card_height: f32,
    /// Where catalog cards appear before jitter.
    pub spawn_origin: (f32, f32),
    /// Random offset band applied to new catalog cards, in both axes.
    pub spawn_jitter: f32,
    /// Where assistant-proposed cards appear.
    pub proposal_origin: (f32, f32),
    /// Max distance from a connector curve that still counts as a click on it.
    pub connector_hit_tolerance: f32,
}

impl Default for CanvasMetrics {
    fn default() -> Self {
        Self {
            narrow_card_width: 280.0,
            wide_card_width: 380.0,
            header_height: 45.0,
            port_list_top_padding: 16.0,
            port_spacing: 40.0,
            port_radius: 12.0,
            min_card_height: 160.0,
            spawn_origin: (300.0, 200.0),
            spawn_jitter: 50.0,
            proposal_origin: (400.0, 300.0),
            connector_hit_tolerance: 6.0,
        }
    }
}

/// Axis-aligned card rectangle in canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CardBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CardBounds {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

impl CanvasMetrics {
    pub fn card_width(&self, kind: NodeKind) -> f32 {
        if kind.is_wide() {
            self.wide_card_width
        } else {
            self.narrow_card_width
        }
    }

    /// Vertical offset of port `index` from the card's top edge.
    pub fn port_offset_y(&self, index: usize) -> f32 {
        self.header_height + self.port_list_top_padding + index as f32 * self.port_spacing + self.port_radius
    }

    /// Anchor of output port `index`, on the card's right edge.
    pub fn output_anchor(&self, node: &Node, index: usize) -> (f32, f32) {
        (node.x + self.card_width(node.kind), node.y + self.port_offset_y(index))
    }

    /// Anchor of input port `index`, on the card's left edge.
    pub fn input_anchor(&self, node: &Node, index: usize) -> (f32, f32) {
        (node.x, node.y + self.port_offset_y(index))
    }

    pub fn card_bounds(&self, node: &Node) -> CardBounds {
        let rows = node.ports().rows();
        let port_extent = self.port_offset_y(rows) + self.port_radius;
        CardBounds {
            x: node.x,
            y: node.y,
            width: self.card_width(node.kind),
            height: port_extent.max(self.min_card_height),
        }
    }

    pub fn header_bounds(&self, node: &Node) -> CardBounds {
        CardBounds {
            x: node.x,
            y: node.y,
            width: self.card_width(node.kind),
            height: self.header_height,
        }
    }
}
