//! Hit testing: canvas point → what is under it.
//!
//! Walks cards front to back (last painted = topmost). Ports are checked
//! before card bodies because their circles overhang the card edges.
//! Connectors are drawn beneath cards, so they only catch points that
//! miss every card.

use crate::connector::connector_for;
use kurbo::{ParamCurveNearest, Point};
use pbl_core::{CanvasGraph, CanvasMetrics, ConnectionId, Node, NodeId, PortRef, PortSide};

/// Distance accuracy used when projecting onto connector curves.
const NEAREST_ACCURACY: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Port(PortRef),
    /// The drag handle strip at the top of a card.
    Header(NodeId),
    Body(NodeId),
    Connector(ConnectionId),
    Canvas,
}

/// Find what sits at `(px, py)`.
pub fn hit_test(graph: &CanvasGraph, metrics: &CanvasMetrics, px: f32, py: f32) -> Hit {
    for node in graph.nodes().rev() {
        if let Some(port) = hit_port(node, metrics, px, py) {
            return Hit::Port(port);
        }
        if metrics.header_bounds(node).contains(px, py) {
            return Hit::Header(node.id);
        }
        if metrics.card_bounds(node).contains(px, py) {
            return Hit::Body(node.id);
        }
    }
    hit_connector(graph, metrics, px, py).map_or(Hit::Canvas, Hit::Connector)
}

fn hit_port(node: &Node, metrics: &CanvasMetrics, px: f32, py: f32) -> Option<PortRef> {
    let ports = node.ports();
    let r2 = metrics.port_radius * metrics.port_radius;
    let near = |(ax, ay): (f32, f32)| (px - ax).powi(2) + (py - ay).powi(2) <= r2;

    for side in [PortSide::In, PortSide::Out] {
        for index in 0..ports.side(side).len() {
            let anchor = match side {
                PortSide::In => metrics.input_anchor(node, index),
                PortSide::Out => metrics.output_anchor(node, index),
            };
            if near(anchor) {
                return Some(PortRef {
                    node: node.id,
                    side,
                    index,
                });
            }
        }
    }
    None
}

/// Topmost connector within the click tolerance of `(px, py)`.
pub fn hit_connector(graph: &CanvasGraph, metrics: &CanvasMetrics, px: f32, py: f32) -> Option<ConnectionId> {
    let p = Point::new(f64::from(px), f64::from(py));
    let tolerance = f64::from(metrics.connector_hit_tolerance);
    let mut best: Option<(f64, ConnectionId)> = None;

    for conn in graph.connections() {
        let Some(curve) = connector_for(graph, conn, metrics) else {
            continue;
        };
        let d2 = curve.nearest(p, NEAREST_ACCURACY).distance_sq;
        if d2 <= tolerance * tolerance && best.is_none_or(|(b, _)| d2 < b) {
            best = Some((d2, conn.id));
        }
    }
    best.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::connector_curve;
    use kurbo::ParamCurve;
    use pbl_core::{Catalog, NodeKind};

    fn setup() -> (CanvasGraph, NodeId, NodeId) {
        let catalog = Catalog::builtin();
        let mut g = CanvasGraph::new();
        let a = catalog
            .find(NodeKind::CurriculumSource)
            .unwrap()
            .instantiate(NodeId::fresh(), 0.0, 0.0);
        let b = catalog
            .find(NodeKind::DrivingQuestion)
            .unwrap()
            .instantiate(NodeId::fresh(), 600.0, 200.0);
        let ids = (a.id, b.id);
        g.add_node(a).unwrap();
        g.add_node(b).unwrap();
        (g, ids.0, ids.1)
    }

    #[test]
    fn ports_header_body_canvas() {
        let (g, a, b) = setup();
        let m = CanvasMetrics::default();

        assert_eq!(hit_test(&g, &m, 282.0, 74.0), Hit::Port(PortRef::output(a, 0)));
        assert_eq!(hit_test(&g, &m, 598.0, 273.0), Hit::Port(PortRef::input(b, 0)));
        assert_eq!(hit_test(&g, &m, 880.0, 200.0 + 153.0), Hit::Port(PortRef::output(b, 2)));
        assert_eq!(hit_test(&g, &m, 50.0, 20.0), Hit::Header(a));
        assert_eq!(hit_test(&g, &m, 150.0, 120.0), Hit::Body(a));
        assert_eq!(hit_test(&g, &m, 1500.0, 1500.0), Hit::Canvas);
    }

    #[test]
    fn topmost_card_wins() {
        let (mut g, a, _) = setup();
        let m = CanvasMetrics::default();
        let top = Catalog::builtin()
            .find(NodeKind::Scamper)
            .unwrap()
            .instantiate(NodeId::fresh(), 20.0, 10.0);
        let top_id = top.id;
        g.add_node(top).unwrap();
        assert_eq!(hit_test(&g, &m, 40.0, 30.0), Hit::Header(top_id));
        assert_ne!(hit_test(&g, &m, 40.0, 30.0), Hit::Header(a));
    }

    #[test]
    fn connector_catches_points_near_curve() {
        let (mut g, a, b) = setup();
        let m = CanvasMetrics::default();
        let id = g.link(PortRef::output(a, 0), PortRef::input(b, 0)).unwrap().id();

        let curve = connector_curve(m.output_anchor(g.get(a).unwrap(), 0), m.input_anchor(g.get(b).unwrap(), 0));
        let mid = curve.eval(0.5);
        assert_eq!(hit_test(&g, &m, mid.x as f32, mid.y as f32 + 3.0), Hit::Connector(id));
        assert_eq!(hit_test(&g, &m, mid.x as f32, mid.y as f32 + 40.0), Hit::Canvas);
    }
}
