//! Connector geometry: one cubic Bezier per link.
//!
//! Both control points sit on the vertical through the midpoint between
//! the anchors, giving an S-curve that reads left to right whatever the
//! vertical offset. Pure geometry: anchors in, curve out.

use kurbo::{CubicBez, Point};
use pbl_core::{CanvasGraph, CanvasMetrics, Connection, ConnectionId};

/// S-curve from an output anchor to an input anchor.
pub fn connector_curve(start: (f32, f32), end: (f32, f32)) -> CubicBez {
    let (sx, sy) = (f64::from(start.0), f64::from(start.1));
    let (ex, ey) = (f64::from(end.0), f64::from(end.1));
    let mid_x = (sx + ex) / 2.0;
    CubicBez::new(
        Point::new(sx, sy),
        Point::new(mid_x, sy),
        Point::new(mid_x, ey),
        Point::new(ex, ey),
    )
}

/// SVG path data: `M sx sy C c1x c1y, c2x c2y, ex ey`.
pub fn svg_path(curve: &CubicBez) -> String {
    format!(
        "M {} {} C {} {}, {} {}, {} {}",
        curve.p0.x, curve.p0.y, curve.p1.x, curve.p1.y, curve.p2.x, curve.p2.y, curve.p3.x, curve.p3.y
    )
}

/// Curve for one link, or `None` if either card is gone.
pub fn connector_for(graph: &CanvasGraph, conn: &Connection, metrics: &CanvasMetrics) -> Option<CubicBez> {
    let from = graph.get(conn.from)?;
    let to = graph.get(conn.to)?;
    Some(connector_curve(
        metrics.output_anchor(from, conn.from_port),
        metrics.input_anchor(to, conn.to_port),
    ))
}

/// Curves for every drawable link.
pub fn connectors(graph: &CanvasGraph, metrics: &CanvasMetrics) -> Vec<(ConnectionId, CubicBez)> {
    graph
        .connections()
        .filter_map(|c| connector_for(graph, c, metrics).map(|curve| (c.id, curve)))
        .collect()
}
