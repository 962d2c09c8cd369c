//! Static SVG export of the canvas: card outlines with titles, connectors
//! drawn beneath them.

use crate::connector::{connectors, svg_path};
use pbl_core::{CanvasGraph, CanvasMetrics, CardBounds, Node, PortSide};
use std::fmt::Write;

const PAD: f32 = 16.0;
const EMPTY_CANVAS: (f32, f32) = (800.0, 600.0);

/// Stroke layers for one connector, bottom to top: soft shadow, body line,
/// highlight.
const CONNECTOR_LAYERS: [(&str, f32, f32); 3] = [
    ("#1A1A1A", 6.0, 0.1),
    ("#1A1A1A", 2.5, 1.0),
    ("#4FC3F7", 1.0, 0.3),
];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn extent(graph: &CanvasGraph, metrics: &CanvasMetrics) -> Option<CardBounds> {
    let mut all = graph.nodes().map(|n| metrics.card_bounds(n));
    let first = all.next()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x + first.width, first.y + first.height);
    for b in all {
        min_x = min_x.min(b.x);
        min_y = min_y.min(b.y);
        max_x = max_x.max(b.x + b.width);
        max_y = max_y.max(b.y + b.height);
    }
    // Port circles overhang the left and right edges.
    let r = metrics.port_radius;
    Some(CardBounds {
        x: min_x - r,
        y: min_y,
        width: max_x - min_x + 2.0 * r,
        height: max_y - min_y,
    })
}

/// Render the whole canvas as a standalone SVG document.
pub fn render_svg(graph: &CanvasGraph, metrics: &CanvasMetrics) -> String {
    let area = extent(graph, metrics).unwrap_or(CardBounds {
        x: 0.0,
        y: 0.0,
        width: EMPTY_CANVAS.0,
        height: EMPTY_CANVAS.1,
    });
    let width = area.width + PAD * 2.0;
    let height = area.height + PAD * 2.0;
    let offset_x = area.x - PAD;
    let offset_y = area.y - PAD;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; }\n");
    svg.push_str("</style>\n");
    let _ = writeln!(svg, "<g transform=\"translate({}, {})\">", -offset_x, -offset_y);

    for (id, curve) in connectors(graph, metrics) {
        let d = svg_path(&curve);
        let _ = writeln!(svg, "  <g data-connection=\"{id}\">");
        for (stroke, stroke_width, opacity) in CONNECTOR_LAYERS {
            let _ = writeln!(
                svg,
                "    <path d=\"{d}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" stroke-opacity=\"{opacity}\" />"
            );
        }
        svg.push_str("  </g>\n");
    }

    for node in graph.nodes() {
        render_card(&mut svg, node, metrics);
    }

    svg.push_str("</g>\n</svg>");
    log::debug!(
        "exported svg: {} card(s), {} link(s)",
        graph.len(),
        graph.connection_count()
    );
    svg
}

fn render_card(out: &mut String, node: &Node, metrics: &CanvasMetrics) {
    let b = metrics.card_bounds(node);
    let _ = writeln!(out, "  <g data-node=\"{}\" data-type=\"{}\">", node.id, node.kind.type_name());
    let _ = writeln!(
        out,
        "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"8\" ry=\"8\" fill=\"#FFFFFF\" stroke=\"#1A1A1A\" stroke-width=\"2\" />",
        b.x, b.y, b.width, b.height
    );
    let _ = writeln!(
        out,
        "    <text x=\"{}\" y=\"{}\" font-size=\"14\" font-weight=\"600\" fill=\"#1A1A1A\">{}</text>",
        b.x + 12.0,
        b.y + metrics.header_height * 0.6,
        escape(&node.title)
    );

    let ports = node.ports();
    for side in [PortSide::In, PortSide::Out] {
        for index in 0..ports.side(side).len() {
            let (cx, cy) = match side {
                PortSide::In => metrics.input_anchor(node, index),
                PortSide::Out => metrics.output_anchor(node, index),
            };
            let _ = writeln!(
                out,
                "    <circle cx=\"{cx}\" cy=\"{cy}\" r=\"{}\" fill=\"#FFFFFF\" stroke=\"#1A1A1A\" stroke-width=\"2\" />",
                metrics.port_radius / 2.0
            );
        }
    }
    out.push_str("  </g>\n");
}
