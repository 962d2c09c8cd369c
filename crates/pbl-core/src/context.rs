//! Context gathered from the canvas before asking the assistant for text.

use crate::graph::CanvasGraph;
use crate::id::NodeId;
use crate::node::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Which other cards contribute their pinned results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextScope {
    /// Cards reachable backwards over links.
    #[default]
    Upstream,
    /// Every other card that already has a result.
    AllWithResults,
}

/// Project-wide facts every prompt starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBrief {
    pub driving_question: String,
    pub grade: String,
    pub subject: String,
    pub venue: String,
}

impl ProjectBrief {
    /// Read the brief off the first driving-question, curriculum and
    /// resource cards on the canvas, with fallbacks for anything missing.
    pub fn from_graph(graph: &CanvasGraph) -> Self {
        let first = |kind: NodeKind| graph.nodes().find(|n| n.kind == kind);
        let label_of = |kind: NodeKind, label: &str, fallback: &str| -> String {
            first(kind)
                .and_then(|n| n.field_by_label(label))
                .map(|f| f.value.clone())
                .unwrap_or_else(|| fallback.to_string())
        };
        Self {
            driving_question: first(NodeKind::DrivingQuestion)
                .map(|n| n.pinned_text().to_string())
                .unwrap_or_default(),
            grade: label_of(NodeKind::CurriculumSource, "Grade", "Grade 5"),
            subject: label_of(NodeKind::CurriculumSource, "Subject", "Science"),
            venue: label_of(NodeKind::ResourceConfig, "Venue", "Classroom"),
        }
    }

    pub fn describe(&self) -> String {
        let dq: &str = if self.driving_question.is_empty() {
            "driving question not defined yet"
        } else {
            &self.driving_question
        };
        format!(
            "Project background: {dq}. Target learners: {} {}. Venue: {}.",
            self.grade, self.subject, self.venue
        )
    }
}

/// The serialized context for one card: its own field values followed by
/// the pinned results of contributing cards.
pub fn build_context(graph: &CanvasGraph, id: NodeId, scope: ContextScope) -> Option<String> {
    let node = graph.get(id)?;
    let mut out = String::new();

    let _ = writeln!(out, "[{}]", node.title);
    for field in &node.fields {
        let _ = writeln!(out, "{}: {}", field.label, field.value);
    }

    let contributors: Vec<NodeId> = match scope {
        ContextScope::Upstream => graph.upstream(id),
        ContextScope::AllWithResults => graph
            .nodes()
            .map(|n| n.id)
            .filter(|n| *n != id)
            .collect(),
    };
    for other in contributors.into_iter().filter_map(|c| graph.get(c)) {
        if other.has_result() {
            let _ = writeln!(out, "[{}] {}", other.title, other.pinned_text());
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::connection::PortRef;
    use crate::node::{Node, NodeUpdate};

    fn place(graph: &mut CanvasGraph, kind: NodeKind) -> NodeId {
        let node = Catalog::builtin()
            .find(kind)
            .unwrap()
            .instantiate(NodeId::fresh(), 0.0, 0.0);
        let id = node.id;
        graph.add_node(node).unwrap();
        id
    }

    fn give_result(graph: &mut CanvasGraph, id: NodeId, text: &str) {
        graph
            .update_node(
                id,
                NodeUpdate {
                    results: Some(vec![text.to_string()]),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn upstream_scope_follows_links() {
        let mut g = CanvasGraph::new();
        let dq = place(&mut g, NodeKind::DrivingQuestion);
        let edp = place(&mut g, NodeKind::DesignProcess);
        let stray = place(&mut g, NodeKind::ContextIntro);
        give_result(&mut g, dq, "How might we keep the playground dry?");
        give_result(&mut g, stray, "A storm is coming");
        g.link(PortRef::output(dq, 2), PortRef::input(edp, 0)).unwrap();

        let ctx = build_context(&g, edp, ContextScope::Upstream).unwrap();
        assert!(ctx.starts_with("[Design process]\n"));
        assert!(ctx.contains("Define: "));
        assert!(ctx.contains("How might we keep the playground dry?"));
        assert!(!ctx.contains("A storm is coming"));

        let loose = build_context(&g, edp, ContextScope::AllWithResults).unwrap();
        assert!(loose.contains("A storm is coming"));
    }

    #[test]
    fn brief_falls_back_when_cards_are_missing() {
        let mut g = CanvasGraph::new();
        let brief = ProjectBrief::from_graph(&g);
        assert_eq!(brief.grade, "Grade 5");
        assert!(brief.describe().contains("not defined yet"));

        let dq = place(&mut g, NodeKind::DrivingQuestion);
        give_result(&mut g, dq, "HMW reuse rainwater?");
        let _ = g.add_node(Node::new(NodeId::fresh(), NodeKind::Generic, "x"));
        assert!(ProjectBrief::from_graph(&g).describe().contains("HMW reuse rainwater?"));
    }

    #[test]
    fn unknown_card_has_no_context() {
        let g = CanvasGraph::new();
        assert!(build_context(&g, NodeId::intern("absent"), ContextScope::Upstream).is_none());
    }
}
