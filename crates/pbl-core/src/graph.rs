//! The live canvas: cards plus the links between them.
//!
//! Cards are graph nodes and links are graph edges in a `StableDiGraph`,
//! so removing a card drops every incident link with it and nothing can
//! dangle. All mutation goes through methods that check the model
//! invariants; the backing graph is not exposed mutably.

use crate::connection::{Connection, LinkKey, PortRef, validate_link};
use crate::error::{GraphError, LinkError};
use crate::id::{ConnectionId, NodeId};
use crate::node::{Node, NodeUpdate, check_unique_fields};
use crate::ports::Ports;
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{Dfs, Reversed};
use std::collections::HashMap;

/// Result of a successful link gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created(ConnectionId),
    /// An identical directed link already existed; nothing changed.
    AlreadyExists(ConnectionId),
}

impl LinkOutcome {
    pub fn id(self) -> ConnectionId {
        match self {
            LinkOutcome::Created(id) | LinkOutcome::AlreadyExists(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CanvasGraph {
    graph: StableDiGraph<Node, Connection>,
    /// NodeId → NodeIndex.
    id_index: HashMap<NodeId, NodeIndex>,
    /// ConnectionId → EdgeIndex.
    link_index: HashMap<ConnectionId, EdgeIndex>,
    /// Paint order, back to front. Later cards draw on top.
    order: Vec<NodeIndex>,
}

impl CanvasGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    // ─── Cards ───────────────────────────────────────────────────────────

    /// Place a card on top of the canvas.
    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex, GraphError> {
        let id = node.id;
        if self.id_index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        check_unique_fields(node.fields.iter().map(|f| &**f))?;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.order.push(idx);
        Ok(idx)
    }

    /// Remove a card and every link that touches it. Returns the card and
    /// the links that went with it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Connection>)> {
        let idx = self.id_index.remove(&id)?;
        let dropped: Vec<Connection> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().clone())
            .collect();
        for conn in &dropped {
            self.link_index.remove(&conn.id);
        }
        self.order.retain(|i| *i != idx);
        let node = self.graph.remove_node(idx)?;
        log::debug!("removed card {id} with {} link(s)", dropped.len());
        Some((node, dropped))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Cards in paint order (back to front).
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.order.iter().map(|idx| &self.graph[*idx])
    }

    pub fn ports_of(&self, id: NodeId) -> Option<Ports> {
        self.get(id).map(Node::ports)
    }

    /// Set a card's position. The only way coordinates change.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Shallow-merge a patch into a card. All-or-nothing.
    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<(), GraphError> {
        self.node_mut(id)?.apply_update(update)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        let idx = *self.id_index.get(&id).ok_or(GraphError::UnknownNode(id))?;
        Ok(&mut self.graph[idx])
    }

    // ─── Links ───────────────────────────────────────────────────────────

    /// Link two ports, in either click order. Rejections leave the graph
    /// unchanged; an identical existing link is reported, not duplicated.
    pub fn link(&mut self, first: PortRef, second: PortRef) -> Result<LinkOutcome, LinkError> {
        let link = validate_link(first, second, |id| self.ports_of(id))?;
        if let Some(existing) = self.find_link(link.key) {
            return Ok(LinkOutcome::AlreadyExists(existing.id));
        }
        let index_of = |id: NodeId| {
            self.id_index
                .get(&id)
                .copied()
                .ok_or(LinkError::UnknownNode(id))
        };
        let from = index_of(link.key.from)?;
        let to = index_of(link.key.to)?;
        let id = ConnectionId::fresh();
        let conn = link.into_connection(id);
        log::debug!(
            "linked {}[{}] -> {}[{}] ({})",
            conn.from,
            conn.from_port,
            conn.to,
            conn.to_port,
            conn.from_label
        );
        let edge = self.graph.add_edge(from, to, conn);
        self.link_index.insert(id, edge);
        Ok(LinkOutcome::Created(id))
    }

    pub fn find_link(&self, key: LinkKey) -> Option<&Connection> {
        let from = *self.id_index.get(&key.from)?;
        self.graph
            .edges_directed(from, Direction::Outgoing)
            .map(|e| e.weight())
            .find(|c| c.key() == key)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.link_index.get(&id).and_then(|e| self.graph.edge_weight(*e))
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.graph.edge_indices().filter_map(|e| self.graph.edge_weight(e))
    }

    /// Links that end at `id`.
    pub fn incoming(&self, id: NodeId) -> Vec<&Connection> {
        self.id_index
            .get(&id)
            .map(|idx| {
                self.graph
                    .edges_directed(*idx, Direction::Incoming)
                    .map(|e| e.weight())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let edge = self.link_index.remove(&id)?;
        let conn = self.graph.remove_edge(edge)?;
        log::debug!("removed link {id}");
        Some(conn)
    }

    /// Every card that feeds `id`, directly or transitively, nearest first.
    pub fn upstream(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&start) = self.id_index.get(&id) else {
            return Vec::new();
        };
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, start);
        let mut out = Vec::new();
        while let Some(idx) = dfs.next(reversed) {
            if idx != start {
                out.push(self.graph[idx].id);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::node::NodeKind;
    use crate::ports::{DRIVING_QUESTION, PortSide};
    use pretty_assertions::assert_eq;

    fn place(graph: &mut CanvasGraph, kind: NodeKind) -> NodeId {
        let template = Catalog::builtin().find(kind).cloned().unwrap();
        let node = template.instantiate(NodeId::fresh(), 0.0, 0.0);
        let id = node.id;
        graph.add_node(node).unwrap();
        id
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut g = CanvasGraph::new();
        let node = Node::new(NodeId::intern("dup"), NodeKind::Generic, "a");
        g.add_node(node.clone()).unwrap();
        assert_eq!(
            g.add_node(node).unwrap_err(),
            GraphError::DuplicateNode(NodeId::intern("dup"))
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn link_and_dedupe() {
        let mut g = CanvasGraph::new();
        let a = place(&mut g, NodeKind::CurriculumSource);
        let b = place(&mut g, NodeKind::DrivingQuestion);

        let first = g.link(PortRef::output(a, 0), PortRef::input(b, 0)).unwrap();
        let LinkOutcome::Created(id) = first else {
            panic!("expected a new link");
        };
        let conn = g.connection(id).unwrap();
        assert_eq!(conn.from_label, DRIVING_QUESTION);
        assert_eq!(conn.to_label, DRIVING_QUESTION);

        let again = g.link(PortRef::input(b, 0), PortRef::output(a, 0)).unwrap();
        assert_eq!(again, LinkOutcome::AlreadyExists(id));
        assert_eq!(g.connection_count(), 1);
    }

    #[test]
    fn rejected_link_leaves_graph_unchanged() {
        let mut g = CanvasGraph::new();
        let a = place(&mut g, NodeKind::DrivingQuestion);
        let b = place(&mut g, NodeKind::DrivingQuestion);
        let err = g
            .link(PortRef::input(a, 0), PortRef::input(b, 0))
            .unwrap_err();
        assert_eq!(err, LinkError::SamePolarity(PortSide::In));
        assert_eq!(g.connection_count(), 0);
    }

    #[test]
    fn removing_a_card_cascades() {
        let mut g = CanvasGraph::new();
        let src = place(&mut g, NodeKind::CurriculumSource);
        let dq = place(&mut g, NodeKind::DrivingQuestion);
        let ctx = place(&mut g, NodeKind::ContextIntro);
        let edp = place(&mut g, NodeKind::DesignProcess);
        g.link(PortRef::output(src, 0), PortRef::input(dq, 0)).unwrap();
        g.link(PortRef::output(src, 0), PortRef::input(ctx, 0)).unwrap();
        g.link(PortRef::output(dq, 2), PortRef::input(edp, 0)).unwrap();

        let (_, dropped) = g.remove_node(dq).unwrap();
        assert_eq!(dropped.len(), 2);
        assert_eq!(g.connection_count(), 1);
        assert!(g.connections().all(|c| !c.touches(dq)));
        for c in dropped {
            assert!(g.connection(c.id).is_none());
        }
    }

    #[test]
    fn upstream_is_transitive() {
        let mut g = CanvasGraph::new();
        let src = place(&mut g, NodeKind::CurriculumSource);
        let dq = place(&mut g, NodeKind::DrivingQuestion);
        let edp = place(&mut g, NodeKind::DesignProcess);
        let lone = place(&mut g, NodeKind::Rubric);
        g.link(PortRef::output(src, 0), PortRef::input(dq, 0)).unwrap();
        g.link(PortRef::output(dq, 2), PortRef::input(edp, 0)).unwrap();

        let up = g.upstream(edp);
        assert_eq!(up, vec![dq, src]);
        assert!(g.upstream(lone).is_empty());
    }

    #[test]
    fn move_touches_only_target() {
        let mut g = CanvasGraph::new();
        let a = place(&mut g, NodeKind::Scamper);
        let b = place(&mut g, NodeKind::Persona);
        g.move_node(a, 42.0, 7.0).unwrap();
        assert_eq!((g.get(a).unwrap().x, g.get(a).unwrap().y), (42.0, 7.0));
        assert_eq!((g.get(b).unwrap().x, g.get(b).unwrap().y), (0.0, 0.0));
        assert_eq!(
            g.move_node(NodeId::intern("nowhere"), 1.0, 1.0),
            Err(GraphError::UnknownNode(NodeId::intern("nowhere")))
        );
    }
}
