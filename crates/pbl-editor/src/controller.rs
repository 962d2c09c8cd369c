//! Canvas controller: the single owner of cards and links.
//!
//! Every mutation of the canvas goes through this type. It routes input
//! through hit testing and the gesture machine, applies the resulting
//! mutations to the graph, and turns user-visible failures into notices
//! the host drains after each event.

use crate::assist::{
    AssistError, BusyGuard, BusySet, FALLBACK_TEXT, GenerationError, GenerativeAssist, build_prompt,
};
use crate::card::{CardEdit, CardView, EditError, generation_update};
use crate::input::InputEvent;
use crate::interaction::{CanvasMutation, Gesture, GestureMachine};
use pbl_core::{
    CanvasGraph, CanvasMetrics, Connection, ConnectionId, ContextScope, GraphError, LinkError, LinkOutcome,
    Node, NodeId, NodeProposal, NodeUpdate, PortRef, Template,
};
use pbl_render::{Hit, hit_test};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Seed used when the host does not supply one.
const DEFAULT_SEED: u64 = 0x5eed_ca4d;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    LinkRejected(LinkError),
    /// Generation failed and the fallback text was written instead.
    GenerationFailed { node: NodeId, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LinkRejected(e) => write!(f, "Link failed: {e}"),
            Notice::GenerationFailed { reason, .. } => write!(f, "Generation failed: {reason}"),
        }
    }
}

/// A generation in flight. Holding it keeps the card busy; dropping it,
/// finished or not, clears the busy mark.
#[derive(Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    guard: BusyGuard,
}

impl GenerationRequest {
    pub fn node(&self) -> NodeId {
        self.guard.node()
    }
}

type DetailCallback = Box<dyn FnMut(NodeId)>;

pub struct CanvasController {
    graph: CanvasGraph,
    metrics: CanvasMetrics,
    scope: ContextScope,
    gesture: GestureMachine,
    rng: SmallRng,
    busy: BusySet,
    notices: Vec<Notice>,
    on_select_node_for_detail: Option<DetailCallback>,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new(CanvasMetrics::default())
    }
}

impl CanvasController {
    pub fn new(metrics: CanvasMetrics) -> Self {
        Self::with_seed(metrics, DEFAULT_SEED)
    }

    /// Controller whose spawn jitter is drawn from `seed`.
    pub fn with_seed(metrics: CanvasMetrics, seed: u64) -> Self {
        Self {
            graph: CanvasGraph::new(),
            metrics,
            scope: ContextScope::default(),
            gesture: GestureMachine::new(),
            rng: SmallRng::seed_from_u64(seed),
            busy: BusySet::new(),
            notices: Vec::new(),
            on_select_node_for_detail: None,
        }
    }

    pub fn set_context_scope(&mut self, scope: ContextScope) {
        self.scope = scope;
    }

    pub fn context_scope(&self) -> ContextScope {
        self.scope
    }

    /// Register the host's extended-editor hook.
    pub fn on_select_node_for_detail(&mut self, callback: impl FnMut(NodeId) + 'static) {
        self.on_select_node_for_detail = Some(Box::new(callback));
    }

    // ─── Read access ─────────────────────────────────────────────────────

    pub fn graph(&self) -> &CanvasGraph {
        &self.graph
    }

    pub fn metrics(&self) -> &CanvasMetrics {
        &self.metrics
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture.state()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.get(id)
    }

    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.graph.nodes()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.graph.connections()
    }

    pub fn is_busy(&self, id: NodeId) -> bool {
        self.busy.contains(id)
    }

    pub fn card_view(&self, id: NodeId) -> Option<CardView> {
        self.graph.get(id).map(|n| CardView::build(n, self.is_busy(id)))
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ─── Cards ───────────────────────────────────────────────────────────

    fn unused_id(&self) -> NodeId {
        loop {
            let id = NodeId::fresh();
            if !self.graph.contains(id) {
                return id;
            }
        }
    }

    /// Drop a catalog card near the spawn origin, jittered so repeated
    /// adds do not stack exactly.
    pub fn add_node(&mut self, template: &Template) -> Result<NodeId, GraphError> {
        let (ox, oy) = self.metrics.spawn_origin;
        let jitter = self.metrics.spawn_jitter;
        let x = ox + self.rng.random::<f32>() * jitter;
        let y = oy + self.rng.random::<f32>() * jitter;
        let node = template.instantiate(self.unused_id(), x, y);
        let id = node.id;
        self.graph.add_node(node)?;
        log::debug!("added {} card {id}", template.kind.type_name());
        Ok(id)
    }

    /// Place a card suggested by the assistant at the proposal origin.
    pub fn add_proposed(&mut self, proposal: &NodeProposal) -> Result<NodeId, GraphError> {
        let (x, y) = self.metrics.proposal_origin;
        let node = proposal.instantiate(self.unused_id(), x, y)?;
        let id = node.id;
        self.graph.add_node(node)?;
        log::debug!("added proposed card {id}");
        Ok(id)
    }

    /// Remove a card and every link touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.gesture.forget_node(id);
        self.graph.remove_node(id).map(|(node, _)| node)
    }

    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<(), GraphError> {
        self.graph.update_node(id, update)
    }

    /// Apply one card edit as a single update.
    pub fn edit_card(&mut self, id: NodeId, edit: &CardEdit) -> Result<(), EditError> {
        let node = self.graph.get(id).ok_or(EditError::UnknownNode(id))?;
        let update = edit.to_update(node)?;
        self.graph.update_node(id, update)?;
        Ok(())
    }

    /// Ask the host to open its extended editor for `id`.
    pub fn select_for_detail(&mut self, id: NodeId) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        if let Some(callback) = self.on_select_node_for_detail.as_mut() {
            callback(id);
        }
        true
    }

    // ─── Links ───────────────────────────────────────────────────────────

    /// Link two ports in either order. A rejection is also queued as a
    /// notice.
    pub fn link(&mut self, first: PortRef, second: PortRef) -> Result<LinkOutcome, LinkError> {
        match self.graph.link(first, second) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::warn!("link rejected: {e}");
                self.notices.push(Notice::LinkRejected(e.clone()));
                Err(e)
            }
        }
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        self.graph.remove_connection(id)
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    /// Route one host event through hit testing and the gesture machine.
    pub fn handle(&mut self, event: &InputEvent) {
        let hit = event
            .position()
            .map_or(Hit::Canvas, |(x, y)| hit_test(&self.graph, &self.metrics, x, y));
        let graph = &self.graph;
        let mutations = self
            .gesture
            .handle(event, hit, |id| graph.get(id).map(|n| (n.x, n.y)));
        self.apply(mutations);
    }

    fn apply(&mut self, mutations: Vec<CanvasMutation>) {
        for mutation in mutations {
            match mutation {
                CanvasMutation::MoveNode { id, x, y } => {
                    if let Err(e) = self.graph.move_node(id, x, y) {
                        log::warn!("drag target vanished: {e}");
                        self.gesture.forget_node(id);
                    }
                }
                CanvasMutation::Link { first, second } => {
                    // Rejections are already queued as notices.
                    let _ = self.link(first, second);
                }
                CanvasMutation::RemoveConnection(id) => {
                    self.remove_connection(id);
                }
            }
        }
    }

    /// Start dragging a card by its header. Ignored unless idle.
    pub fn pointer_down_on_header(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        let Some(node) = self.graph.get(id) else {
            return false;
        };
        let origin = (node.x, node.y);
        self.gesture.press_header(id, (x, y), origin)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let mutation = self.gesture.pointer_move(x, y);
        self.apply(mutation.into_iter().collect());
    }

    pub fn pointer_up(&mut self) {
        self.gesture.release();
    }

    pub fn click_port(&mut self, port: PortRef) {
        let mutation = self.gesture.click_port(port);
        self.apply(mutation.into_iter().collect());
    }

    pub fn click_connector(&mut self, id: ConnectionId) {
        let mutation = self.gesture.click_connector(id);
        self.apply(mutation.into_iter().collect());
    }

    pub fn click_canvas(&mut self) {
        self.gesture.cancel();
    }

    // ─── Generation ──────────────────────────────────────────────────────

    /// Mark a generative card busy and build its prompt.
    pub fn begin_generation(&self, id: NodeId) -> Result<GenerationRequest, GenerationError> {
        let node = self.graph.get(id).ok_or(GenerationError::UnknownNode(id))?;
        if !node.is_generative() {
            return Err(GenerationError::NotGenerative(id));
        }
        let prompt = build_prompt(&self.graph, id, self.scope).ok_or(GenerationError::UnknownNode(id))?;
        let guard = self.busy.try_acquire(id).ok_or(GenerationError::Busy(id))?;
        log::debug!("generation started for {id}");
        Ok(GenerationRequest { prompt, guard })
    }

    /// Record the outcome of a request in one update. Failures and empty
    /// replies are replaced by the fallback text. The busy mark clears
    /// before anything else happens.
    pub fn finish_generation(
        &mut self,
        request: GenerationRequest,
        outcome: Result<String, AssistError>,
    ) -> Result<(), GenerationError> {
        let GenerationRequest { guard, .. } = request;
        let id = guard.node();
        drop(guard);

        let outcome = outcome.and_then(|text| {
            if text.trim().is_empty() {
                Err(AssistError::EmptyResponse)
            } else {
                Ok(text)
            }
        });
        let text = match outcome {
            Ok(text) => text,
            Err(e) => {
                log::warn!("generation for {id} failed: {e}");
                self.notices.push(Notice::GenerationFailed {
                    node: id,
                    reason: e.to_string(),
                });
                FALLBACK_TEXT.to_string()
            }
        };

        let node = self.graph.get(id).ok_or(GenerationError::UnknownNode(id))?;
        let update = generation_update(node, &text);
        self.graph.update_node(id, update)?;
        Ok(())
    }

    /// Run both generation phases against `assist`.
    pub fn generate(&mut self, id: NodeId, assist: &dyn GenerativeAssist) -> Result<(), GenerationError> {
        let request = self.begin_generation(id)?;
        let outcome = assist.complete(&request.prompt);
        self.finish_generation(request, outcome)
    }
}
