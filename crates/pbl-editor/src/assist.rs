//! Contract with the generative assist service.
//!
//! The transport itself lives in the host. This module owns what crosses
//! the boundary: the prompt built from the canvas, the reply types, the
//! fallback text that replaces any failure, and the busy bookkeeping that
//! must clear on every outcome.

use pbl_core::{
    CanvasGraph, ContextScope, IntensityBand, NodeId, NodeKind, NodeProposal, ProjectBrief,
    build_context,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Write;
use std::rc::Rc;
use thiserror::Error;

/// Written into a card in place of a reply whenever generation fails.
pub const FALLBACK_TEXT: &str = "AI generation is busy, please try again later.";

/// Slider position assumed when a support activity has no readable slider.
const DEFAULT_INTENSITY: i64 = 50;

/// Failure talking to the assist service.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assist service unavailable: {0}")]
    Transport(String),

    #[error("assist service returned an empty reply")]
    EmptyResponse,

    #[error("malformed reply: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Why a card could not start generating.
#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("card {0} does not exist")]
    UnknownNode(NodeId),

    #[error("card {0} is not generative")]
    NotGenerative(NodeId),

    #[error("card {0} is already generating")]
    Busy(NodeId),

    #[error(transparent)]
    Graph(#[from] pbl_core::GraphError),
}

/// Anything that can turn a prompt into text.
pub trait GenerativeAssist {
    fn complete(&self, prompt: &str) -> Result<String, AssistError>;
}

// ─── Prompts ─────────────────────────────────────────────────────────────

fn strength_phrase(band: IntensityBand) -> &'static str {
    match band {
        IntensityBand::Low => "low intensity (hint-driven prompts)",
        IntensityBand::Medium => "medium intensity (structured templates)",
        IntensityBand::High => "high intensity (step-by-step instructions)",
    }
}

/// Prompt for generating a card's content, or `None` for an unknown card.
pub fn build_prompt(graph: &CanvasGraph, id: NodeId, scope: ContextScope) -> Option<String> {
    let node = graph.get(id)?;
    let brief = ProjectBrief::from_graph(graph).describe();

    let mut prompt = match node.kind {
        NodeKind::Rubric => {
            let dimensions = node
                .fields
                .iter()
                .filter_map(|f| f.weight().map(|w| format!("- {} (weight: {w}%)", f.value)))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "Based on the project: {brief} Produce a professional PBL rubric as a Markdown table. \
                 Dimensions:\n{dimensions}\nThe rubric should have three levels: excellent, proficient, needs improvement."
            )
        }
        NodeKind::SupportActivity => {
            let value = node
                .fields
                .iter()
                .find_map(|f| f.slider_value())
                .unwrap_or(DEFAULT_INTENSITY);
            let strength = strength_phrase(IntensityBand::from_value(value));
            format!(
                "Based on the project: {brief} Design a supporting activity for students. \
                 Required scaffold intensity: {strength}. Describe the concrete steps and the materials needed."
            )
        }
        NodeKind::DrivingQuestion => {
            let value_of = |label: &str, fallback: &'static str| {
                node.field_by_label(label)
                    .map(|f| f.value.trim())
                    .filter(|v| !v.is_empty())
                    .unwrap_or(fallback)
                    .to_string()
            };
            let role = value_of("Role", "we");
            let action = value_of("Action", "solve");
            format!(
                "Based on the background: {brief} Generate an inspiring HMW (How Might We) driving question. \
                 The role is \"{role}\" and the core action is \"{action}\"."
            )
        }
        _ => format!(
            "For the PBL project step: {}. {brief} Provide professional, thought-provoking suggestions.",
            node.title
        ),
    };

    if let Some(context) = build_context(graph, id, scope) {
        let _ = write!(prompt, "\n\nCard context:\n{context}");
    }
    Some(prompt)
}

// ─── Structured replies ──────────────────────────────────────────────────

/// Teaching intervention suggested by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub explanation: String,
    pub student_draft: String,
    pub source_name: String,
    pub source_content: String,
}

impl Intervention {
    pub fn fallback() -> Self {
        Self {
            explanation: "Analysis error".into(),
            student_draft: "Keep going!".into(),
            source_name: "System".into(),
            source_content: String::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AssistError> {
        if raw.trim().is_empty() {
            return Err(AssistError::EmptyResponse);
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode a reply, substituting the fallback on any failure.
    pub fn from_reply(reply: Result<String, AssistError>) -> Self {
        match reply.and_then(|raw| Self::parse(&raw)) {
            Ok(intervention) => intervention,
            Err(e) => {
                log::warn!("intervention reply unusable: {e}");
                Self::fallback()
            }
        }
    }
}

pub fn intervention_prompt(query: &str) -> String {
    format!(
        "PBL teaching intervention analysis. Question: {query}\n\
         Reply with a JSON object with the string keys explanation, studentDraft, sourceName, sourceContent."
    )
}

/// Ask for an intervention. Never fails; see [`Intervention::from_reply`].
pub fn request_intervention(assist: &dyn GenerativeAssist, query: &str) -> Intervention {
    Intervention::from_reply(assist.complete(&intervention_prompt(query)))
}

/// Decode card proposals: a JSON array of proposals or a single one.
pub fn parse_proposals(raw: &str) -> Result<Vec<NodeProposal>, AssistError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<NodeProposal>),
        One(NodeProposal),
    }

    if raw.trim().is_empty() {
        return Err(AssistError::EmptyResponse);
    }
    Ok(match serde_json::from_str(raw)? {
        OneOrMany::Many(all) => all,
        OneOrMany::One(one) => vec![one],
    })
}

// ─── Busy tracking ───────────────────────────────────────────────────────

/// Cards with a generation in flight.
#[derive(Debug, Clone, Default)]
pub struct BusySet(Rc<RefCell<HashSet<NodeId>>>);

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` busy. `None` if it already is.
    pub fn try_acquire(&self, id: NodeId) -> Option<BusyGuard> {
        if !self.0.borrow_mut().insert(id) {
            return None;
        }
        Some(BusyGuard {
            set: Rc::clone(&self.0),
            node: id,
        })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.borrow().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Clears its card's busy mark when dropped.
#[derive(Debug)]
pub struct BusyGuard {
    set: Rc<RefCell<HashSet<NodeId>>>,
    node: NodeId,
}

impl BusyGuard {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.set.borrow_mut().remove(&self.node);
    }
}

// ─── Test double ─────────────────────────────────────────────────────────

#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedAssist;

#[cfg(any(test, feature = "testing"))]
mod scripted {
    use super::{AssistError, GenerativeAssist};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays queued replies in order and records every prompt it was sent.
    /// An exhausted script answers with a transport error.
    #[derive(Debug, Default)]
    pub struct ScriptedAssist {
        replies: RefCell<VecDeque<Result<String, AssistError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedAssist {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: impl Into<String>) -> Self {
            self.replies.borrow_mut().push_back(Ok(text.into()));
            self
        }

        pub fn fail(self, error: AssistError) -> Self {
            self.replies.borrow_mut().push_back(Err(error));
            self
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.borrow().clone()
        }
    }

    impl GenerativeAssist for ScriptedAssist {
        fn complete(&self, prompt: &str) -> Result<String, AssistError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(AssistError::Transport("script exhausted".into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbl_core::{Catalog, NodeUpdate, PortRef};
    use pretty_assertions::assert_eq;

    fn place(graph: &mut CanvasGraph, kind: NodeKind) -> NodeId {
        let node = Catalog::builtin()
            .find(kind)
            .unwrap()
            .instantiate(NodeId::fresh(), 0.0, 0.0);
        let id = node.id;
        graph.add_node(node).unwrap();
        id
    }

    #[test]
    fn rubric_prompt_lists_weighted_dimensions() {
        let mut g = CanvasGraph::new();
        let rubric = place(&mut g, NodeKind::Rubric);
        let prompt = build_prompt(&g, rubric, ContextScope::Upstream).unwrap();
        assert!(prompt.contains("- Dimension 1 (weight: 40%)\n- Dimension 2 (weight: 30%)"));
        assert!(prompt.contains("driving question not defined yet"));
    }

    #[test]
    fn support_prompt_follows_slider_band() {
        let mut g = CanvasGraph::new();
        let support = place(&mut g, NodeKind::SupportActivity);
        let prompt = build_prompt(&g, support, ContextScope::Upstream).unwrap();
        assert!(prompt.contains("medium intensity"));

        let node = g.get(support).unwrap();
        let fields = node.fields_with("f1", |f| f.with_value("80")).unwrap();
        g.update_node(support, NodeUpdate::fields(fields)).unwrap();
        let prompt = build_prompt(&g, support, ContextScope::Upstream).unwrap();
        assert!(prompt.contains("high intensity"));
    }

    #[test]
    fn driving_question_prompt_uses_role_and_action() {
        let mut g = CanvasGraph::new();
        let src = place(&mut g, NodeKind::CurriculumSource);
        let dq = place(&mut g, NodeKind::DrivingQuestion);
        g.link(PortRef::output(src, 0), PortRef::input(dq, 0)).unwrap();
        let node = g.get(dq).unwrap();
        let fields = node.fields_with("f1", |f| f.with_value("city planners")).unwrap();
        g.update_node(dq, NodeUpdate::fields(fields)).unwrap();

        let prompt = build_prompt(&g, dq, ContextScope::Upstream).unwrap();
        assert!(prompt.contains("The role is \"city planners\""));
        assert!(prompt.contains("core action is \"What they do"));
        assert!(prompt.contains("Card context:\n[Driving question generator]"));
    }

    #[test]
    fn other_kinds_use_title() {
        let mut g = CanvasGraph::new();
        let scamper = place(&mut g, NodeKind::Scamper);
        let prompt = build_prompt(&g, scamper, ContextScope::Upstream).unwrap();
        assert!(prompt.starts_with("For the PBL project step: SCAMPER."));
        assert!(build_prompt(&g, NodeId::intern("missing"), ContextScope::Upstream).is_none());
    }

    #[test]
    fn intervention_parses_or_falls_back() {
        let raw = r#"{"explanation":"e","studentDraft":"d","sourceName":"n","sourceContent":"c"}"#;
        let parsed = Intervention::from_reply(Ok(raw.to_string()));
        assert_eq!(parsed.student_draft, "d");

        assert_eq!(Intervention::from_reply(Ok("{not json".into())), Intervention::fallback());
        assert_eq!(Intervention::from_reply(Ok(String::new())), Intervention::fallback());
        assert_eq!(
            Intervention::from_reply(Err(AssistError::Transport("offline".into()))),
            Intervention::fallback()
        );
        let missing_key = r#"{"explanation":"e"}"#;
        assert_eq!(Intervention::from_reply(Ok(missing_key.into())), Intervention::fallback());
    }

    #[test]
    fn proposals_accept_one_or_many() {
        let one = parse_proposals(r#"{"title":"Peer review"}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].title.as_deref(), Some("Peer review"));

        let many = parse_proposals(r#"[{"type":"scaffold-scamper"},{}]"#).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[0].kind, Some(NodeKind::Scamper));
        assert!(matches!(parse_proposals("  "), Err(AssistError::EmptyResponse)));
    }

    #[test]
    fn busy_guard_clears_on_drop() {
        let busy = BusySet::new();
        let id = NodeId::intern("gen");
        let guard = busy.try_acquire(id).unwrap();
        assert!(busy.contains(id));
        assert!(busy.try_acquire(id).is_none());
        drop(guard);
        assert!(!busy.contains(id));
        assert!(busy.is_empty());
    }

    #[test]
    fn scripted_assist_replays_in_order() {
        let assist = ScriptedAssist::new().reply("first").fail(AssistError::EmptyResponse);
        assert_eq!(assist.complete("p1").unwrap(), "first");
        assert!(assist.complete("p2").is_err());
        assert!(matches!(assist.complete("p3"), Err(AssistError::Transport(_))));
        assert_eq!(assist.prompts(), vec!["p1", "p2", "p3"]);
    }
}
