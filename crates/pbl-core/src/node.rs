//! Cards placed on the course-design canvas.
//!
//! A card is a positioned, typed unit holding its editable fields and the
//! append-only history of text the assistant generated for it. Its
//! [`NodeKind`] drives everything kind-specific: ports, card width and the
//! specialised editor, each through one exhaustive `match`.

use crate::error::GraphError;
use crate::field::Field;
use crate::id::NodeId;
use crate::ports::{Ports, resolve_ports};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

// ─── Kinds ───────────────────────────────────────────────────────────────

/// The closed set of card kinds. Unknown wire names map to `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CurriculumSource,
    ResourceConfig,
    DrivingQuestion,
    ContextIntro,
    GoalAnalysis,
    DesignProcess,
    SupportActivity,
    Scamper,
    Persona,
    EmpathyMap,
    Storyboard,
    MaterialCard,
    Rubric,
    Generic,
}

impl NodeKind {
    pub const ALL: [NodeKind; 14] = [
        NodeKind::CurriculumSource,
        NodeKind::ResourceConfig,
        NodeKind::DrivingQuestion,
        NodeKind::ContextIntro,
        NodeKind::GoalAnalysis,
        NodeKind::DesignProcess,
        NodeKind::SupportActivity,
        NodeKind::Scamper,
        NodeKind::Persona,
        NodeKind::EmpathyMap,
        NodeKind::Storyboard,
        NodeKind::MaterialCard,
        NodeKind::Rubric,
        NodeKind::Generic,
    ];

    /// Wire name used by templates and the host shell.
    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::CurriculumSource => "dq-curriculum",
            NodeKind::ResourceConfig => "dq-resource",
            NodeKind::DrivingQuestion => "dq-problem",
            NodeKind::ContextIntro => "dq-context",
            NodeKind::GoalAnalysis => "dq-analysis",
            NodeKind::DesignProcess => "task-edp",
            NodeKind::SupportActivity => "task-support",
            NodeKind::Scamper => "scaffold-scamper",
            NodeKind::Persona => "scaffold-persona",
            NodeKind::EmpathyMap => "scaffold-empathy",
            NodeKind::Storyboard => "scaffold-story",
            NodeKind::MaterialCard => "scaffold-material",
            NodeKind::Rubric => "assess-rubric",
            NodeKind::Generic => "generic",
        }
    }

    pub fn from_type_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|k| k.type_name() == name)
            .unwrap_or(NodeKind::Generic)
    }

    /// Multi-column editors get the wide card.
    pub fn is_wide(self) -> bool {
        matches!(
            self,
            NodeKind::DesignProcess
                | NodeKind::Rubric
                | NodeKind::Storyboard
                | NodeKind::Persona
                | NodeKind::EmpathyMap
        )
    }
}

impl Serialize for NodeKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_name())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeKind::from_type_name(&s))
    }
}

/// Catalog grouping, used for styling and navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "dq-2.0")]
    DrivingQuestion,
    #[serde(rename = "task-component")]
    Task,
    #[serde(rename = "scaffold-group")]
    Scaffold,
    #[serde(rename = "assessment-class")]
    Assessment,
    #[serde(rename = "custom-node")]
    Custom,
}

/// How the user works with a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionType {
    /// Plain parameters, no generation.
    Parameter,
    /// Has a generate action backed by the assistant.
    Generative,
    /// Specialised visual tool.
    #[serde(rename = "node")]
    VisualTool,
}

// ─── Process stages ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One stage of a process-type card (e.g. an engineering design process).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
}

impl Stage {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            attachments: Vec::new(),
            constraints: Vec::new(),
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A card on the canvas. Position is model space, top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(rename = "interactionType")]
    pub interaction: InteractionType,
    pub title: String,
    /// Shared per field so an edit to one field leaves the others'
    /// allocations untouched.
    pub fields: Vec<Arc<Field>>,
    /// Latest generated text (legacy single-result slot).
    #[serde(default)]
    pub result: String,
    /// Full generation history, append-only.
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(rename = "activeResultIndex", default)]
    pub active_result: Option<usize>,
    #[serde(rename = "pinnedResultIndex", default)]
    pub pinned_result: usize,
    #[serde(default)]
    pub has_inputs: bool,
    #[serde(default)]
    pub has_outputs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            category: Category::Custom,
            kind,
            interaction: InteractionType::Parameter,
            title: title.into(),
            fields: Vec::new(),
            result: String::new(),
            results: Vec::new(),
            active_result: None,
            pinned_result: 0,
            has_inputs: true,
            has_outputs: true,
            stages: None,
        }
    }

    pub fn ports(&self) -> Ports {
        resolve_ports(self.kind, self.has_inputs, self.has_outputs)
    }

    pub fn is_generative(&self) -> bool {
        self.interaction == InteractionType::Generative
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id).map(|f| f.as_ref())
    }

    pub fn field_by_label(&self, label: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.as_ref())
    }

    /// Index of the field that receives generated text: the last
    /// long-text field in document order.
    pub fn primary_text_field(&self) -> Option<usize> {
        self.fields.iter().rposition(|f| f.is_long_text())
    }

    /// The canonical text used when this card feeds downstream context.
    pub fn pinned_text(&self) -> &str {
        self.results
            .get(self.pinned_result)
            .map(String::as_str)
            .unwrap_or(self.result.as_str())
    }

    pub fn has_result(&self) -> bool {
        !self.pinned_text().is_empty()
    }

    /// Copy of the field list with `field_id` replaced by `f(field)`.
    /// Every other entry keeps its `Arc`. `None` if the field is absent.
    pub fn fields_with(
        &self,
        field_id: &str,
        f: impl FnOnce(&Field) -> Field,
    ) -> Option<Vec<Arc<Field>>> {
        let idx = self.fields.iter().position(|fld| fld.id == field_id)?;
        let mut fields = self.fields.clone();
        fields[idx] = Arc::new(f(&self.fields[idx]));
        Some(fields)
    }

    /// Shallow-merge `update` into this node. The merged state is checked
    /// first; on error the node is left as it was.
    pub fn apply_update(&mut self, update: NodeUpdate) -> Result<(), GraphError> {
        let results_len = match &update.results {
            Some(results) => {
                if results.len() < self.results.len() {
                    return Err(GraphError::ResultsTruncated {
                        old: self.results.len(),
                        new: results.len(),
                    });
                }
                if let Some(index) = self.results.iter().zip(results).position(|(old, new)| old != new) {
                    return Err(GraphError::ResultRewritten { index });
                }
                results.len()
            }
            None => self.results.len(),
        };
        if let Some(fields) = &update.fields {
            check_unique_fields(fields.iter().map(|f| &**f))?;
        }
        let active = update.active_result.unwrap_or(self.active_result);
        if let Some(index) = active
            && index >= results_len
        {
            return Err(GraphError::ActiveResultOutOfRange {
                index,
                len: results_len,
            });
        }
        // Index 0 on an empty history is the resting state.
        if let Some(index) = update.pinned_result
            && index >= results_len.max(1)
        {
            return Err(GraphError::PinnedResultOutOfRange {
                index,
                len: results_len,
            });
        }

        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(fields) = update.fields {
            self.fields = fields;
        }
        if let Some(result) = update.result {
            self.result = result;
        }
        if let Some(results) = update.results {
            self.results = results;
        }
        self.active_result = active;
        if let Some(pinned) = update.pinned_result {
            self.pinned_result = pinned;
        }
        if let Some(stages) = update.stages {
            self.stages = stages;
        }
        Ok(())
    }
}

/// Reject a field list that repeats an id.
pub fn check_unique_fields<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Result<(), GraphError> {
    let mut seen = HashSet::new();
    for field in fields {
        let id = field.id.as_str();
        if !seen.insert(id) {
            return Err(GraphError::DuplicateField(id.to_string()));
        }
    }
    Ok(())
}

/// A partial set of node attributes, shallow-merged by
/// [`Node::apply_update`]. Position is deliberately absent: cards move
/// only through drag gestures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub title: Option<String>,
    pub fields: Option<Vec<Arc<Field>>>,
    pub result: Option<String>,
    pub results: Option<Vec<String>>,
    /// `Some(None)` clears the active selection.
    #[serde(rename = "activeResultIndex")]
    pub active_result: Option<Option<usize>>,
    #[serde(rename = "pinnedResultIndex")]
    pub pinned_result: Option<usize>,
    pub stages: Option<Option<Vec<Stage>>>,
}

impl NodeUpdate {
    pub fn fields(fields: Vec<Arc<Field>>) -> Self {
        Self {
            fields: Some(fields),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Node {
        let mut node = Node::new(NodeId::intern("n-sample"), NodeKind::Rubric, "Rubric");
        node.fields = vec![
            Arc::new(Field::radar_dim("d1", "Dimension", "Teamwork", 40)),
            Arc::new(Field::textarea("notes", "Notes", "")),
            Arc::new(Field::radar_dim("d2", "Dimension", "Craft", 30)),
            Arc::new(Field::textarea("r1", "Full rubric", "")),
        ];
        node
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_type_name(kind.type_name()), kind);
        }
        assert_eq!(NodeKind::from_type_name("mystery"), NodeKind::Generic);
    }

    #[test]
    fn primary_text_field_is_last_long_text() {
        assert_eq!(sample().primary_text_field(), Some(3));
        let mut plain = sample();
        plain.fields.truncate(1);
        assert_eq!(plain.primary_text_field(), None);
    }

    #[test]
    fn fields_with_shares_untouched_fields() {
        let node = sample();
        let fields = node
            .fields_with("notes", |f| f.with_value("checked"))
            .unwrap();
        assert_eq!(fields[1].value, "checked");
        for i in [0, 2, 3] {
            assert!(Arc::ptr_eq(&fields[i], &node.fields[i]));
        }
        assert!(!Arc::ptr_eq(&fields[1], &node.fields[1]));
        assert!(node.fields_with("missing", |f| f.clone()).is_none());
    }

    #[test]
    fn pinned_text_falls_back_to_legacy_result() {
        let mut node = sample();
        assert_eq!(node.pinned_text(), "");
        node.result = "legacy".into();
        assert_eq!(node.pinned_text(), "legacy");
        node.results = vec!["v1".into(), "v2".into()];
        node.pinned_result = 1;
        assert_eq!(node.pinned_text(), "v2");
    }

    #[test]
    fn update_rejects_bad_indices_atomically() {
        let mut node = sample();
        let err = node
            .apply_update(NodeUpdate {
                title: Some("renamed".into()),
                active_result: Some(Some(0)),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, GraphError::ActiveResultOutOfRange { index: 0, len: 0 });
        assert_eq!(node.title, "Rubric");
    }

    #[test]
    fn update_rejects_shrinking_history() {
        let mut node = sample();
        node.results = vec!["a".into(), "b".into()];
        let err = node
            .apply_update(NodeUpdate {
                results: Some(vec!["a".into()]),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, GraphError::ResultsTruncated { old: 2, new: 1 });
    }

    #[test]
    fn update_rejects_rewritten_history() {
        let mut node = sample();
        node.results = vec!["a".into()];
        let err = node
            .apply_update(NodeUpdate {
                results: Some(vec!["X".into()]),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, GraphError::ResultRewritten { index: 0 });
        let err = node
            .apply_update(NodeUpdate {
                results: Some(vec!["X".into(), "b".into()]),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, GraphError::ResultRewritten { index: 0 });
        assert_eq!(node.results, vec!["a"]);

        node.apply_update(NodeUpdate {
            results: Some(vec!["a".into(), "b".into()]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(node.results, vec!["a", "b"]);
    }

    #[test]
    fn update_rejects_repeated_field_ids() {
        let mut node = sample();
        let before = node.fields.clone();
        let err = node
            .apply_update(NodeUpdate::fields(vec![
                Arc::new(Field::text("m1", "Material", "")),
                Arc::new(Field::text("m1", "Material", "")),
            ]))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateField("m1".into()));
        assert_eq!(node.fields, before);
    }

    #[test]
    fn pinned_index_checked_on_empty_history() {
        let mut node = sample();
        let err = node
            .apply_update(NodeUpdate {
                pinned_result: Some(5),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, GraphError::PinnedResultOutOfRange { index: 5, len: 0 });
        assert_eq!(node.pinned_result, 0);
        node.apply_update(NodeUpdate {
            pinned_result: Some(0),
            ..Default::default()
        })
        .unwrap();
    }

    #[test]
    fn node_wire_names() {
        let node = sample();
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "assess-rubric");
        assert_eq!(json["category"], "custom-node");
        assert_eq!(json["interactionType"], "parameter");
        assert!(json["activeResultIndex"].is_null());
        assert_eq!(json["hasInputs"], true);
    }
}
