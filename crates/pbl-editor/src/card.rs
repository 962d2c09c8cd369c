//! Per-card editor contract.
//!
//! `CardView` is what a host needs to draw one card: port tooltips, the
//! editor layout, one widget per field and the generate action. `CardEdit`
//! is what the host sends back; each edit becomes a single `NodeUpdate` so
//! the controller applies it atomically.

use pbl_core::catalog::{RUBRIC_TEXT_FIELD, new_rubric_dimension, new_story_shot};
use pbl_core::{Field, FieldKind, GraphError, IntensityBand, Node, NodeId, NodeKind, NodeUpdate, PortSide};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Specialised editor arrangement for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorLayout {
    Standard,
    /// Four quadrants around the user plus pains and gains.
    EmpathyMap,
    /// Name banner followed by the profile fields.
    Persona,
    /// One lettered prompt per SCAMPER verb.
    Scamper,
    Storyboard,
    /// Weighted dimensions followed by the full rubric text.
    Rubric,
}

impl EditorLayout {
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::EmpathyMap => Self::EmpathyMap,
            NodeKind::Persona => Self::Persona,
            NodeKind::Scamper => Self::Scamper,
            NodeKind::Storyboard => Self::Storyboard,
            NodeKind::Rubric => Self::Rubric,
            NodeKind::CurriculumSource
            | NodeKind::ResourceConfig
            | NodeKind::DrivingQuestion
            | NodeKind::ContextIntro
            | NodeKind::GoalAnalysis
            | NodeKind::DesignProcess
            | NodeKind::SupportActivity
            | NodeKind::MaterialCard
            | NodeKind::Generic => Self::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "kebab-case")]
pub enum Widget {
    TextInput,
    TextArea { rows: u8 },
    Slider { value: i64, min: i32, max: i32, band: IntensityBand },
    Select { options: Vec<String> },
    Toggle { on: bool },
    Tags { tags: Vec<String> },
    RadarDim { weight: u8 },
    /// `ordinal` is the 1-based scene number shown in the shot header.
    StoryShot { ordinal: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub id: String,
    pub label: String,
    pub value: String,
    pub placeholder: String,
    #[serde(flatten)]
    pub widget: Widget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerateAction {
    Generate,
    Regenerate,
    /// A request is in flight; the action is disabled.
    Busy,
}

impl GenerateAction {
    pub fn label(self) -> &'static str {
        match self {
            GenerateAction::Generate => "AI assist",
            GenerateAction::Regenerate => "Regenerate",
            GenerateAction::Busy => "Thinking...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortTooltip {
    pub side: PortSide,
    pub index: usize,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub node: NodeId,
    pub title: String,
    pub layout: EditorLayout,
    pub ports: Vec<PortTooltip>,
    pub fields: Vec<FieldView>,
    pub generate: Option<GenerateAction>,
    pub results: usize,
    pub active_result: Option<usize>,
}

fn tags_of(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn widget_for(field: &Field, layout: EditorLayout, ordinal: usize) -> Widget {
    match &field.kind {
        FieldKind::Text => Widget::TextInput,
        FieldKind::Textarea if layout == EditorLayout::Scamper => Widget::TextArea { rows: 1 },
        FieldKind::Textarea => Widget::TextArea { rows: 3 },
        FieldKind::Slider { range } => {
            let value = field.slider_value().unwrap_or(i64::from(range.0));
            Widget::Slider {
                value,
                min: range.0,
                max: range.1,
                band: IntensityBand::from_value(value),
            }
        }
        FieldKind::Select { options } => Widget::Select {
            options: options.clone(),
        },
        FieldKind::Toggle => Widget::Toggle {
            on: field.value == "true",
        },
        FieldKind::Tags => Widget::Tags {
            tags: tags_of(&field.value),
        },
        FieldKind::RadarDim { weight } => Widget::RadarDim { weight: *weight },
        FieldKind::StoryShot => Widget::StoryShot { ordinal },
    }
}

impl CardView {
    /// Describe `node` for drawing. `busy` marks a generation in flight.
    pub fn build(node: &Node, busy: bool) -> Self {
        let layout = EditorLayout::for_kind(node.kind);
        let ports = node.ports();
        let tooltips = [PortSide::In, PortSide::Out]
            .into_iter()
            .flat_map(|side| {
                ports
                    .side(side)
                    .iter()
                    .enumerate()
                    .map(move |(index, label)| PortTooltip {
                        side,
                        index,
                        label: *label,
                    })
            })
            .collect();

        let mut ordered: Vec<&Field> = node.fields.iter().map(|f| f.as_ref()).collect();
        match layout {
            EditorLayout::Storyboard => ordered.retain(|f| f.kind == FieldKind::StoryShot),
            EditorLayout::Rubric => {
                // Dimensions first, full text last, anything else in between.
                ordered.sort_by_key(|f| match (&f.kind, f.id == RUBRIC_TEXT_FIELD) {
                    (FieldKind::RadarDim { .. }, _) => 0,
                    (_, false) => 1,
                    (_, true) => 2,
                });
            }
            EditorLayout::Persona => ordered.sort_by_key(|f| f.label != "Name"),
            EditorLayout::Standard | EditorLayout::EmpathyMap | EditorLayout::Scamper => {}
        }

        let mut shots = 0;
        let fields = ordered
            .into_iter()
            .map(|f| {
                if f.kind == FieldKind::StoryShot {
                    shots += 1;
                }
                FieldView {
                    id: f.id.clone(),
                    label: f.label.clone(),
                    value: f.value.clone(),
                    placeholder: f.placeholder.clone().unwrap_or_else(|| f.label.clone()),
                    widget: widget_for(f, layout, shots),
                }
            })
            .collect();

        let generate = node.is_generative().then(|| {
            if busy {
                GenerateAction::Busy
            } else if node.results.is_empty() {
                GenerateAction::Generate
            } else {
                GenerateAction::Regenerate
            }
        });

        Self {
            node: node.id,
            title: node.title.clone(),
            layout,
            ports: tooltips,
            fields,
            generate,
            results: node.results.len(),
            active_result: node.active_result,
        }
    }
}

// ─── Edits ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("card {0} does not exist")]
    UnknownNode(NodeId),

    #[error("card has no field `{0}`")]
    UnknownField(String),

    #[error("field `{0}` is not a rubric dimension")]
    NotADimension(String),

    #[error("result {index} out of range ({len} results)")]
    ResultOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Rejected(#[from] GraphError),
}

/// A user edit on one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", rename_all = "kebab-case")]
pub enum CardEdit {
    SetTitle { title: String },
    SetValue { field: String, value: String },
    SetWeight { field: String, weight: i64 },
    /// New weighted dimension, inserted before the rubric's full text.
    AddDimension,
    AddStoryShot,
    /// Drop a dimension, a shot, or any other field.
    RemoveField { field: String },
    /// Show an earlier result: its text goes into the primary text field
    /// and it becomes the active result. History is never shortened.
    LoadVersion { index: usize },
    PinResult { index: usize },
}

/// Smallest `{prefix}{n}` not already used as a field id.
fn next_field_id(node: &Node, prefix: &str) -> String {
    (1..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| node.field(candidate).is_none())
        .unwrap_or_else(|| prefix.to_string())
}

fn write_primary(node: &Node, text: &str) -> Option<Vec<Arc<Field>>> {
    let idx = node.primary_text_field()?;
    let mut fields = node.fields.clone();
    fields[idx] = Arc::new(node.fields[idx].with_value(text));
    Some(fields)
}

impl CardEdit {
    /// Translate the edit into a patch for `node`.
    pub fn to_update(&self, node: &Node) -> Result<NodeUpdate, EditError> {
        let unknown = |id: &str| EditError::UnknownField(id.to_string());
        let update = match self {
            CardEdit::SetTitle { title } => NodeUpdate {
                title: Some(title.clone()),
                ..Default::default()
            },
            CardEdit::SetValue { field, value } => {
                let fields = node
                    .fields_with(field, |f| f.with_value(value.as_str()))
                    .ok_or_else(|| unknown(field))?;
                NodeUpdate::fields(fields)
            }
            CardEdit::SetWeight { field, weight } => {
                let current = node.field(field).ok_or_else(|| unknown(field))?;
                if current.weight().is_none() {
                    return Err(EditError::NotADimension(field.clone()));
                }
                let fields = node
                    .fields_with(field, |f| f.with_weight(*weight))
                    .ok_or_else(|| unknown(field))?;
                NodeUpdate::fields(fields)
            }
            CardEdit::AddDimension => {
                let dim = Arc::new(new_rubric_dimension(next_field_id(node, "d")));
                let mut fields = node.fields.clone();
                let at = fields
                    .iter()
                    .position(|f| f.id == RUBRIC_TEXT_FIELD)
                    .unwrap_or(fields.len());
                fields.insert(at, dim);
                NodeUpdate::fields(fields)
            }
            CardEdit::AddStoryShot => {
                let shot = new_story_shot(next_field_id(node, "st"), node.fields.len() + 1);
                let mut fields = node.fields.clone();
                fields.push(Arc::new(shot));
                NodeUpdate::fields(fields)
            }
            CardEdit::RemoveField { field } => {
                if node.field(field).is_none() {
                    return Err(unknown(field));
                }
                let fields = node.fields.iter().filter(|f| f.id != *field).cloned().collect();
                NodeUpdate::fields(fields)
            }
            CardEdit::LoadVersion { index } => {
                let text = node.results.get(*index).ok_or(EditError::ResultOutOfRange {
                    index: *index,
                    len: node.results.len(),
                })?;
                NodeUpdate {
                    fields: write_primary(node, text),
                    active_result: Some(Some(*index)),
                    ..Default::default()
                }
            }
            CardEdit::PinResult { index } => {
                if *index >= node.results.len() {
                    return Err(EditError::ResultOutOfRange {
                        index: *index,
                        len: node.results.len(),
                    });
                }
                NodeUpdate {
                    pinned_result: Some(*index),
                    ..Default::default()
                }
            }
        };
        Ok(update)
    }
}

/// Patch that records freshly generated `text` on `node`: appended to the
/// history, made active, mirrored into the legacy result slot and written
/// into the primary text field.
pub fn generation_update(node: &Node, text: &str) -> NodeUpdate {
    let mut results = node.results.clone();
    results.push(text.to_string());
    let active = results.len() - 1;
    NodeUpdate {
        fields: write_primary(node, text),
        result: Some(text.to_string()),
        results: Some(results),
        active_result: Some(Some(active)),
        ..Default::default()
    }
}
