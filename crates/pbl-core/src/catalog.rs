//! Resource catalog: the card templates a teacher can drop on the canvas.
//!
//! Templates own their default fields. Instantiating a card deep-copies
//! them, so later edits on the canvas never reach back into the catalog.

use crate::error::GraphError;
use crate::field::{Field, FieldKind};
use crate::id::NodeId;
use crate::node::{Category, InteractionType, Node, NodeKind, Stage, check_unique_fields};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A card blueprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub kind: NodeKind,
    pub category: Category,
    pub interaction: InteractionType,
    pub title: String,
    pub fields: Vec<Field>,
    pub has_inputs: bool,
    pub has_outputs: bool,
    pub stages: Option<Vec<Stage>>,
}

impl Template {
    fn new(
        kind: NodeKind,
        category: Category,
        interaction: InteractionType,
        title: &str,
        fields: Vec<Field>,
    ) -> Self {
        let ports = crate::ports::resolve_ports(kind, false, false);
        Self {
            kind,
            category,
            interaction,
            title: title.to_string(),
            fields,
            has_inputs: !ports.inputs.is_empty(),
            has_outputs: !ports.outputs.is_empty(),
            stages: None,
        }
    }

    fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Build a fresh card at `(x, y)`. Fields and stages are copied, the
    /// result history starts empty.
    pub fn instantiate(&self, id: NodeId, x: f32, y: f32) -> Node {
        Node {
            id,
            x,
            y,
            category: self.category,
            kind: self.kind,
            interaction: self.interaction,
            title: self.title.clone(),
            fields: self.fields.iter().cloned().map(Arc::new).collect(),
            result: String::new(),
            results: Vec::new(),
            active_result: None,
            pinned_result: 0,
            has_inputs: self.has_inputs,
            has_outputs: self.has_outputs,
            stages: self.stages.clone(),
        }
    }
}

/// A titled group of templates sharing a category.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSection {
    pub category: Category,
    pub title: String,
    pub items: Vec<Template>,
}

/// The full template catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub sections: Vec<CatalogSection>,
}

impl Catalog {
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn find(&self, kind: NodeKind) -> Option<&Template> {
        self.templates().find(|t| t.kind == kind)
    }

    /// The built-in course-design catalog.
    pub fn builtin() -> Self {
        use Category as C;
        use InteractionType as I;
        use NodeKind as K;

        let grades = [
            "Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "Grade 6", "Grade 7", "Grade 8",
            "Grade 9",
        ];
        let subjects = [
            "Science",
            "Math",
            "Language arts",
            "English",
            "Art",
            "Engineering",
            "Integrated practice",
        ];

        let driving_question = CatalogSection {
            category: C::DrivingQuestion,
            title: "Driving question".into(),
            items: vec![
                Template::new(
                    K::CurriculumSource,
                    C::DrivingQuestion,
                    I::Generative,
                    "Curriculum card",
                    vec![
                        Field::select("f1", "Grade", "Select a grade", &grades),
                        Field::select("f2", "Subject", "Select a subject", &subjects),
                        Field::textarea(
                            "f3",
                            "Core standards",
                            "Enter the key curriculum standards, or let the assistant suggest them...",
                        ),
                    ],
                ),
                Template::new(
                    K::ResourceConfig,
                    C::DrivingQuestion,
                    I::Parameter,
                    "Resource setup",
                    vec![
                        Field::select(
                            "f1",
                            "Lesson budget",
                            "8 lessons",
                            &["2 lessons", "4 lessons", "8 lessons", "12 lessons", "16 lessons"],
                        ),
                        Field::textarea(
                            "f2",
                            "Materials",
                            "List the tools and consumables the project needs...",
                        ),
                        Field::select(
                            "f3",
                            "Venue",
                            "Classroom",
                            &["Classroom", "Maker space", "Science lab", "Outdoor lawn", "Auditorium"],
                        ),
                    ],
                ),
                Template::new(
                    K::DrivingQuestion,
                    C::DrivingQuestion,
                    I::Generative,
                    "Driving question generator",
                    vec![
                        Field::text("f1", "Role", "Who acts, e.g. architect, volunteer..."),
                        Field::text("f2", "Action", "What they do, e.g. design, improve, research..."),
                        Field::text("f3", "Object", "What it targets, e.g. the neighbourhood, school waste..."),
                        Field::text("f4", "Purpose", "The long-term aim, e.g. better quality of life..."),
                        Field::textarea(
                            "f5",
                            "Driving question (HMW)",
                            "Generate a challenging driving question...",
                        ),
                    ],
                ),
                Template::new(
                    K::ContextIntro,
                    C::DrivingQuestion,
                    I::Generative,
                    "Context intro",
                    vec![
                        Field::select(
                            "f1",
                            "Style",
                            "Mission",
                            &["Mission", "News report", "Role play", "Science fiction"],
                        ),
                        Field::textarea(
                            "f2",
                            "Scenario",
                            "Generate an opening story in the chosen style...",
                        ),
                    ],
                ),
            ],
        };

        let edp_stages = ["Define", "Empathize", "Ideate", "Prototype", "Test"]
            .iter()
            .enumerate()
            .map(|(i, name)| Stage::new(&format!("s{}", i + 1), name))
            .collect();

        let tasks = CatalogSection {
            category: C::Task,
            title: "Project tasks".into(),
            items: vec![
                Template::new(
                    K::DesignProcess,
                    C::Task,
                    I::Generative,
                    "Design process",
                    vec![
                        Field::textarea("f1", "Define", "How students understand and frame the problem..."),
                        Field::textarea("f2", "Empathize", "How students learn about user needs..."),
                        Field::textarea("f3", "Ideate", "How students diverge and produce ideas..."),
                        Field::textarea("f4", "Prototype", "How students build a first model..."),
                        Field::textarea("f5", "Test", "How students evaluate and iterate on the prototype..."),
                    ],
                )
                .with_stages(edp_stages),
                Template::new(
                    K::SupportActivity,
                    C::Task,
                    I::Generative,
                    "Supporting activity",
                    vec![
                        Field::slider("f1", "Scaffold intensity", 50),
                        Field::textarea(
                            "f2",
                            "Activity",
                            "Describe a small activity that scaffolds learning, e.g. a micro-lesson, peer review...",
                        ),
                    ],
                ),
            ],
        };

        let scaffolds = CatalogSection {
            category: C::Scaffold,
            title: "Scaffolds".into(),
            items: vec![
                Template::new(
                    K::Scamper,
                    C::Scaffold,
                    I::Parameter,
                    "SCAMPER",
                    vec![
                        Field::textarea("s1", "S", "Substitute: could another material be used?"),
                        Field::textarea("s2", "C", "Combine: could it merge with another function?"),
                        Field::textarea("s3", "A", "Adapt: could the shape or structure change?"),
                        Field::textarea("s4", "M", "Modify: could a part be enlarged or shrunk?"),
                        Field::textarea("s5", "P", "Put to other uses: could it serve another purpose?"),
                        Field::textarea("s6", "E", "Eliminate: what can be removed?"),
                        Field::textarea("s7", "R", "Reverse: could it be flipped or reordered?"),
                    ],
                ),
                Template::new(
                    K::Persona,
                    C::Scaffold,
                    I::Parameter,
                    "User persona",
                    vec![
                        Field::text("p1", "Name", "A fictional user's name"),
                        Field::text("p2", "Age", "The user's age"),
                        Field::textarea("p3", "Background", "Occupation and living situation..."),
                        Field::textarea("p4", "Behaviour", "Everyday habits and preferences..."),
                        Field::textarea("p5", "Goals", "What the user wants to achieve..."),
                        Field::textarea("p6", "Pain points", "The user's core difficulties..."),
                        Field::textarea("p7", "Journey", "The steps the user takes to finish a task..."),
                    ],
                ),
                Template::new(
                    K::EmpathyMap,
                    C::Scaffold,
                    I::Parameter,
                    "Empathy map",
                    vec![
                        Field::textarea("e1", "Thinks & feels", "Inner worries or hopes..."),
                        Field::textarea("e2", "Hears", "What others tell the user..."),
                        Field::textarea("e3", "Sees", "Facts observed in the environment..."),
                        Field::textarea("e4", "Says & does", "Public statements and actions..."),
                        Field::textarea("e5", "Pains", "What frustrates the user..."),
                        Field::textarea("e6", "Gains", "What the user gets from a solution..."),
                    ],
                ),
                Template::new(
                    K::Storyboard,
                    C::Scaffold,
                    I::Parameter,
                    "Storyboard",
                    vec![Field::story_shot("st1", "Scene 1", "Describe what happens in the first shot...")],
                ),
                Template::new(
                    K::MaterialCard,
                    C::Scaffold,
                    I::Parameter,
                    "Material card",
                    vec![
                        Field::text("m1", "Material", "Name of the material or tool"),
                        Field::textarea("m2", "Spec / use", "How to use it and its parameters..."),
                    ],
                ),
            ],
        };

        let assessment = CatalogSection {
            category: C::Assessment,
            title: "Assessment".into(),
            items: vec![Template::new(
                K::Rubric,
                C::Assessment,
                I::Generative,
                "Rubric",
                vec![
                    Field::radar_dim("d1", "Dimension", "Dimension 1", 40),
                    Field::radar_dim("d2", "Dimension", "Dimension 2", 30),
                    Field::textarea(
                        RUBRIC_TEXT_FIELD,
                        "Full rubric",
                        "Generate detailed criteria from the dimensions above...",
                    ),
                ],
            )],
        };

        Self {
            sections: vec![driving_question, tasks, scaffolds, assessment],
        }
    }
}

/// Id of the rubric's generated full-text field. New dimensions are
/// inserted before it.
pub const RUBRIC_TEXT_FIELD: &str = "r1";

/// A card suggested by the assistant. Every attribute is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProposal {
    pub category: Option<Category>,
    pub interaction_type: Option<InteractionType>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NodeKind>,
    #[serde(default)]
    pub fields: Vec<Field>,
    pub result: Option<String>,
    /// Port flags for generic suggestions. Absent means no ports.
    #[serde(default)]
    pub has_inputs: bool,
    #[serde(default)]
    pub has_outputs: bool,
}

impl NodeProposal {
    /// Build the suggested card at `(x, y)`. Fails if the suggested fields
    /// repeat an id.
    pub fn instantiate(&self, id: NodeId, x: f32, y: f32) -> Result<Node, GraphError> {
        check_unique_fields(&self.fields)?;
        let kind = self.kind.unwrap_or(NodeKind::Generic);
        let title = self.title.as_deref().unwrap_or("Suggested node");
        let mut node = Node::new(id, kind, title);
        node.x = x;
        node.y = y;
        node.category = self.category.unwrap_or(Category::Scaffold);
        node.interaction = self.interaction_type.unwrap_or(InteractionType::Generative);
        node.fields = self.fields.iter().cloned().map(Arc::new).collect();
        node.result = self.result.clone().unwrap_or_default();
        node.has_inputs = self.has_inputs;
        node.has_outputs = self.has_outputs;
        Ok(node)
    }
}

/// Default shape of a freshly added rubric dimension.
pub fn new_rubric_dimension(id: String) -> Field {
    Field::new(id, "Dimension", "New dimension", FieldKind::RadarDim { weight: 20 })
}

/// Default shape of a freshly added storyboard shot.
pub fn new_story_shot(id: String, ordinal: usize) -> Field {
    Field::new(id, format!("Scene {ordinal}"), "", FieldKind::StoryShot)
}
