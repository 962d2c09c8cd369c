//! Port resolution: which named inputs and outputs a card exposes.
//!
//! This table is the backbone of the course-design pipeline. It decides
//! which stage outputs may feed which stage inputs, and it is the only
//! copy: link validation, hit testing, card tooltips and connector
//! rendering all read it through [`resolve_ports`].

use crate::node::NodeKind;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

pub const DRIVING_QUESTION: &str = "driving question";
pub const CONTEXT_INTRO: &str = "context intro";
pub const GOAL_ANALYSIS: &str = "goal analysis";
pub const DESIGN_PROCESS: &str = "design process";
pub const SUPPORTING_ACTIVITY: &str = "supporting activity";
pub const SCAFFOLD: &str = "scaffold";
pub const ASSESSMENT: &str = "assessment";

/// Wildcard input label for cards outside the curated table.
pub const GENERIC_INPUT: &str = "input";
/// Wildcard output label for cards outside the curated table.
pub const GENERIC_OUTPUT: &str = "output";

/// Which side of a card a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    In,
    Out,
}

impl PortSide {
    pub fn opposite(self) -> Self {
        match self {
            PortSide::In => PortSide::Out,
            PortSide::Out => PortSide::In,
        }
    }
}

impl fmt::Display for PortSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSide::In => f.write_str("input"),
            PortSide::Out => f.write_str("output"),
        }
    }
}

/// Ordered port labels of one card.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ports {
    pub inputs: SmallVec<[&'static str; 3]>,
    pub outputs: SmallVec<[&'static str; 3]>,
}

impl Ports {
    fn new(inputs: &[&'static str], outputs: &[&'static str]) -> Self {
        Self {
            inputs: inputs.iter().copied().collect(),
            outputs: outputs.iter().copied().collect(),
        }
    }

    pub fn side(&self, side: PortSide) -> &[&'static str] {
        match side {
            PortSide::In => &self.inputs,
            PortSide::Out => &self.outputs,
        }
    }

    pub fn label(&self, side: PortSide, index: usize) -> Option<&'static str> {
        self.side(side).get(index).copied()
    }

    /// Number of port rows the card needs (the taller column).
    pub fn rows(&self) -> usize {
        self.inputs.len().max(self.outputs.len())
    }
}

/// Resolve a card's ports from its kind. `has_inputs` / `has_outputs`
/// only matter for kinds outside the curated table.
pub fn resolve_ports(kind: NodeKind, has_inputs: bool, has_outputs: bool) -> Ports {
    use NodeKind::*;
    match kind {
        CurriculumSource | ResourceConfig => Ports::new(&[], &[DRIVING_QUESTION]),
        DrivingQuestion => Ports::new(
            &[DRIVING_QUESTION],
            &[CONTEXT_INTRO, GOAL_ANALYSIS, DESIGN_PROCESS],
        ),
        ContextIntro => Ports::new(&[DRIVING_QUESTION], &[]),
        GoalAnalysis => Ports::new(&[GOAL_ANALYSIS], &[]),
        DesignProcess => Ports::new(&[DESIGN_PROCESS], &[SUPPORTING_ACTIVITY, SCAFFOLD]),
        SupportActivity => Ports::new(&[SUPPORTING_ACTIVITY], &[]),
        Scamper | Persona | EmpathyMap | Storyboard | MaterialCard => {
            Ports::new(&[SUPPORTING_ACTIVITY], &[ASSESSMENT])
        }
        Rubric => Ports::new(&[ASSESSMENT], &[]),
        Generic => {
            let inputs: &[&'static str] = if has_inputs { &[GENERIC_INPUT] } else { &[] };
            let outputs: &[&'static str] = if has_outputs { &[GENERIC_OUTPUT] } else { &[] };
            Ports::new(inputs, outputs)
        }
    }
}

/// An output may feed an input when the labels match, or when either end
/// carries the generic wildcard label.
pub fn labels_compatible(out_label: &str, in_label: &str) -> bool {
    out_label == in_label || out_label == GENERIC_OUTPUT || in_label == GENERIC_INPUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sources_have_single_output() {
        let p = resolve_ports(NodeKind::CurriculumSource, true, true);
        assert!(p.inputs.is_empty());
        assert_eq!(p.outputs.as_slice(), &[DRIVING_QUESTION]);
    }

    #[test]
    fn driving_question_fans_out() {
        let p = resolve_ports(NodeKind::DrivingQuestion, false, false);
        assert_eq!(p.inputs.as_slice(), &[DRIVING_QUESTION]);
        assert_eq!(
            p.outputs.as_slice(),
            &[CONTEXT_INTRO, GOAL_ANALYSIS, DESIGN_PROCESS]
        );
        assert_eq!(p.rows(), 3);
        assert_eq!(p.label(PortSide::Out, 1), Some(GOAL_ANALYSIS));
        assert_eq!(p.label(PortSide::Out, 3), None);
    }

    #[test]
    fn generic_ports_follow_flags() {
        let both = resolve_ports(NodeKind::Generic, true, true);
        assert_eq!(both.inputs.as_slice(), &[GENERIC_INPUT]);
        assert_eq!(both.outputs.as_slice(), &[GENERIC_OUTPUT]);

        let none = resolve_ports(NodeKind::Generic, false, false);
        assert_eq!(none, Ports::default());
    }

    #[test]
    fn curated_kinds_ignore_flags() {
        assert_eq!(
            resolve_ports(NodeKind::Rubric, false, true),
            resolve_ports(NodeKind::Rubric, true, false)
        );
    }

    #[test]
    fn wildcards_match_anything() {
        assert!(labels_compatible(ASSESSMENT, ASSESSMENT));
        assert!(!labels_compatible(GOAL_ANALYSIS, DRIVING_QUESTION));
        assert!(labels_compatible(GENERIC_OUTPUT, DRIVING_QUESTION));
        assert!(labels_compatible(SCAFFOLD, GENERIC_INPUT));
    }
}
